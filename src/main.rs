fn main() -> std::process::ExitCode {
    lagswitch_lib::run()
}
