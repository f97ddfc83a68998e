pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod net;
pub mod notify;
pub mod services;
pub mod store;

use std::io::Write;
use std::process::ExitCode;

use config::RuntimeConfig;
use crate::core::{DriverTiming, InputDriver, LinkState, Settings, SwitchController};
use error::AppError;
use net::{LeaseCommands, ShellExecutor};
use notify::DesktopNotifier;
use store::{ConfigStore, ConsolePrompt};

/// Process entry point: set up logging, run the switch, map failure to exit code 1.
pub fn run() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC in LagSwitch: {info}");
        default_hook(info);
    }));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lagswitch_lib=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("Loading...");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lagswitch-worker")
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            report_fatal(&AppError::from(e));
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run_switch(RuntimeConfig::from_env())) {
        Ok(()) => ExitCode::SUCCESS,
        // The user already confirmed the setup failure.
        Err(err @ AppError::InvalidInput(_)) => {
            tracing::error!("Setup aborted: {err}");
            ExitCode::from(1)
        }
        Err(err) => {
            report_fatal(&err);
            ExitCode::from(1)
        }
    }
}

async fn run_switch(cfg: RuntimeConfig) -> Result<(), AppError> {
    tracing::debug!("Runtime config: {cfg:?}");
    let mut keys = input::start_listener()?;

    let store = ConfigStore::new(&cfg.config_dir);
    let settings = store::load_or_setup(&store, &mut ConsolePrompt::new(&mut keys)).await?;
    tracing::info!("Initialization complete");

    let executor = ShellExecutor::new(
        LeaseCommands::platform_default(cfg.interface.as_deref()),
        cfg.command_timeout,
    );
    tracing::info!(
        "Release: `{}`, renew: `{}`",
        executor.commands().release,
        executor.commands().renew
    );

    let controller = SwitchController::new(executor);
    services::spawn_event_presenter(controller.subscribe(), DesktopNotifier, settings.mode);
    print_banner(&settings);

    let driver = InputDriver::new(
        controller.clone(),
        settings.hotkey.clone(),
        DriverTiming::default(),
    );
    let outcome = tokio::select! {
        result = driver.run(settings.mode, &mut keys) => result,
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            signal.map_err(AppError::from)
        }
    };

    controller.shutdown().await;
    if controller.snapshot().link != LinkState::Up {
        tracing::warn!("Exiting with link state {:?}", controller.snapshot().link);
    }
    outcome
}

fn print_banner(settings: &Settings) {
    println!("--------------------------------------------------");
    println!("{} is running...", config::APP_TITLE);
    println!("Hotkey: '{}' | Mode: {}", settings.hotkey, settings.mode);
    println!("Switch Disabled - Internet Enabled (Initial State)");
    println!("--------------------------------------------------");
}

/// Print the failure and wait for Enter so a double-clicked console stays open.
fn report_fatal(err: &AppError) {
    tracing::error!("Fatal {} error: {err}", err.kind());
    println!();
    println!("--- FATAL ERROR ---");
    println!("An unexpected error occurred: {err}");
    println!("-------------------");
    print!("Press Enter to close.");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
