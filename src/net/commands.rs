//! Platform release/renew command lines.
//!
//! - Windows: `ipconfig /release` / `ipconfig /renew`
//! - macOS: `ipconfig set <iface> NONE` / `ipconfig set <iface> DHCP`
//! - Other Unix: `dhclient -r` / `dhclient`

use std::fmt;

/// Interface `ipconfig set` targets on macOS when none is configured.
const MACOS_DEFAULT_INTERFACE: &str = "en0";

/// A program plus its arguments, run without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn with_arg(mut self, arg: Option<&str>) -> Self {
        if let Some(arg) = arg {
            self.args.push(arg.to_string());
        }
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// The pair of commands that take the link down and bring it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseCommands {
    pub release: CommandSpec,
    pub renew: CommandSpec,
}

impl LeaseCommands {
    /// Commands for the platform this binary was built for.
    pub fn platform_default(interface: Option<&str>) -> Self {
        if cfg!(target_os = "windows") {
            Self::windows(interface)
        } else if cfg!(target_os = "macos") {
            Self::macos(interface)
        } else {
            Self::dhclient(interface)
        }
    }

    fn windows(interface: Option<&str>) -> Self {
        Self {
            release: CommandSpec::new("ipconfig", &["/release"]).with_arg(interface),
            renew: CommandSpec::new("ipconfig", &["/renew"]).with_arg(interface),
        }
    }

    fn macos(interface: Option<&str>) -> Self {
        let iface = interface.unwrap_or(MACOS_DEFAULT_INTERFACE);
        Self {
            release: CommandSpec::new("ipconfig", &["set", iface, "NONE"]),
            renew: CommandSpec::new("ipconfig", &["set", iface, "DHCP"]),
        }
    }

    fn dhclient(interface: Option<&str>) -> Self {
        Self {
            release: CommandSpec::new("dhclient", &["-r"]).with_arg(interface),
            renew: CommandSpec::new("dhclient", &[]).with_arg(interface),
        }
    }
}
