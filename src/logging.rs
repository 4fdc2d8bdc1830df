//! Tracing subscriber setup for the command-line front end.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive that overrides `--verbose`.
pub const LOG_ENV: &str = "POWERFEED_LOG";

/// Installs a stderr subscriber. Safe to call once per process.
pub fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "powerfeed=debug"
    } else {
        "powerfeed=info"
    }
}

#[cfg(test)]
mod tests {
    use super::default_directive;

    #[test]
    fn verbose_switches_to_debug() {
        assert_eq!(default_directive(false), "powerfeed=info");
        assert_eq!(default_directive(true), "powerfeed=debug");
    }
}
