//! Logging initialization for the CLI.
//!
//! Only the binary installs a subscriber; `focus-core` just emits `tracing`
//! events. Everything goes to stderr so `--json` stdout stays parseable.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level for the `focus*` targets at a given `-v` count.
fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` sets the base filter (default `warn`); the `-v` level is then
/// applied to the `focus_core` and `focus_cli` targets.
///
/// With `json`, each event is one JSON line carrying the `focus` command span:
/// ```json
/// {"timestamp":"...","level":"INFO","fields":{"message":"Focused install planned","siblings":2,"top_level":1,"stage":"linked"},"target":"focus_cli::commands::focus","span":{"cmd":"focus","cwd":"/repo/packages/b","name":"focus"}}
/// ```
///
/// # Panics
/// Panics if a subscriber is already installed.
pub fn init(verbosity: u8, json: bool) {
    let level = level_for(verbosity);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(format!("focus_core={level}").parse().unwrap())
        .add_directive(format!("focus_cli={level}").parse().unwrap());

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), Level::INFO);
        assert_eq!(level_for(1), Level::DEBUG);
        assert_eq!(level_for(2), Level::TRACE);
        assert_eq!(level_for(9), Level::TRACE);
    }
}
