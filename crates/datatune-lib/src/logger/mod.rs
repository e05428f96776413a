use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber with timestamp, level, and structured fields.
///
/// `RUST_LOG` wins when set. Otherwise `debug` selects DEBUG and the default
/// is INFO. `json` switches the formatter to one JSON object per line. Logs
/// go to stderr so command output on stdout stays parseable.
pub fn init(debug: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let builder = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::SystemTime)
        .with_level(true)
        .with_target(true)
        .with_writer(std::io::stderr);

    // A second init (tests, embedding) must not panic.
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "debug");
        assert_eq!(default_directive(false), "info");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false, false);
        init(true, true);
    }
}
