pub mod build_info;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVES: [&str; 3] = ["mediaid_intake=info", "mediaid_core=warn", "mediaid_config=warn"];

/// Initializes the global tracing subscriber. Logs go to stderr so they never
/// interleave with wizard prompts on stdout.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let raw = std::env::var(EnvFilter::DEFAULT_ENV).ok();

        tracing_subscriber::fmt()
            .with_env_filter(env_filter(raw.as_deref()))
            .with_writer(std::io::stderr)
            .init();
    });
}

/// A set `RUST_LOG` replaces the defaults entirely; an unset or unparsable one
/// falls back to them.
fn env_filter(raw: Option<&str>) -> EnvFilter {
    raw.filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES.join(",")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_rust_log() {
        let filter = env_filter(None).to_string();
        for directive in DEFAULT_DIRECTIVES {
            assert!(filter.contains(directive), "{filter} missing {directive}");
        }
    }

    #[test]
    fn rust_log_replaces_defaults() {
        let filter = env_filter(Some("mediaid_core=debug")).to_string();
        assert!(filter.contains("mediaid_core=debug"));
        assert!(!filter.contains("mediaid_core=warn"));
        assert!(!filter.contains("mediaid_intake=info"));
    }

    #[test]
    fn blank_rust_log_keeps_defaults() {
        let filter = env_filter(Some("  ")).to_string();
        assert!(filter.contains("mediaid_intake=info"));
    }
}
