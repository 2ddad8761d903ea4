use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Directive used for `--verbose`.
pub const VERBOSE_FILTER: &str = "astro_match=debug,info";

fn filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(VERBOSE_FILTER)
        } else {
            EnvFilter::new(&config.filter)
        }
    })
}

/// Installs the global subscriber. Logs go to stderr so stdout stays parseable.
pub fn init_logger(config: &LoggingConfig, verbose: bool) {
    let registry = tracing_subscriber::registry().with(filter(config, verbose));
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.json {
        registry.with(fmt.json()).init();
    } else {
        registry.with(fmt.compact()).init();
    }
}
