//! Startup host for backglass.
//!
//! Loads the machine config, builds the collections and effect registry, runs
//! the deferred sound-reference check and reports what was loaded.

mod machine;

pub use machine::*;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Installs the global tracing subscriber.
///
/// `level` is the default directive; `RUST_LOG` directives are applied on top.
pub fn init_logging(level: tracing::Level) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        );

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
