use std::env;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the fmt subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "course_authoring=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
