//! Tracing subscriber installation.
//!
//! The crate only emits `tracing` events. Applications that don't install their own
//! subscriber can call [`install`] (stderr) or [`install_with_writer`] (any
//! [`MakeWriter`], e.g. the browser console) once at startup.

use std::sync::Once;

use tracing_subscriber::{
    EnvFilter, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

static TRACING_INSTALLED: Once = Once::new();

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a formatted stderr subscriber filtered by `RUST_LOG`. Idempotent.
pub fn install() {
    TRACING_INSTALLED.call_once(|| {
        let result = tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
        if result.is_err() {
            eprintln!("jsx-dom tracing subscriber failed to initialize");
        }
    });
}

/// Installs a subscriber writing plain lines, without colors or timestamps, to
/// `writer`. Idempotent, and exclusive with [`install`].
pub fn install_with_writer<W>(writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    TRACING_INSTALLED.call_once(|| {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .without_time();
        if tracing_subscriber::registry()
            .with(filter())
            .with(layer)
            .try_init()
            .is_err()
        {
            eprintln!("jsx-dom tracing subscriber failed to initialize");
        }
    });
}
