//! Console logging
//!
//! `tracing` events go to the browser console through `tracing-wasm`,
//! filtered by the configured `EnvFilter` directive.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_wasm::{WASMLayer, WASMLayerConfigBuilder};

/// Install the console subscriber; an invalid directive falls back to info.
/// Later calls leave the first subscriber in place.
pub fn init(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let console = WASMLayer::new(
        WASMLayerConfigBuilder::new()
            .set_report_logs_in_timings(false)
            .build(),
    );

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .try_init();
}
