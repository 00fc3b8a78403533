//! Console logging for the WASM build.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the panic hook and a `tracing` subscriber writing to the browser
/// console. Safe to call more than once.
pub fn init_logging() {
    INIT.call_once(|| {
        console_error_panic_hook::set_once();

        use tracing::subscriber::set_global_default;
        use tracing_subscriber::Registry;
        use tracing_subscriber::layer::SubscriberExt;

        let console_level = if cfg!(debug_assertions) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        let wasm_layer = tracing_wasm::WASMLayer::new(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(console_level)
                .build(),
        );

        let reg = Registry::default().with(wasm_layer);

        // Another subscriber may already be installed by the host page.
        let _ = set_global_default(reg);
    });
}
