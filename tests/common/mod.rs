// Shared test support

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a tracing subscriber for the test binary, honoring RUST_LOG
///
/// Opt-in: run with `RUST_LOG=longbox_canon=debug` to see per-field
/// resolution logging while debugging a test. Safe to call from every
/// test; initialization happens once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
