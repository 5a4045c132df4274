//! Test helpers shared by unit and integration tests

use std::sync::Once;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Install a test subscriber once per process.
///
/// `RUST_LOG` wins; otherwise the crate logs at trace and dependencies at warn.
/// Output goes through the test writer so it is captured per test.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,tfsget=trace"));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_test_writer()
                .with_target(true)
                .with_filter(env_filter),
        );

        // another harness may own the global subscriber already
        if subscriber.try_init().is_ok() {
            info!("Test Setup complete");
        }
    });
}
