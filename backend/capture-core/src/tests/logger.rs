use crate::config::SdkConfig;
use crate::logger::{initialize, initialize_from_config};

use log::LevelFilter;
use tempfile::tempdir;

/// **VALUE**: Verifies repeated initialization is harmless.
///
/// **WHY THIS MATTERS**: Host apps may set up the SDK from more than one code path; a
/// second call must not crash the app at startup.
///
/// **BUG THIS CATCHES**: Would catch the Once or AtomicBool guards being removed, which makes
/// fern fail when a second global logger is installed.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A writable log directory
    let dir = tempdir().expect("temp dir");
    let mut config = SdkConfig::default();
    config.logging.directory = Some(dir.path().join("logs"));

    // WHEN: Initializing from config, then directly
    let first = initialize_from_config(&config);
    let second = initialize(dir.path(), LevelFilter::Debug);

    // THEN: Both succeed
    assert!(first.is_ok(), "first initialization should succeed: {first:?}");
    assert!(second.is_ok(), "second initialization should be a no-op");
}
