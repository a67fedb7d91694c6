// Installing the global subscriber is process-wide, so this lives in its own
// test binary.

use scoreloop_logging::{LogFormat, ProcessContext};

#[test]
fn test_init_installs_tracing_once() {
    let first = ProcessContext::init("debug", LogFormat::Json);
    assert!(first.tracing_installed());
    assert_eq!(first.log_format(), LogFormat::Json);

    let second = ProcessContext::init("info", LogFormat::Pretty);
    assert!(!second.tracing_installed());
    assert_eq!(second.log_format(), LogFormat::Pretty);

    // Each context keeps its own warning set
    assert!(first.warn_once("weights", "first context"));
    assert!(second.warn_once("weights", "second context"));
    tracing::info!("subscriber is live");
}
