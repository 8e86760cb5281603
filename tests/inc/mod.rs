use super::*;

// --- Test Environment ---

/// Initializes a real `tracing` subscriber for tests that assert
/// logging-instrumented code paths run cleanly, grounded in the teacher's
/// own `tests/inc/mod.rs` test-environment helper.
#[ allow( dead_code ) ]
fn tracing_init_test()
{
  static TRACING_INIT : std::sync::Once = std::sync::Once::new();
  TRACING_INIT.call_once( ||
  {
    // try_init() avoids panic if already initialized
    let _ = tracing_subscriber::fmt()
      .with_test_writer() // crucial for working with test output capture
      .with_max_level( tracing::Level::DEBUG )
      .try_init();
  } );
}
// --- End Test Environment ---

mod private_net_test;
mod secret_test;
mod config_test;
mod buffer_test;
mod flush_scenarios_test;
mod spool_recovery_test;
