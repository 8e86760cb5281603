use super::*;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use wiremock::matchers::{ method, path };
use wiremock::{ Mock, MockServer, ResponseTemplate };

fn sample_event( p : &str ) -> the_module::RequestEvent
{
  the_module::RequestEvent
  {
    method : "GET".to_string(),
    path : p.to_string(),
    status_code : 200,
    response_time_ms : 1.0,
    request_size : 0,
    response_size : 0,
    consumer_id : None,
    metadata : None,
    timestamp : "2026-07-28T00:00:00Z".to_string(),
  }
}

fn engine_over( endpoint : String, spool_path : std::path::PathBuf, on_error : Option< the_module::OnError > ) -> the_module::FlushEngine
{
  let config = the_module::ClientConfig::builder( endpoint, "sk-test" )
    .build()
    .expect( "valid configuration" );
  let submitter = the_module::Submitter::new( &config ).expect( "submitter construction" );
  let spool = the_module::Spool::new( spool_path, 5_242_880 );
  the_module::FlushEngine::new( submitter, spool, 100, on_error )
}

// Scenario 1 (§8) : tracking 2 events with batchSize=2 crosses the threshold,
// the actor's automatic flush fires, and the endpoint sees exactly one POST.
#[ tokio::test ]
async fn crossing_batch_size_triggers_exactly_one_post_and_drains_the_buffer()
{
  let mock_server = MockServer::start().await;

  Mock::given( method( "POST" ) )
    .and( path( "/ingest" ) )
    .respond_with( ResponseTemplate::new( 200 ) )
    .expect( 1 )
    .mount( &mock_server )
    .await;

  let endpoint = format!( "{}/ingest", mock_server.uri() );
  let config = the_module::ClientConfig::builder( endpoint, "sk-test" )
    .batch_size( 2 )
    .build()
    .expect( "valid configuration" );

  let client = the_module::Client::create( config ).expect( "client creation" );

  client.track( sample_event( "/a" ) );
  client.track( sample_event( "/b" ) );

  client.flush().await;
  client.shutdown().await;

  // `mock_server` dropping here checks the mounted `.expect(1)` and panics
  // if the endpoint was called any number of times other than once.
  drop( mock_server );
}

// Scenario 2 (§8) : a retryable 500 arms a backoff window; a second flush
// attempt while still inside that window is a no-op (no second request);
// once virtual time advances past the window, the next attempt retries.
#[ tokio::test( start_paused = true ) ]
async fn retryable_failure_arms_backoff_and_skips_until_elapsed()
{
  let mock_server = MockServer::start().await;

  Mock::given( method( "POST" ) )
    .and( path( "/ingest" ) )
    .respond_with( ResponseTemplate::new( 500 ) )
    .mount( &mock_server )
    .await;

  let dir = tempfile::tempdir().expect( "tempdir" );
  let endpoint = format!( "{}/ingest", mock_server.uri() );
  let mut engine = engine_over( endpoint, dir.path().join( "spool.jsonl" ), None );
  let mut buffer = the_module::EventBuffer::new( 10 );

  buffer.append( sample_event( "/x" ), 100 );

  let first = engine.attempt( &mut buffer ).await;
  match first
  {
    the_module::FlushResult::Retrying { count, delay } =>
    {
      assert_eq!( count, 1 );
      assert!( delay > Duration::from_millis( 0 ) );
    },
    other => panic!( "expected Retrying on first failure, got {other:?}" ),
  }
  assert_eq!( buffer.len(), 1, "the failed event is returned to the buffer front" );

  // Still inside the backoff window : this must not issue a second request.
  let second = engine.attempt( &mut buffer ).await;
  assert!( matches!( second, the_module::FlushResult::BackingOff ) );

  // Jump the virtual clock well past the (sub-second, jittered) backoff window.
  tokio::time::advance( Duration::from_secs( 5 ) ).await;

  let third = engine.attempt( &mut buffer ).await;
  assert!( matches!( third, the_module::FlushResult::Retrying { .. } ), "backoff has elapsed, the engine retries" );
}

// Scenario 3 (§8) : five consecutive retryable failures spill the batch to
// disk as one JSONL line and reset the failure counter.
#[ tokio::test( start_paused = true ) ]
async fn fifth_consecutive_failure_spills_and_resets_counter()
{
  let mock_server = MockServer::start().await;

  Mock::given( method( "POST" ) )
    .and( path( "/ingest" ) )
    .respond_with( ResponseTemplate::new( 500 ) )
    .mount( &mock_server )
    .await;

  let dir = tempfile::tempdir().expect( "tempdir" );
  let spool_path = dir.path().join( "spool.jsonl" );
  let endpoint = format!( "{}/ingest", mock_server.uri() );
  let mut engine = engine_over( endpoint, spool_path.clone(), None );
  let mut buffer = the_module::EventBuffer::new( 10 );

  buffer.append( sample_event( "/x" ), 100 );

  for attempt_number in 1..=4
  {
    let result = engine.attempt( &mut buffer ).await;
    assert!( matches!( result, the_module::FlushResult::Retrying { .. } ), "attempt {attempt_number} should retry, got {result:?}" );
    // The cap on backoff is 60s; jumping the virtual clock well past it
    // guarantees the next attempt is never skipped as BackingOff.
    tokio::time::advance( Duration::from_secs( 120 ) ).await;
  }

  let fifth = engine.attempt( &mut buffer ).await;
  match fifth
  {
    the_module::FlushResult::Spilled { count, .. } => assert_eq!( count, 1 ),
    other => panic!( "expected Spilled on the 5th consecutive failure, got {other:?}" ),
  }
  assert!( buffer.is_empty() );

  let contents = std::fs::read_to_string( &spool_path ).expect( "spool file was written" );
  let lines : Vec< &str > = contents.lines().collect();
  assert_eq!( lines.len(), 1, "one batch-per-line" );

  let batch : Vec< the_module::RequestEvent > = serde_json::from_str( lines[ 0 ] ).expect( "valid JSON batch" );
  assert_eq!( batch.len(), 1 );

  // consecutiveFailures was reset to 0 : a fresh failure starts the backoff
  // ladder over again (n=1) rather than immediately being in backoff.
  buffer.append( sample_event( "/y" ), 100 );
  let after_reset = engine.attempt( &mut buffer ).await;
  assert!( matches!( after_reset, the_module::FlushResult::Retrying { .. } ), "counter was reset, this is a fresh n=1 failure" );
}

// Scenario 4 (§8) : a non-retryable 400 spills immediately (no backoff, no
// failure-count increment) and the body/status reach `on_error`.
#[ tokio::test ]
async fn non_retryable_status_spills_immediately_and_reports_error()
{
  let mock_server = MockServer::start().await;

  Mock::given( method( "POST" ) )
    .and( path( "/ingest" ) )
    .respond_with( ResponseTemplate::new( 400 ).set_body_json( serde_json::json!( { "error" : "bad" } ) ) )
    .mount( &mock_server )
    .await;

  let dir = tempfile::tempdir().expect( "tempdir" );
  let spool_path = dir.path().join( "spool.jsonl" );
  let endpoint = format!( "{}/ingest", mock_server.uri() );

  let captured : Arc< Mutex< Vec< String > > > = Arc::new( Mutex::new( Vec::new() ) );
  let captured_clone = captured.clone();
  let on_error : the_module::OnError = Arc::new( move | error : &the_module::ClientError |
  {
    captured_clone.lock().expect( "lock" ).push( error.to_string() );
  } );

  let mut engine = engine_over( endpoint, spool_path.clone(), Some( on_error ) );
  let mut buffer = the_module::EventBuffer::new( 10 );
  buffer.append( sample_event( "/x" ), 100 );

  let result = engine.attempt( &mut buffer ).await;
  match result
  {
    the_module::FlushResult::Spilled { count, .. } => assert_eq!( count, 1 ),
    other => panic!( "expected Spilled for a non-retryable status, got {other:?}" ),
  }
  assert!( buffer.is_empty() );

  let messages = captured.lock().expect( "lock" );
  assert!( messages.iter().any( | m | m.contains( "400" ) && m.contains( "bad" ) ), "on_error message carries status and body : {messages:?}" );
  drop( messages );

  let contents = std::fs::read_to_string( &spool_path ).expect( "spool file was written" );
  assert_eq!( contents.lines().count(), 1 );
}
