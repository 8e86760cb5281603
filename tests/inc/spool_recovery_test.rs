use super::*;
use wiremock::matchers::{ method, path };
use wiremock::{ Mock, MockServer, ResponseTemplate };

fn recovered_event_line() -> String
{
  let events = serde_json::json!(
  [
    {
      "method" : "GET",
      "path" : "/crashed-before-this-shipped",
      "status_code" : 200,
      "response_time_ms" : 3.0,
      "request_size" : 0,
      "response_size" : 64,
      "timestamp" : "2026-07-27T23:59:00Z"
    }
  ] );
  format!( "{events}\n" )
}

#[ tokio::test ]
async fn pre_written_spool_file_is_recovered_submitted_and_cleaned_up()
{
  let mock_server = MockServer::start().await;

  Mock::given( method( "POST" ) )
    .and( path( "/ingest" ) )
    .respond_with( ResponseTemplate::new( 200 ) )
    .mount( &mock_server )
    .await;

  let dir = tempfile::tempdir().expect( "tempdir" );
  let spool_path = dir.path().join( "spool.jsonl" );
  std::fs::write( &spool_path, recovered_event_line() ).expect( "seed spool file" );

  let endpoint = format!( "{}/ingest", mock_server.uri() );
  let config = the_module::ClientConfig::builder( endpoint, "sk-test" )
    .storage_path( spool_path.clone() )
    .build()
    .expect( "valid configuration" );

  let client = the_module::Client::create( config ).expect( "client creation" );

  client.flush().await;

  let recovering_path = dir.path().join( "spool.jsonl.recovering" );
  assert!( !recovering_path.exists(), "recovery file is cleaned up after the first successful flush" );
  assert!( !spool_path.exists(), "the primary path was renamed away during recovery, not recreated by the successful flush" );

  client.shutdown().await;
}
