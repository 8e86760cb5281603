//! In-process telemetry client
//!
//! Buffers request-observation events emitted by a web framework adapter,
//! batches them, and ships them to a collector endpoint over HTTPS with
//! retry/backoff, an SSRF-hardened transport, and a disk spool for
//! surviving process crashes without losing data.
//!
//! # Example
//!
//! ```no_run
//! use telemetry_client::{ Client, ClientConfig, RequestEvent };
//!
//! # async fn example() -> Result< (), Box< dyn std::error::Error > > {
//! let config = ClientConfig::builder( "https://telemetry.example.com/ingest", "secret-key" )
//!   .batch_size( 50 )
//!   .build()?;
//! let client = Client::create( config )?;
//!
//! client.track( RequestEvent
//! {
//!   method : "GET".to_string(),
//!   path : "/users/42".to_string(),
//!   status_code : 200,
//!   response_time_ms : 12.5,
//!   request_size : 0,
//!   response_size : 512,
//!   consumer_id : None,
//!   metadata : None,
//!   timestamp : "2026-07-28T00:00:00Z".to_string(),
//! } );
//!
//! client.shutdown().await;
//! # Ok( () )
//! # }
//! ```

use mod_interface::mod_interface;

mod private {}

crate::mod_interface!
{
  layer error;
  layer secret;
  layer private_net;
  layer config;
  layer event;
  layer buffer;
  layer spool;
  layer resolver;
  layer transport;
  layer flush;
  layer lifecycle;
  layer client;
}
