//! HTTPS Submitter (component 4.8)
//!
//! Sends one batch as one POST request. Carries an explicit `Content-Length`
//! (reqwest would compute one anyway, but setting it ourselves keeps the
//! header visible for the `x-api-key` placement convention this module
//! follows), caps the total request lifetime at five seconds via an
//! external `tokio::time::timeout` wrapper rather than reqwest's own
//! per-connect/per-read timeouts (a single deadline covering DNS, connect,
//! TLS, send, and response), and reads at most 1024 bytes of an error body
//! so a hostile or buggy endpoint cannot make a failure handler buffer
//! unbounded memory.

mod private
{
  use crate::config::ClientConfig;
  use crate::error::ClientError;
  use crate::event::RequestEvent;
  use crate::resolver::ResolvingDialer;
  use std::time::Duration;

  const REQUEST_DEADLINE : Duration = Duration::from_secs( 5 );
  const MAX_ERROR_BODY_BYTES : usize = 1024;
  const MAX_IDLE_PER_HOST : usize = 2;

  /// The outcome of one submission attempt.
  #[ derive( Debug ) ]
  pub enum SubmitOutcome
  {
    /// The endpoint accepted the batch (2xx).
    Accepted,
    /// The endpoint rejected the batch; `error` carries the classification
    /// (`retryable()`/`status_code()`).
    Rejected( ClientError ),
  }

  /// Thin wrapper over a configured [`reqwest::Client`] that knows how to
  /// submit exactly one batch.
  #[ derive( Debug, Clone ) ]
  pub struct Submitter
  {
    http : reqwest::Client,
    endpoint : url::Url,
    api_key : String,
  }

  impl Submitter
  {
    /// Build a submitter for `config`.
    ///
    /// Installs the [`ResolvingDialer`] unless the endpoint is the
    /// localhost exception, in which case the system resolver is used
    /// unmodified (there is nothing to protect a loopback dial against).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the underlying `reqwest`
    /// client fails to build (bad TLS material, for example).
    pub fn new( config : &ClientConfig ) -> Result< Self, ClientError >
    {
      let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host( MAX_IDLE_PER_HOST )
        .danger_accept_invalid_certs( !config.tls().reject_unauthorized );

      if !config.is_localhost_exception()
      {
        builder = builder.dns_resolver( std::sync::Arc::new( ResolvingDialer::new() ) );
      }

      if let Some( ca_path ) = config.tls().ca_path.as_ref()
      {
        let pem = std::fs::read( ca_path )
          .map_err( | e | ClientError::Configuration( format!( "failed to read TLS CA bundle : {e}" ) ) )?;
        let cert = reqwest::Certificate::from_pem( &pem )
          .map_err( | e | ClientError::Configuration( format!( "invalid TLS CA bundle : {e}" ) ) )?;
        builder = builder.add_root_certificate( cert );
      }

      if let ( Some( cert_path ), Some( key_path ) ) = ( config.tls().cert_path.as_ref(), config.tls().key_path.as_ref() )
      {
        let mut identity_pem = std::fs::read( cert_path )
          .map_err( | e | ClientError::Configuration( format!( "failed to read TLS client certificate : {e}" ) ) )?;
        let mut key_pem = std::fs::read( key_path )
          .map_err( | e | ClientError::Configuration( format!( "failed to read TLS client key : {e}" ) ) )?;
        identity_pem.push( b'\n' );
        identity_pem.append( &mut key_pem );
        let identity = reqwest::Identity::from_pem( &identity_pem )
          .map_err( | e | ClientError::Configuration( format!( "invalid TLS client identity : {e}" ) ) )?;
        builder = builder.identity( identity );
      }

      let http = builder.build()
        .map_err( | e | ClientError::Configuration( format!( "failed to build HTTP client : {e}" ) ) )?;

      Ok( Self
      {
        http,
        endpoint : config.endpoint().clone(),
        api_key : config.api_key().as_str().to_string(),
      } )
    }

    /// Submit one batch, applying the five-second total deadline.
    pub async fn submit( &self, batch : &[ RequestEvent ] ) -> SubmitOutcome
    {
      match tokio::time::timeout( REQUEST_DEADLINE, self.submit_inner( batch ) ).await
      {
        Ok( outcome ) => outcome,
        Err( _elapsed ) => SubmitOutcome::Rejected( ClientError::Transport( "request exceeded 5s deadline".to_string() ) ),
      }
    }

    async fn submit_inner( &self, batch : &[ RequestEvent ] ) -> SubmitOutcome
    {
      let body = match serde_json::to_vec( batch )
      {
        Ok( bytes ) => bytes,
        Err( e ) => return SubmitOutcome::Rejected( ClientError::Transport( format!( "failed to serialize batch : {e}" ) ) ),
      };

      let response = self.http
        .post( self.endpoint.clone() )
        .header( reqwest::header::CONTENT_TYPE, "application/json" )
        .header( reqwest::header::CONTENT_LENGTH, body.len() )
        .header( "x-api-key", &self.api_key )
        .body( body )
        .send()
        .await;

      let response = match response
      {
        Ok( response ) => response,
        Err( e ) => return SubmitOutcome::Rejected( ClientError::Transport( e.to_string() ) ),
      };

      let status = response.status();

      if status.is_success()
      {
        return SubmitOutcome::Accepted;
      }

      let retry_after = response.headers()
        .get( reqwest::header::RETRY_AFTER )
        .and_then( | v | v.to_str().ok() )
        .map( ToString::to_string );

      let body_text = Self::read_bounded_body( response ).await;

      SubmitOutcome::Rejected( ClientError::Remote
      {
        status : status.as_u16(),
        body : body_text,
        retry_after,
      } )
    }

    /// Read at most `MAX_ERROR_BODY_BYTES` of `response`'s body.
    ///
    /// Pulls chunks one at a time via [`reqwest::Response::chunk`] and stops
    /// as soon as the cap is reached, instead of buffering the whole body
    /// with `Response::bytes` first — a hostile or misbehaving endpoint
    /// cannot make this allocate past the cap no matter how large the
    /// response actually is.
    async fn read_bounded_body( mut response : reqwest::Response ) -> String
    {
      let mut buffer = Vec::with_capacity( MAX_ERROR_BODY_BYTES );

      loop
      {
        if buffer.len() >= MAX_ERROR_BODY_BYTES
        {
          break;
        }

        match response.chunk().await
        {
          Ok( Some( chunk ) ) =>
          {
            let remaining = MAX_ERROR_BODY_BYTES - buffer.len();
            let take = chunk.len().min( remaining );
            buffer.extend_from_slice( &chunk[ ..take ] );
          },
          Ok( None ) => break,
          Err( _ ) => break,
        }
      }

      String::from_utf8_lossy( &buffer ).into_owned()
    }
  }
}

crate::mod_interface!
{
  exposed use Submitter;
  exposed use SubmitOutcome;
}
