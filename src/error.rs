//! Error taxonomy for the telemetry client
//!
//! Mirrors the error kinds from the component design: construction-time
//! `Configuration` errors are fatal and escape `Client::create`; everything
//! else is either handled internally by the Flush Engine or handed to the
//! user's `on_error` callback and never propagated further.

mod private
{
  use std::fmt;

  /// Errors surfaced by the telemetry client
  #[ derive( Debug, Clone ) ]
  pub enum ClientError
  {
    /// Fatal configuration error, surfaced only from `Client::create`
    Configuration( String ),
    /// Transport-level failure (DNS, connect, TLS, timeout, body IO)
    Transport( String ),
    /// Non-2xx response from the ingestion endpoint
    Remote
    {
      /// HTTP status code returned by the endpoint
      status : u16,
      /// Response body, bounded to 1024 bytes
      body : String,
      /// `Retry-After` header value, if present
      retry_after : Option< String >,
    },
    /// Disk spool write failure
    Spool( String ),
  }

  impl ClientError
  {
    /// Whether the Flush Engine should treat this as retryable.
    ///
    /// A transport error is always retryable. A remote error is retryable
    /// iff its status is in `{429, 500, 502, 503, 504}`; every other 4xx/5xx
    /// is non-retryable.
    #[ must_use ]
    pub fn retryable( &self ) -> bool
    {
      match self
      {
        Self::Transport( _ ) => true,
        Self::Remote { status, .. } => matches!( status, 429 | 500 | 502 | 503 | 504 ),
        Self::Configuration( _ ) | Self::Spool( _ ) => false,
      }
    }

    /// HTTP status code carried by this error, 0 for non-HTTP errors.
    #[ must_use ]
    pub fn status_code( &self ) -> u16
    {
      match self
      {
        Self::Remote { status, .. } => *status,
        _ => 0,
      }
    }
  }

  impl fmt::Display for ClientError
  {
    fn fmt( &self, f : &mut fmt::Formatter< '_ > ) -> fmt::Result
    {
      match self
      {
        Self::Configuration( message ) => write!( f, "configuration error : {message}" ),
        Self::Transport( message ) => write!( f, "transport error : {message}" ),
        Self::Remote { status, body, retry_after } =>
        {
          match retry_after
          {
            Some( retry_after ) => write!( f, "remote error {status} : {body} (retry-after : {retry_after})" ),
            None => write!( f, "remote error {status} : {body}" ),
          }
        },
        Self::Spool( message ) => write!( f, "spool error : {message}" ),
      }
    }
  }

  impl std::error::Error for ClientError {}

  impl From< reqwest::Error > for ClientError
  {
    fn from( error : reqwest::Error ) -> Self
    {
      Self::Transport( error.to_string() )
    }
  }
}

crate::mod_interface!
{
  exposed use ClientError;
}
