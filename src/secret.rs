//! API key handling for the telemetry client

mod private
{
  use crate::error::ClientError;

  /// Sanitized, non-empty API key sent as the `x-api-key` header
  #[ derive( Clone ) ]
  pub struct ApiKey( String );

  impl std::fmt::Debug for ApiKey
  {
    fn fmt( &self, f : &mut std::fmt::Formatter< '_ > ) -> std::fmt::Result
    {
      f.debug_tuple( "ApiKey" ).field( &"< REDACTED >" ).finish()
    }
  }

  impl ApiKey
  {
    /// Validate and wrap an API key.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the key is empty or contains
    /// a carriage return, line feed, or NUL byte.
    pub fn new( api_key : impl Into< String > ) -> Result< Self, ClientError >
    {
      let api_key = api_key.into();

      if api_key.is_empty()
      {
        return Err( ClientError::Configuration( "apiKey must be a non-empty string".to_string() ) );
      }

      if api_key.contains( '\r' ) || api_key.contains( '\n' ) || api_key.contains( '\0' )
      {
        return Err( ClientError::Configuration( "apiKey must not contain CR, LF, or NUL".to_string() ) );
      }

      Ok( Self( api_key ) )
    }

    /// Borrow the raw key for use as a header value.
    #[ must_use ]
    pub fn as_str( &self ) -> &str
    {
      &self.0
    }
  }
}

crate::mod_interface!
{
  exposed use ApiKey;
}
