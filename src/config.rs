//! Configuration loading and the Endpoint Validator (component 4.1)

mod private
{
  use crate::error::ClientError;
  use crate::private_net::is_private_address_str;
  use crate::secret::ApiKey;
  use std::path::PathBuf;
  use std::sync::Arc;
  use std::time::Duration;

  /// TLS options forwarded to the transport, mirroring `tlsOptions` in the
  /// original configuration table.
  #[ derive( Debug, Clone ) ]
  pub struct TlsOptions
  {
    /// Path to a PEM-encoded CA bundle to trust in addition to the system
    /// roots.
    pub ca_path : Option< PathBuf >,
    /// Path to a PEM-encoded client certificate.
    pub cert_path : Option< PathBuf >,
    /// Path to the PEM-encoded private key matching `cert_path`.
    pub key_path : Option< PathBuf >,
    /// When `false`, disables certificate validation. Only ever useful in
    /// tests against a local mock endpoint — never set this in production.
    /// Defaults to `true`.
    pub reject_unauthorized : bool,
  }

  impl Default for TlsOptions
  {
    fn default() -> Self
    {
      Self { ca_path : None, cert_path : None, key_path : None, reject_unauthorized : true }
    }
  }

  /// Background-failure callback. Exceptions/panics raised from this
  /// callback are never allowed to propagate — `flush.rs` always calls it
  /// through `std::panic::catch_unwind`.
  pub type OnError = Arc< dyn Fn( &ClientError ) + Send + Sync >;

  /// Validated, immutable client configuration.
  ///
  /// Constructed only via [`ClientConfig::build`], which runs the Endpoint
  /// Validator (component 4.1) eagerly so that an invalid configuration
  /// fails at construction rather than at first flush.
  #[ derive( Clone ) ]
  pub struct ClientConfig
  {
    pub(crate) endpoint : url::Url,
    pub(crate) api_key : ApiKey,
    pub(crate) flush_interval : Duration,
    pub(crate) batch_size : usize,
    pub(crate) max_buffer_size : usize,
    pub(crate) max_event_bytes : usize,
    pub(crate) max_storage_bytes : u64,
    pub(crate) storage_path : Option< PathBuf >,
    pub(crate) debug : bool,
    pub(crate) tls : TlsOptions,
    pub(crate) on_error : Option< OnError >,
    pub(crate) localhost_exception : bool,
  }

  impl std::fmt::Debug for ClientConfig
  {
    fn fmt( &self, f : &mut std::fmt::Formatter< '_ > ) -> std::fmt::Result
    {
      f.debug_struct( "ClientConfig" )
        .field( "endpoint", &self.endpoint.as_str() )
        .field( "api_key", &self.api_key )
        .field( "flush_interval", &self.flush_interval )
        .field( "batch_size", &self.batch_size )
        .field( "max_buffer_size", &self.max_buffer_size )
        .field( "max_event_bytes", &self.max_event_bytes )
        .field( "max_storage_bytes", &self.max_storage_bytes )
        .field( "storage_path", &self.storage_path )
        .field( "debug", &self.debug )
        .field( "tls", &self.tls )
        .field( "localhost_exception", &self.localhost_exception )
        .finish_non_exhaustive()
    }
  }

  impl ClientConfig
  {
    /// Start building a configuration from the required `endpoint` and
    /// `apiKey`.
    #[ must_use ]
    pub fn builder( endpoint : impl Into< String >, api_key : impl Into< String > ) -> ClientConfigBuilder
    {
      ClientConfigBuilder
      {
        endpoint : endpoint.into(),
        api_key : api_key.into(),
        flush_interval : Duration::from_millis( 10_000 ),
        batch_size : 100,
        max_buffer_size : 10_000,
        max_event_bytes : 65_536,
        max_storage_bytes : 5_242_880,
        storage_path : None,
        debug : false,
        tls : TlsOptions::default(),
        on_error : None,
      }
    }

    /// Load `endpoint`/`apiKey` from the `TELEMETRY_ENDPOINT` /
    /// `TELEMETRY_API_KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if either variable is missing or
    /// the resulting configuration fails validation.
    pub fn from_env() -> Result< Self, ClientError >
    {
      let endpoint = std::env::var( "TELEMETRY_ENDPOINT" )
        .map_err( | _ | ClientError::Configuration( "missing TELEMETRY_ENDPOINT".to_string() ) )?;
      let api_key = std::env::var( "TELEMETRY_API_KEY" )
        .map_err( | _ | ClientError::Configuration( "missing TELEMETRY_API_KEY".to_string() ) )?;

      Self::builder( endpoint, api_key ).build()
    }

    /// The validated ingestion endpoint (credentials stripped).
    #[ must_use ]
    pub fn endpoint( &self ) -> &url::Url
    {
      &self.endpoint
    }

    /// Whether the resolver/SSRF hook should be skipped because the
    /// endpoint is the localhost exception.
    #[ must_use ]
    pub fn is_localhost_exception( &self ) -> bool
    {
      self.localhost_exception
    }

    pub( crate ) fn api_key( &self ) -> &ApiKey
    {
      &self.api_key
    }

    /// How often the periodic ticker invokes `flush()`.
    #[ must_use ]
    pub fn flush_interval( &self ) -> Duration
    {
      self.flush_interval
    }

    /// Drain/threshold size for the event buffer.
    #[ must_use ]
    pub fn batch_size( &self ) -> usize
    {
      self.batch_size
    }

    /// Hard cap on the in-memory event buffer.
    #[ must_use ]
    pub fn max_buffer_size( &self ) -> usize
    {
      self.max_buffer_size
    }

    /// Per-event serialized size cap.
    #[ must_use ]
    pub fn max_event_bytes( &self ) -> usize
    {
      self.max_event_bytes
    }

    /// Spool-file size cap.
    #[ must_use ]
    pub fn max_storage_bytes( &self ) -> u64
    {
      self.max_storage_bytes
    }

    /// Explicit spool-file path, if configured.
    #[ must_use ]
    pub fn storage_path( &self ) -> Option< &std::path::Path >
    {
      self.storage_path.as_deref()
    }

    /// Whether verbose debug logging is enabled.
    #[ must_use ]
    pub fn debug( &self ) -> bool
    {
      self.debug
    }

    /// TLS options forwarded to the transport.
    #[ must_use ]
    pub fn tls( &self ) -> &TlsOptions
    {
      &self.tls
    }

    /// The configured background-failure callback, if any.
    #[ must_use ]
    pub fn on_error( &self ) -> Option< &OnError >
    {
      self.on_error.as_ref()
    }
  }

  /// Return `url` with its query parameters re-ordered alphabetically by
  /// key, stable on ties (equal keys keep their relative order).
  ///
  /// Used to canonicalize the endpoint before hashing it into the spool-file
  /// name (component 4.6), so that two configurations pointing at the same
  /// collector with differently-ordered query parameters land on the same
  /// spool path instead of spooling past each other. Idempotent:
  /// `sort_query_string(sort_query_string(url)) == sort_query_string(url)`.
  #[ must_use ]
  pub fn sort_query_string( url : &url::Url ) -> url::Url
  {
    let mut pairs : Vec< ( String, String ) > = url.query_pairs().into_owned().collect();
    if pairs.is_empty()
    {
      return url.clone();
    }

    pairs.sort_by( | a, b | a.0.cmp( &b.0 ) );

    let mut sorted = url.clone();
    sorted.query_pairs_mut().clear().extend_pairs( pairs.iter() );
    sorted
  }

  /// Builder for [`ClientConfig`].
  #[ derive( Clone ) ]
  pub struct ClientConfigBuilder
  {
    endpoint : String,
    api_key : String,
    flush_interval : Duration,
    batch_size : usize,
    max_buffer_size : usize,
    max_event_bytes : usize,
    max_storage_bytes : u64,
    storage_path : Option< PathBuf >,
    debug : bool,
    tls : TlsOptions,
    on_error : Option< OnError >,
  }

  impl std::fmt::Debug for ClientConfigBuilder
  {
    fn fmt( &self, f : &mut std::fmt::Formatter< '_ > ) -> std::fmt::Result
    {
      f.debug_struct( "ClientConfigBuilder" )
        .field( "endpoint", &self.endpoint )
        .field( "flush_interval", &self.flush_interval )
        .field( "batch_size", &self.batch_size )
        .field( "max_buffer_size", &self.max_buffer_size )
        .field( "max_event_bytes", &self.max_event_bytes )
        .field( "max_storage_bytes", &self.max_storage_bytes )
        .field( "storage_path", &self.storage_path )
        .field( "debug", &self.debug )
        .field( "tls", &self.tls )
        .finish_non_exhaustive()
    }
  }

  impl ClientConfigBuilder
  {
    /// Override the default 10s flush interval.
    #[ must_use ]
    pub fn flush_interval( mut self, interval : Duration ) -> Self
    {
      self.flush_interval = interval;
      self
    }

    /// Override the default batch size of 100.
    #[ must_use ]
    pub fn batch_size( mut self, batch_size : usize ) -> Self
    {
      self.batch_size = batch_size;
      self
    }

    /// Override the default buffer cap of 10 000 events.
    #[ must_use ]
    pub fn max_buffer_size( mut self, max_buffer_size : usize ) -> Self
    {
      self.max_buffer_size = max_buffer_size;
      self
    }

    /// Override the default per-event cap of 65 536 bytes.
    #[ must_use ]
    pub fn max_event_bytes( mut self, max_event_bytes : usize ) -> Self
    {
      self.max_event_bytes = max_event_bytes;
      self
    }

    /// Override the default spool cap of 5 MiB.
    #[ must_use ]
    pub fn max_storage_bytes( mut self, max_storage_bytes : u64 ) -> Self
    {
      self.max_storage_bytes = max_storage_bytes;
      self
    }

    /// Use an explicit spool-file path instead of the temp-dir default.
    #[ must_use ]
    pub fn storage_path( mut self, path : impl Into< PathBuf > ) -> Self
    {
      self.storage_path = Some( path.into() );
      self
    }

    /// Enable verbose debug logging.
    #[ must_use ]
    pub fn debug( mut self, debug : bool ) -> Self
    {
      self.debug = debug;
      self
    }

    /// Set TLS options forwarded to the transport.
    #[ must_use ]
    pub fn tls( mut self, tls : TlsOptions ) -> Self
    {
      self.tls = tls;
      self
    }

    /// Register a background-failure callback.
    #[ must_use ]
    pub fn on_error< F >( mut self, on_error : F ) -> Self
    where
      F : Fn( &ClientError ) + Send + Sync + 'static,
    {
      self.on_error = Some( Arc::new( on_error ) );
      self
    }

    /// Run the Endpoint Validator and produce a [`ClientConfig`].
    ///
    /// Rules, in order (component 4.1) :
    /// 1. `endpoint` must parse as a URL.
    /// 2. If the scheme is not `https`, the bare host (IPv6 brackets
    ///    stripped) must be exactly `localhost` or `127.0.0.1`.
    /// 3. Otherwise the host must not match the Private-Address Table.
    /// 4. Embedded userinfo is stripped; a warning is logged if `debug` is
    ///    on.
    /// 5. `apiKey` must be non-empty with no CR, LF, or NUL.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` on any rule violation.
    pub fn build( self ) -> Result< ClientConfig, ClientError >
    {
      let mut endpoint = url::Url::parse( &self.endpoint )
        .map_err( | e | ClientError::Configuration( format!( "endpoint does not parse as a URL : {e}" ) ) )?;

      let bare_host = endpoint.host_str()
        .ok_or_else( || ClientError::Configuration( "endpoint must have a host".to_string() ) )?
        .trim_start_matches( '[' )
        .trim_end_matches( ']' )
        .to_string();

      // Note: "::1" is deliberately excluded from the localhost exception —
      // the spec calls for `[::1]` endpoints to be rejected even though
      // bracketed, so only the exact "localhost"/"127.0.0.1" forms qualify.
      let is_localhost = bare_host == "localhost" || bare_host == "127.0.0.1";

      if endpoint.scheme() != "https" && !is_localhost
      {
        return Err( ClientError::Configuration(
          format!( "endpoint must use https unless host is localhost/127.0.0.1 (got scheme '{}', host '{bare_host}')", endpoint.scheme() )
        ) );
      }

      if !is_localhost && is_private_address_str( &bare_host )
      {
        return Err( ClientError::Configuration(
          format!( "endpoint host '{bare_host}' resolves to a private/reserved address range" )
        ) );
      }

      if endpoint.username() != "" || endpoint.password().is_some()
      {
        if self.debug
        {
          tracing::warn!( "stripping embedded credentials from configured endpoint" );
        }
        let _ = endpoint.set_username( "" );
        let _ = endpoint.set_password( None );
      }

      let api_key = ApiKey::new( self.api_key )?;

      Ok( ClientConfig
      {
        endpoint,
        api_key,
        flush_interval : self.flush_interval,
        batch_size : self.batch_size,
        max_buffer_size : self.max_buffer_size,
        max_event_bytes : self.max_event_bytes,
        max_storage_bytes : self.max_storage_bytes,
        storage_path : self.storage_path,
        debug : self.debug,
        tls : self.tls,
        on_error : self.on_error,
        localhost_exception : is_localhost,
      } )
    }
  }
}

crate::mod_interface!
{
  exposed use ClientConfig;
  exposed use ClientConfigBuilder;
  exposed use TlsOptions;
  exposed use OnError;
  exposed use sort_query_string;
}
