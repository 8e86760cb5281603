//! Resolving Dialer : SSRF-hardened DNS resolution (component 4.3)
//!
//! Installed as a custom [`reqwest::dns::Resolve`] so that every connection
//! reqwest opens is resolved through this hook instead of the system
//! resolver directly. Each resolved address is checked against the
//! Private-Address Table before the dial is allowed to proceed; a host
//! that resolves to a private or reserved address fails closed. Not
//! installed at all when the endpoint is the localhost exception.

mod private
{
  use crate::private_net::is_private_address;
  use reqwest::dns::{ Addrs, Name, Resolve, Resolving };
  use std::collections::HashMap;
  use std::net::SocketAddr;
  use std::sync::Arc;
  use std::time::{ Duration, Instant };
  use tokio::sync::RwLock;

  const CACHE_TTL : Duration = Duration::from_secs( 60 );

  struct CacheEntry
  {
    addrs : Vec< SocketAddr >,
    expires_at : Instant,
  }

  /// A [`reqwest::dns::Resolve`] implementation that rejects private and
  /// reserved addresses and caches successful lookups for 60 seconds per
  /// host, so that steady-state traffic does not re-resolve on every
  /// request.
  #[ derive( Clone ) ]
  pub struct ResolvingDialer
  {
    cache : Arc< RwLock< HashMap< String, CacheEntry > > >,
  }

  impl Default for ResolvingDialer
  {
    fn default() -> Self
    {
      Self { cache : Arc::new( RwLock::new( HashMap::new() ) ) }
    }
  }

  impl ResolvingDialer
  {
    /// Build an empty resolver with no cached entries.
    #[ must_use ]
    pub fn new() -> Self
    {
      Self::default()
    }

    async fn cached( &self, host : &str ) -> Option< Vec< SocketAddr > >
    {
      let cache = self.cache.read().await;
      let entry = cache.get( host )?;
      if entry.expires_at > Instant::now()
      {
        Some( entry.addrs.clone() )
      }
      else
      {
        None
      }
    }

    async fn store( &self, host : String, addrs : Vec< SocketAddr > )
    {
      let mut cache = self.cache.write().await;
      cache.insert( host, CacheEntry { addrs, expires_at : Instant::now() + CACHE_TTL } );
    }
  }

  impl Resolve for ResolvingDialer
  {
    fn resolve( &self, name : Name ) -> Resolving
    {
      let this = self.clone();
      Box::pin( async move
      {
        let host = name.as_str().to_string();

        if let Some( addrs ) = this.cached( &host ).await
        {
          let boxed : Addrs = Box::new( addrs.into_iter() );
          return Ok( boxed );
        }

        let resolved : Vec< SocketAddr > = tokio::net::lookup_host( ( host.as_str(), 0 ) )
          .await
          .map_err( | e | -> Box< dyn std::error::Error + Send + Sync > { Box::new( e ) } )?
          .collect();

        if resolved.is_empty()
        {
          let err : Box< dyn std::error::Error + Send + Sync > =
            format!( "no addresses found for host '{host}'" ).into();
          return Err( err );
        }

        if let Some( blocked ) = resolved.iter().find( | addr | is_private_address( addr.ip() ) )
        {
          tracing::warn!( host = %host, addr = %blocked.ip(), "refusing to dial private/reserved address" );
          let err : Box< dyn std::error::Error + Send + Sync > =
            format!( "host '{host}' resolved to a private/reserved address ({}), refusing to dial", blocked.ip() ).into();
          return Err( err );
        }

        this.store( host, resolved.clone() ).await;

        let boxed : Addrs = Box::new( resolved.into_iter() );
        Ok( boxed )
      } )
    }
  }
}

crate::mod_interface!
{
  exposed use ResolvingDialer;
}
