//! Disk Spool : append-only crash-recovery store (component 4.6)
//!
//! The spool file is newline-delimited JSON, one line per batch (a JSON
//! array of [`RequestEvent`]). Each line is written under a single
//! `O_APPEND` write, which is atomic with respect to other writers on a
//! POSIX filesystem — concurrent clients sharing an endpoint (and therefore
//! a spool path) interleave whole lines, never partial ones.

mod private
{
  use crate::buffer::EventBuffer;
  use crate::error::ClientError;
  use crate::event::RequestEvent;
  use std::os::unix::fs::OpenOptionsExt;
  use std::path::{ Path, PathBuf };

  /// An append-only spool file keyed to a single ingestion endpoint.
  #[ derive( Debug, Clone ) ]
  pub struct Spool
  {
    path : PathBuf,
    max_bytes : u64,
  }

  impl Spool
  {
    /// Build a spool over an explicit path.
    #[ must_use ]
    pub fn new( path : PathBuf, max_bytes : u64 ) -> Self
    {
      Self { path, max_bytes }
    }

    /// The default spool path : the system temp directory plus an 8-hex-
    /// char hash of the endpoint, so distinct clients never collide.
    ///
    /// The endpoint is canonicalized via [`crate::config::sort_query_string`]
    /// before hashing, so two configurations that differ only in query
    /// parameter order share a spool path rather than spooling past each
    /// other.
    #[ must_use ]
    pub fn default_path( endpoint : &url::Url ) -> PathBuf
    {
      let canonical = crate::config::sort_query_string( endpoint );
      let hash = blake3::hash( canonical.as_str().as_bytes() );
      let short_hash = &hash.to_hex().as_str()[ ..8 ];
      std::env::temp_dir().join( format!( "telemetry-client-{short_hash}.jsonl" ) )
    }

    /// The primary spool file path.
    #[ must_use ]
    pub fn path( &self ) -> &Path
    {
      &self.path
    }

    fn recovering_sibling( path : &Path ) -> PathBuf
    {
      let mut os_string = path.as_os_str().to_owned();
      os_string.push( ".recovering" );
      PathBuf::from( os_string )
    }

    /// Append one batch (async variant, used by the Flush Engine).
    ///
    /// Opens the file append+create+write at mode `0o600`, `fstat`s the
    /// same file descriptor, and skips the write entirely if the file is
    /// already at or over `max_bytes` — the fstat-then-write pattern uses a
    /// single descriptor so there is no TOCTOU window between the size
    /// check and the append.
    pub async fn write( &self, batch : &[ RequestEvent ] ) -> Result< (), ClientError >
    {
      let line = Self::encode_line( batch )?;

      let file = tokio::fs::OpenOptions::new()
        .append( true )
        .create( true )
        .write( true )
        .mode( 0o600 )
        .open( &self.path )
        .await
        .map_err( | e | ClientError::Spool( format!( "failed to open spool file : {e}" ) ) )?;

      let size = file.metadata().await
        .map_err( | e | ClientError::Spool( format!( "failed to fstat spool file : {e}" ) ) )?
        .len();

      if size >= self.max_bytes
      {
        tracing::debug!( size, max_bytes = self.max_bytes, "spool file at capacity, dropping batch" );
        return Ok( () );
      }

      use tokio::io::AsyncWriteExt;
      let mut file = file;
      file.write_all( line.as_bytes() ).await
        .map_err( | e | ClientError::Spool( format!( "failed to append to spool file : {e}" ) ) )?;

      Ok( () )
    }

    /// Append one batch (sync variant, used during signal-driven shutdown
    /// where no async runtime step is available).
    pub fn write_sync( &self, batch : &[ RequestEvent ] ) -> Result< (), ClientError >
    {
      let line = Self::encode_line( batch )?;

      let file = std::fs::OpenOptions::new()
        .append( true )
        .create( true )
        .write( true )
        .mode( 0o600 )
        .open( &self.path )
        .map_err( | e | ClientError::Spool( format!( "failed to open spool file : {e}" ) ) )?;

      let size = file.metadata()
        .map_err( | e | ClientError::Spool( format!( "failed to fstat spool file : {e}" ) ) )?
        .len();

      if size >= self.max_bytes
      {
        tracing::debug!( size, max_bytes = self.max_bytes, "spool file at capacity, dropping batch" );
        return Ok( () );
      }

      use std::io::Write;
      let mut file = file;
      file.write_all( line.as_bytes() )
        .map_err( | e | ClientError::Spool( format!( "failed to append to spool file : {e}" ) ) )?;

      Ok( () )
    }

    fn encode_line( batch : &[ RequestEvent ] ) -> Result< String, ClientError >
    {
      let mut json = serde_json::to_string( batch )
        .map_err( | e | ClientError::Spool( format!( "failed to serialize batch : {e}" ) ) )?;
      json.push( '\n' );
      Ok( json )
    }

    /// Recover events persisted before a crash.
    ///
    /// If a `.recovering` sibling file exists it is the source; else if the
    /// primary spool file exists it is the source; else this is a no-op.
    /// The source is read, split into lines, each parsed as a JSON array of
    /// events; decoded events are pushed into `buffer` until capacity is
    /// hit. Parse failures on a line are skipped silently (the line is
    /// corrupt). If the source cannot be read at all it is deleted. After
    /// loading, if the source was the primary file, it is renamed to
    /// `.recovering` so that a crash between recovery and the first
    /// successful flush does not lose the events a second time. Returns the
    /// recorded `.recovering` path when recovery loaded anything.
    #[ must_use ]
    pub fn startup_recover( &self, buffer : &mut EventBuffer ) -> Option< PathBuf >
    {
      let recovering = Self::recovering_sibling( &self.path );

      let ( source, came_from_primary ) = if recovering.exists()
      {
        ( recovering.clone(), false )
      }
      else if self.path.exists()
      {
        ( self.path.clone(), true )
      }
      else
      {
        return None;
      };

      let Ok( contents ) = std::fs::read_to_string( &source ) else
      {
        tracing::debug!( path = %source.display(), "spool file unreadable, deleting" );
        let _ = std::fs::remove_file( &source );
        return None;
      };

      let mut loaded = 0usize;
      for line in contents.lines()
      {
        if line.trim().is_empty()
        {
          continue;
        }

        match serde_json::from_str::< Vec< RequestEvent > >( line )
        {
          Ok( batch ) =>
          {
            for event in batch
            {
              loaded += 1;
              if !buffer.try_push( event )
              {
                break;
              }
            }
          },
          Err( _ ) =>
          {
            tracing::debug!( "skipping corrupt spool line" );
          },
        }
      }

      tracing::debug!( loaded, path = %source.display(), "recovered events from spool" );

      if came_from_primary
      {
        if let Err( e ) = std::fs::rename( &self.path, &recovering )
        {
          tracing::debug!( error = %e, "failed to rename spool file into recovery position" );
        }
      }

      Some( recovering )
    }

    /// Unlink the `.recovering` file after the first successful flush.
    pub fn cleanup_recovery( &self, recovery_path : &Path )
    {
      if let Err( e ) = std::fs::remove_file( recovery_path )
      {
        if e.kind() != std::io::ErrorKind::NotFound
        {
          tracing::debug!( error = %e, "failed to remove recovery file" );
        }
      }
    }
  }
}

crate::mod_interface!
{
  exposed use Spool;
}
