//! The Flush Engine (component 4.7)
//!
//! Owns the retry/backoff state machine for one endpoint : drains a batch
//! from the buffer, submits it, and on failure either re-queues the batch
//! behind an exponential backoff or, once five consecutive failures have
//! accumulated, spills the batch to disk and resets the backoff so the next
//! tick starts clean. Non-retryable failures (4xx other than 429) are never
//! retried — they are spilled immediately and reported through `on_error`.
//!
//! Backoff follows `BASE * 2^(n-1) * uniform(0.5, 1.0)` with `BASE` = 1000ms,
//! the same shape as the HTTP retry helper this module is grounded on,
//! capped at 60s.

mod private
{
  use crate::buffer::EventBuffer;
  use crate::config::OnError;
  use crate::error::ClientError;
  use crate::event::RequestEvent;
  use crate::spool::Spool;
  use crate::transport::{ SubmitOutcome, Submitter };
  use rand::Rng;
  use std::panic::AssertUnwindSafe;
  use std::path::PathBuf;
  use std::time::Duration;
  use tokio::time::Instant;

  const BASE_BACKOFF : Duration = Duration::from_millis( 1000 );
  const MAX_BACKOFF : Duration = Duration::from_secs( 60 );
  const FAILURE_SPILL_THRESHOLD : u32 = 5;

  /// The outcome of one flush attempt, reported back to the actor loop.
  #[ derive( Debug ) ]
  pub enum FlushResult
  {
    /// The buffer was empty; nothing to do.
    Empty,
    /// Still inside a backoff window from a previous failure.
    BackingOff,
    /// The batch was accepted by the endpoint.
    Sent { count : usize },
    /// The batch failed and was re-queued behind a backoff delay.
    Retrying { count : usize, delay : Duration },
    /// The batch was spilled to disk, either because it hit the
    /// consecutive-failure threshold or because the failure was
    /// non-retryable.
    Spilled { count : usize, reason : ClientError },
  }

  /// Result of the synchronous half of a flush cycle.
  #[ derive( Debug ) ]
  pub enum Begin
  {
    /// Nothing to submit right now; carries the terminal result directly.
    Blocked( FlushResult ),
    /// A batch was drained and is ready to submit.
    Batch( Vec< RequestEvent > ),
  }

  /// Retry/backoff state plus the submitter and spool a flush needs.
  pub struct FlushEngine
  {
    submitter : Submitter,
    spool : Spool,
    batch_size : usize,
    on_error : Option< OnError >,
    consecutive_failures : u32,
    backoff_until : Option< Instant >,
    recovery_path : Option< PathBuf >,
  }

  impl FlushEngine
  {
    /// Build a flush engine over an already-constructed submitter and
    /// spool.
    #[ must_use ]
    pub fn new( submitter : Submitter, spool : Spool, batch_size : usize, on_error : Option< OnError > ) -> Self
    {
      Self
      {
        submitter,
        spool,
        batch_size,
        on_error,
        consecutive_failures : 0,
        backoff_until : None,
        recovery_path : None,
      }
    }

    /// Record the `.recovering` spool path loaded at startup, so the first
    /// successful flush can clean it up.
    pub fn set_recovery_path( &mut self, path : Option< PathBuf > )
    {
      self.recovery_path = path;
    }

    fn report_error( &self, error : &ClientError )
    {
      if let Some( on_error ) = &self.on_error
      {
        let _ = std::panic::catch_unwind( AssertUnwindSafe( || on_error( error ) ) );
      }
    }

    fn jittered_backoff( attempt : u32 ) -> Duration
    {
      let exponent = attempt.saturating_sub( 1 );
      let base_ms = BASE_BACKOFF.as_millis() as f64 * 2f64.powi( exponent as i32 );
      let jitter = rand::rng().random_range( 0.5..=1.0 );
      let delay_ms = ( base_ms * jitter ) as u64;
      Duration::from_millis( delay_ms ).min( MAX_BACKOFF )
    }

    /// Attempt one flush cycle in a single call, combining
    /// [`Self::begin_attempt`] and [`Self::complete_attempt`]. Used by
    /// callers that have no need to overlap the network round-trip with
    /// other work (tests, the synchronous shutdown path).
    ///
    /// Drains up to `batch_size` events from `buffer` and submits them. On
    /// success, resets the failure counter and cleans up the recovery file
    /// (first success only). On a retryable failure below the threshold,
    /// the batch is re-prepended to `buffer` and a backoff window is armed.
    /// On the fifth consecutive retryable failure, or on any non-retryable
    /// failure, the batch is spilled to disk and the failure counter
    /// resets (a fresh batch gets a fresh run of attempts).
    pub async fn attempt( &mut self, buffer : &mut EventBuffer ) -> FlushResult
    {
      match self.begin_attempt( buffer )
      {
        Begin::Blocked( result ) => result,
        Begin::Batch( batch ) =>
        {
          let outcome = self.submitter.submit( &batch ).await;
          self.complete_attempt( buffer, batch, outcome ).await
        },
      }
    }

    /// The synchronous half of a flush cycle : checks backoff/emptiness and
    /// drains the batch to submit. The actor loop calls this, then spawns
    /// the network call in its own task so `track()` keeps draining while
    /// the request is in flight, then feeds the outcome to
    /// [`Self::complete_attempt`].
    pub fn begin_attempt( &mut self, buffer : &mut EventBuffer ) -> Begin
    {
      if let Some( until ) = self.backoff_until
      {
        if Instant::now() < until
        {
          return Begin::Blocked( FlushResult::BackingOff );
        }
        self.backoff_until = None;
      }

      if buffer.is_empty()
      {
        return Begin::Blocked( FlushResult::Empty );
      }

      Begin::Batch( buffer.drain_front( self.batch_size ) )
    }

    /// A clone of the submitter, cheap (the inner `reqwest::Client` is
    /// reference-counted), for the actor to move into the spawned submit
    /// task.
    #[ must_use ]
    pub fn submitter( &self ) -> Submitter
    {
      self.submitter.clone()
    }

    /// The asynchronous half of a flush cycle : apply a submit outcome that
    /// was produced (possibly by a different task) for `batch`.
    pub async fn complete_attempt( &mut self, buffer : &mut EventBuffer, batch : Vec< RequestEvent >, outcome : SubmitOutcome ) -> FlushResult
    {
      let count = batch.len();

      match outcome
      {
        SubmitOutcome::Accepted =>
        {
          self.consecutive_failures = 0;
          if let Some( recovery_path ) = self.recovery_path.take()
          {
            self.spool.cleanup_recovery( &recovery_path );
          }
          FlushResult::Sent { count }
        },
        SubmitOutcome::Rejected( error ) => self.handle_rejection( buffer, batch, error ).await,
      }
    }

    /// Write `batch` straight to the spool file, synchronously. Used only
    /// by the shutdown path, where no more async scheduling happens after
    /// this call.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Spool` if the file cannot be opened or
    /// written.
    pub fn spill_sync( &self, batch : &[ RequestEvent ] ) -> Result< (), ClientError >
    {
      self.spool.write_sync( batch )
    }

    async fn handle_rejection( &mut self, buffer : &mut EventBuffer, batch : Vec< RequestEvent >, error : ClientError ) -> FlushResult
    {
      let count = batch.len();

      if !error.retryable()
      {
        self.report_error( &error );
        if let Err( spool_error ) = self.spool.write( &batch ).await
        {
          tracing::warn!( error = %spool_error, "failed to spill non-retryable batch to disk" );
        }
        // Neither incremented nor reset here — a non-retryable failure says
        // nothing about the transport's health, so it leaves whatever
        // consecutive-failure count the retryable path had built up alone.
        return FlushResult::Spilled { count, reason : error };
      }

      self.consecutive_failures += 1;

      if self.consecutive_failures >= FAILURE_SPILL_THRESHOLD
      {
        self.report_error( &error );
        if let Err( spool_error ) = self.spool.write( &batch ).await
        {
          tracing::warn!( error = %spool_error, "failed to spill batch to disk after repeated failures" );
        }
        self.consecutive_failures = 0;
        self.backoff_until = None;
        return FlushResult::Spilled { count, reason : error };
      }

      let delay = Self::jittered_backoff( self.consecutive_failures );
      self.backoff_until = Some( Instant::now() + delay );
      buffer.prepend_front( batch );
      self.report_error( &error );

      FlushResult::Retrying { count, delay }
    }
  }
}

crate::mod_interface!
{
  exposed use FlushEngine;
  exposed use FlushResult;
  exposed use Begin;
}
