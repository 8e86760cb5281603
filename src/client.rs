//! The public [`Client`] facade (component 4.9 + 4.10, actor wiring)
//!
//! `Client` is a thin, `Clone`-able handle over a single actor task that
//! owns all mutable state (the buffer, the flush engine, the recovery
//! bookkeeping). `track()` is fire-and-forget over an unbounded channel and
//! never blocks the caller; `flush()` and `shutdown()` are awaitable and
//! resolve once the actor has actually done the work, via a `oneshot`
//! reply channel per call. The network half of every flush attempt runs in
//! its own spawned task so the actor keeps draining `track()` calls while a
//! request is in flight — only one submit is ever in flight at a time
//! (single-flight), mirroring the cooperative, never-re-entrant flush loop
//! this crate's concurrency model is ported from.

mod private
{
  use crate::buffer::EventBuffer;
  use crate::config::ClientConfig;
  use crate::error::ClientError;
  use crate::event::RequestEvent;
  use crate::flush::{ Begin, FlushEngine, FlushResult };
  use crate::lifecycle::{ LifecycleHandles, LifecycleSignal };
  use crate::spool::Spool;
  use crate::transport::Submitter;
  use tokio::sync::{ mpsc, oneshot };

  enum Command
  {
    Track( RequestEvent ),
    Flush( oneshot::Sender< () > ),
    Tick,
    FlushCompleted( Vec< RequestEvent >, crate::transport::SubmitOutcome ),
    /// Orderly shutdown : awaits any in-flight submit, attempts exactly one
    /// more flush, then spills whatever remains.
    Shutdown( oneshot::Sender< () > ),
    /// Signal-driven shutdown : never attempts an HTTP flush at all, even if
    /// one happens to be in flight already — it just stops the lifecycle
    /// tasks and spills the buffer synchronously.
    ShutdownSync( oneshot::Sender< () > ),
  }

  /// A running telemetry client.
  ///
  /// Dropping the last `Client` handle does not flush or shut anything
  /// down — call [`Client::shutdown`] explicitly, or rely on the
  /// `SIGTERM`/`SIGINT` handler installed at [`Client::create`].
  #[ derive( Clone ) ]
  pub struct Client
  {
    command_tx : mpsc::UnboundedSender< Command >,
  }

  impl Client
  {
    /// Validate `config`, recover any spooled events left over from a
    /// previous process, and start the actor, ticker, and signal-handling
    /// tasks.
    ///
    /// # Errors
    ///
    /// Returns whatever [`Submitter::new`] returns on a malformed TLS
    /// configuration. `config` itself is assumed already validated (see
    /// [`ClientConfig::builder`]).
    pub fn create( config : ClientConfig ) -> Result< Self, ClientError >
    {
      let submitter = Submitter::new( &config )?;
      let storage_path = config.storage_path().map( std::path::Path::to_path_buf )
        .unwrap_or_else( || Spool::default_path( config.endpoint() ) );
      let spool = Spool::new( storage_path, config.max_storage_bytes() );

      let max_buffer_size = config.max_buffer_size();
      let batch_size = config.batch_size();
      let max_event_bytes = config.max_event_bytes();
      let flush_interval = config.flush_interval();
      let on_error = config.on_error().cloned();

      let ( command_tx, command_rx ) = mpsc::unbounded_channel();

      let lifecycle_tx = command_tx.clone();
      let ( lifecycle_signal_tx, mut lifecycle_signal_rx ) = mpsc::unbounded_channel();
      let handles = LifecycleHandles::spawn( flush_interval, lifecycle_signal_tx );

      tokio::spawn( async move
      {
        while let Some( signal ) = lifecycle_signal_rx.recv().await
        {
          let command = match signal
          {
            LifecycleSignal::Tick => Command::Tick,
            LifecycleSignal::ShutdownRequested =>
            {
              let ( done_tx, _done_rx ) = oneshot::channel();
              Command::ShutdownSync( done_tx )
            },
          };
          if lifecycle_tx.send( command ).is_err()
          {
            break;
          }
        }
      } );

      tokio::spawn( run_actor( command_rx, command_tx.clone(), submitter, spool, max_buffer_size, batch_size, max_event_bytes, on_error, handles ) );

      Ok( Self { command_tx } )
    }

    /// Build the configuration from `TELEMETRY_ENDPOINT`/`TELEMETRY_API_KEY`
    /// and start a client over it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if either variable is missing
    /// or the resulting configuration fails validation, or whatever
    /// [`Client::create`] returns.
    pub fn from_env() -> Result< Self, ClientError >
    {
      Self::create( ClientConfig::from_env()? )
    }

    /// Record one request observation. Never blocks and never fails
    /// visibly — a full buffer silently drops the event.
    pub fn track( &self, event : RequestEvent )
    {
      let _ = self.command_tx.send( Command::Track( event ) );
    }

    /// Request an immediate flush and wait for the actor to finish
    /// draining the buffer (bounded by backoff : a flush that hits a retry
    /// delay resolves once the delay is armed, not once it elapses).
    pub async fn flush( &self )
    {
      let ( done_tx, done_rx ) = oneshot::channel();
      if self.command_tx.send( Command::Flush( done_tx ) ).is_err()
      {
        return;
      }
      let _ = done_rx.await;
    }

    /// Orderly shutdown : stop the ticker and signal tasks, wait out any
    /// in-flight submit, drain the buffer as far as the endpoint allows,
    /// and spill whatever remains to disk before returning.
    pub async fn shutdown( &self )
    {
      let ( done_tx, done_rx ) = oneshot::channel();
      if self.command_tx.send( Command::Shutdown( done_tx ) ).is_err()
      {
        return;
      }
      let _ = done_rx.await;
    }
  }

  #[ allow( clippy::too_many_arguments ) ]
  async fn run_actor
  (
    mut command_rx : mpsc::UnboundedReceiver< Command >,
    command_tx : mpsc::UnboundedSender< Command >,
    submitter : Submitter,
    spool : Spool,
    max_buffer_size : usize,
    batch_size : usize,
    max_event_bytes : usize,
    on_error : Option< crate::config::OnError >,
    lifecycle : LifecycleHandles,
  )
  {
    let mut buffer = EventBuffer::new( max_buffer_size );
    let recovery_path = spool.startup_recover( &mut buffer );

    let mut engine = FlushEngine::new( submitter, spool, batch_size, on_error );
    engine.set_recovery_path( recovery_path );

    let mut flushing = false;
    let mut flush_waiters : Vec< oneshot::Sender< () > > = Vec::new();
    // `true` once the shutdown-final flush attempt (step 4 of the orderly
    // sequence) has actually been issued, as opposed to still waiting out a
    // flush that was already in flight when `shutdown()` was called.
    let mut shutdown : Option< ( oneshot::Sender< () >, bool ) > = None;

    while let Some( command ) = command_rx.recv().await
    {
      match command
      {
        Command::Track( event ) =>
        {
          if let Some( admitted ) = event.admit( max_event_bytes )
          {
            let should_flush = buffer.append( admitted, batch_size );
            if should_flush && !flushing && shutdown.is_none()
            {
              start_submit( &mut engine, &mut buffer, &mut flushing, &command_tx );
            }
          }
        },
        Command::Tick =>
        {
          if !flushing && shutdown.is_none()
          {
            start_submit( &mut engine, &mut buffer, &mut flushing, &command_tx );
          }
        },
        Command::Flush( done ) =>
        {
          flush_waiters.push( done );
          if !flushing && shutdown.is_none()
          {
            start_submit( &mut engine, &mut buffer, &mut flushing, &command_tx );
          }
        },
        Command::FlushCompleted( batch, outcome ) =>
        {
          let result = engine.complete_attempt( &mut buffer, batch, outcome ).await;
          flushing = false;
          log_result( &result );

          for waiter in flush_waiters.drain( .. )
          {
            let _ = waiter.send( () );
          }

          match shutdown.take()
          {
            // The flush that just completed predates the shutdown request —
            // this is "await flushPromise" (step 3). Now issue the single
            // final flush attempt (step 4).
            Some( ( done, false ) ) =>
            {
              let finished = issue_shutdown_final_flush( &mut engine, &mut buffer, &command_tx, done, &mut shutdown, &mut flushing );
              if finished
              {
                lifecycle.abort();
                break;
              }
            },
            // The final flush attempt itself just completed (or was
            // skipped) — spill whatever remains and stop.
            Some( ( done, true ) ) =>
            {
              finish_shutdown( &mut engine, &mut buffer, done );
              lifecycle.abort();
              break;
            },
            None =>
            {
              let backing_off = matches!( result, FlushResult::BackingOff );
              if !buffer.is_empty() && !backing_off
              {
                start_submit( &mut engine, &mut buffer, &mut flushing, &command_tx );
              }
            },
          }
        },
        Command::Shutdown( done ) =>
        {
          lifecycle.abort();

          if flushing
          {
            // An unrelated flush is already in flight; wait for it (step 3)
            // before issuing the single shutdown-final attempt.
            shutdown = Some( ( done, false ) );
          }
          else
          {
            let finished = issue_shutdown_final_flush( &mut engine, &mut buffer, &command_tx, done, &mut shutdown, &mut flushing );
            if finished
            {
              break;
            }
          }
        },
        Command::ShutdownSync( done ) =>
        {
          // Never attempts an HTTP flush, even if one is already in flight —
          // the in-flight submit task is simply abandoned; its eventual
          // `FlushCompleted` will fail to send once this loop has exited.
          lifecycle.abort();
          finish_shutdown( &mut engine, &mut buffer, done );
          break;
        },
      }
    }
  }

  /// Issue the bounded, single shutdown-final flush attempt (step 4 of the
  /// orderly sequence).
  ///
  /// Returns `true` once shutdown has fully completed synchronously (empty
  /// buffer or still backing off — no attempt was needed), `false` if an
  /// attempt was spawned and `shutdown` was set with its `issued` flag
  /// raised so the next `FlushCompleted` finishes the sequence.
  fn issue_shutdown_final_flush
  (
    engine : &mut FlushEngine,
    buffer : &mut EventBuffer,
    command_tx : &mpsc::UnboundedSender< Command >,
    done : oneshot::Sender< () >,
    shutdown : &mut Option< ( oneshot::Sender< () >, bool ) >,
    flushing : &mut bool,
  ) -> bool
  {
    match engine.begin_attempt( buffer )
    {
      Begin::Blocked( result ) =>
      {
        log_result( &result );
        finish_shutdown( engine, buffer, done );
        true
      },
      Begin::Batch( batch ) =>
      {
        *flushing = true;
        *shutdown = Some( ( done, true ) );
        let submitter = engine.submitter();
        let reply_tx = command_tx.clone();
        tokio::spawn( async move
        {
          let outcome = submitter.submit( &batch ).await;
          let _ = reply_tx.send( Command::FlushCompleted( batch, outcome ) );
        } );
        false
      },
    }
  }

  fn start_submit( engine : &mut FlushEngine, buffer : &mut EventBuffer, flushing : &mut bool, command_tx : &mpsc::UnboundedSender< Command > )
  {
    let batch = match engine.begin_attempt( buffer )
    {
      Begin::Blocked( result ) =>
      {
        log_result( &result );
        return;
      },
      Begin::Batch( batch ) => batch,
    };

    *flushing = true;
    let submitter = engine.submitter();
    let reply_tx = command_tx.clone();

    tokio::spawn( async move
    {
      let outcome = submitter.submit( &batch ).await;
      let _ = reply_tx.send( Command::FlushCompleted( batch, outcome ) );
    } );
  }

  /// Drain whatever remains in the buffer straight to disk and resolve the
  /// waiter. Called only once the actor has confirmed no submit is still
  /// in flight, so there is no race between this synchronous spill and a
  /// background task's `complete_attempt`.
  fn finish_shutdown( engine : &mut FlushEngine, buffer : &mut EventBuffer, done : oneshot::Sender< () > )
  {
    let remaining = buffer.splice_all();
    if !remaining.is_empty()
    {
      if let Err( error ) = engine.spill_sync( &remaining )
      {
        tracing::warn!( %error, "failed to spill remaining events during shutdown" );
      }
    }
    let _ = done.send( () );
  }

  fn log_result( result : &FlushResult )
  {
    match result
    {
      FlushResult::Empty | FlushResult::BackingOff => {},
      FlushResult::Sent { count } => tracing::debug!( count, "flushed batch" ),
      FlushResult::Retrying { count, delay } => tracing::debug!( count, ?delay, "batch failed, retrying after backoff" ),
      FlushResult::Spilled { count, reason } => tracing::warn!( count, %reason, "batch spilled to disk" ),
    }
  }
}

crate::mod_interface!
{
  exposed use Client;
}
