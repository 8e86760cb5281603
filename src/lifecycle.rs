//! Periodic ticking and signal-driven shutdown (component 4.9 plumbing)
//!
//! Two background tasks run alongside the actor : a ticker that requests a
//! flush every `flush_interval`, and a signal listener that triggers the
//! orderly shutdown sequence on `SIGTERM`/`SIGINT`. Both are plain
//! `tokio::spawn`ed tasks holding an `AbortHandle` so [`crate::Client`] can
//! cancel them cleanly on an explicit `shutdown()` call, before the signal
//! ever fires.

mod private
{
  use std::time::Duration;
  use tokio::sync::mpsc::UnboundedSender;
  use tokio::task::AbortHandle;

  /// Commands the ticker/signal tasks send into the actor loop.
  #[ derive( Debug, Clone, Copy ) ]
  pub enum LifecycleSignal
  {
    /// The periodic interval elapsed; a flush should be attempted.
    Tick,
    /// `SIGTERM` or `SIGINT` was received; shutdown should begin.
    ShutdownRequested,
  }

  /// Handles to the two background tasks, so they can be aborted together.
  #[ derive( Debug ) ]
  pub struct LifecycleHandles
  {
    ticker : AbortHandle,
    signals : AbortHandle,
  }

  impl LifecycleHandles
  {
    /// Spawn the ticker and signal-listener tasks, wiring both into
    /// `sender`.
    #[ must_use ]
    pub fn spawn( flush_interval : Duration, sender : UnboundedSender< LifecycleSignal > ) -> Self
    {
      let ticker_sender = sender.clone();
      let ticker = tokio::spawn( async move
      {
        let mut interval = tokio::time::interval( flush_interval );
        interval.set_missed_tick_behavior( tokio::time::MissedTickBehavior::Delay );
        interval.tick().await; // first tick fires immediately; consume it without sending

        loop
        {
          interval.tick().await;
          if ticker_sender.send( LifecycleSignal::Tick ).is_err()
          {
            break;
          }
        }
      } ).abort_handle();

      let signal_sender = sender;
      let signals = tokio::spawn( async move
      {
        let mut sigterm = match tokio::signal::unix::signal( tokio::signal::unix::SignalKind::terminate() )
        {
          Ok( signal ) => signal,
          Err( error ) =>
          {
            tracing::warn!( %error, "failed to install SIGTERM handler" );
            return;
          },
        };
        let mut sigint = match tokio::signal::unix::signal( tokio::signal::unix::SignalKind::interrupt() )
        {
          Ok( signal ) => signal,
          Err( error ) =>
          {
            tracing::warn!( %error, "failed to install SIGINT handler" );
            return;
          },
        };

        tokio::select!
        {
          _ = sigterm.recv() => {},
          _ = sigint.recv() => {},
        }

        let _ = signal_sender.send( LifecycleSignal::ShutdownRequested );
      } ).abort_handle();

      Self { ticker, signals }
    }

    /// Abort both background tasks. Safe to call more than once.
    pub fn abort( &self )
    {
      self.ticker.abort();
      self.signals.abort();
    }
  }

  impl Drop for LifecycleHandles
  {
    fn drop( &mut self )
    {
      self.abort();
    }
  }
}

crate::mod_interface!
{
  exposed use LifecycleSignal;
  exposed use LifecycleHandles;
}
