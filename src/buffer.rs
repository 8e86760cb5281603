//! The bounded in-memory Event Buffer (component 4.5)

mod private
{
  use crate::event::RequestEvent;
  use std::collections::VecDeque;

  /// A capacity-bounded, ordered sequence of events.
  ///
  /// `append` never blocks and never fails visibly — once the buffer is at
  /// capacity, further appends are simply refused and the event is dropped
  /// by the caller (back-pressure favors freshness over completeness, see
  /// the prepend-capacity rule below).
  #[ derive( Debug, Default ) ]
  pub struct EventBuffer
  {
    events : VecDeque< RequestEvent >,
    max_len : usize,
  }

  impl EventBuffer
  {
    /// Create an empty buffer bounded at `max_len`.
    #[ must_use ]
    pub fn new( max_len : usize ) -> Self
    {
      Self { events : VecDeque::new(), max_len }
    }

    /// Current number of buffered events.
    #[ must_use ]
    pub fn len( &self ) -> usize
    {
      self.events.len()
    }

    /// Whether the buffer holds no events.
    #[ must_use ]
    pub fn is_empty( &self ) -> bool
    {
      self.events.is_empty()
    }

    /// Append one event to the back.
    ///
    /// Returns `true` if the buffer is now at or above `batch_size` and a
    /// flush should be scheduled; returns `false` (and silently drops the
    /// event) if the buffer was already at capacity.
    pub fn append( &mut self, event : RequestEvent, batch_size : usize ) -> bool
    {
      if self.events.len() >= self.max_len
      {
        tracing::debug!( max_len = self.max_len, "event buffer full, dropping event" );
        return false;
      }

      self.events.push_back( event );
      self.events.len() >= batch_size
    }

    /// Push one event to the back without a threshold check, used only by
    /// startup recovery. Returns `false` (without pushing) once capacity is
    /// reached, which stops the recovery loop from growing the buffer past
    /// `max_len`.
    pub( crate ) fn try_push( &mut self, event : RequestEvent ) -> bool
    {
      if self.events.len() >= self.max_len
      {
        return false;
      }

      self.events.push_back( event );
      true
    }

    /// Remove and return up to `n` events from the front.
    pub fn drain_front( &mut self, n : usize ) -> Vec< RequestEvent >
    {
      let n = n.min( self.events.len() );
      self.events.drain( ..n ).collect()
    }

    /// Re-insert `events` at the front, respecting remaining capacity.
    ///
    /// Excess events (beyond `max_len - len()`) are dropped in favor of the
    /// newer events already in the buffer — back-pressure favors freshness.
    /// This is a single bulk operation: it never recurses per element, so a
    /// large failed batch cannot blow the stack.
    pub fn prepend_front( &mut self, mut events : Vec< RequestEvent > )
    {
      let remaining_capacity = self.max_len.saturating_sub( self.events.len() );

      if events.len() > remaining_capacity
      {
        let dropped = events.len() - remaining_capacity;
        tracing::debug!( dropped, "buffer capacity insufficient for retried batch, dropping newest of the retried events" );
        events.truncate( remaining_capacity );
      }

      for event in events.into_iter().rev()
      {
        self.events.push_front( event );
      }
    }

    /// Remove and return every buffered event.
    pub fn splice_all( &mut self ) -> Vec< RequestEvent >
    {
      self.events.drain( .. ).collect()
    }
  }
}

crate::mod_interface!
{
  exposed use EventBuffer;
}
