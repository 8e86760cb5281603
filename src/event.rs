//! The `RequestEvent` data model and the Size Enforcer (component 4.4)

mod private
{
  use serde::{ Deserialize, Serialize };
  use serde_json::{ Map, Value };

  const MAX_METHOD_BYTES : usize = 16;
  const MAX_PATH_BYTES : usize = 2048;
  const MAX_CONSUMER_ID_BYTES : usize = 256;

  /// A single request-observation record.
  ///
  /// Created by the framework adapter, mutated only by the Size Enforcer
  /// (field truncation, metadata stripping), and destroyed on successful
  /// ingest or on spill to disk.
  #[ derive( Debug, Clone, PartialEq, Serialize, Deserialize ) ]
  pub struct RequestEvent
  {
    /// HTTP method, truncated to 16 bytes.
    pub method : String,
    /// Request path, truncated to 2048 bytes.
    pub path : String,
    /// Response status code.
    pub status_code : u16,
    /// Response time in milliseconds.
    pub response_time_ms : f64,
    /// Request size in bytes.
    pub request_size : u64,
    /// Response size in bytes.
    pub response_size : u64,
    /// Caller-supplied consumer identifier, truncated to 256 bytes.
    #[ serde( skip_serializing_if = "Option::is_none", default ) ]
    pub consumer_id : Option< String >,
    /// Arbitrary structured metadata, dropped by the Size Enforcer when the
    /// event is over budget.
    #[ serde( skip_serializing_if = "Option::is_none", default ) ]
    pub metadata : Option< Map< String, Value > >,
    /// ISO-8601 timestamp, produced by the adapter and passed through
    /// untouched.
    pub timestamp : String,
  }

  impl RequestEvent
  {
    fn truncate_bytes( s : &mut String, max_bytes : usize )
    {
      if s.len() <= max_bytes
      {
        return;
      }

      let mut cut = max_bytes;
      while cut > 0 && !s.is_char_boundary( cut )
      {
        cut -= 1;
      }
      s.truncate( cut );
    }

    /// Coerce field caps (`method`, `path`, `consumer_id`) in place.
    fn truncate_fields( &mut self )
    {
      Self::truncate_bytes( &mut self.method, MAX_METHOD_BYTES );
      Self::truncate_bytes( &mut self.path, MAX_PATH_BYTES );
      if let Some( consumer_id ) = self.consumer_id.as_mut()
      {
        Self::truncate_bytes( consumer_id, MAX_CONSUMER_ID_BYTES );
      }
    }

    /// Run the Size Enforcer over `self`, consuming it.
    ///
    /// Truncates `method`/`path`/`consumer_id` to their fixed caps. If
    /// `metadata` is present and the serialized event exceeds
    /// `max_event_bytes`, `metadata` is dropped and the size is rechecked;
    /// if it is still over budget the event itself is dropped. Events
    /// without `metadata` are never size-checked. Never panics — admission
    /// failures are logged and the event is simply not returned.
    #[ must_use ]
    pub fn admit( mut self, max_event_bytes : usize ) -> Option< Self >
    {
      self.truncate_fields();

      if self.metadata.is_none()
      {
        return Some( self );
      }

      let Ok( serialized_len ) = serde_json::to_vec( &self ).map( | v | v.len() ) else
      {
        tracing::debug!( "dropping event : failed to serialize for size check" );
        return None;
      };

      if serialized_len <= max_event_bytes
      {
        return Some( self );
      }

      tracing::debug!( serialized_len, max_event_bytes, "event over size budget, dropping metadata" );
      self.metadata = None;

      match serde_json::to_vec( &self )
      {
        Ok( bytes ) if bytes.len() <= max_event_bytes => Some( self ),
        Ok( bytes ) =>
        {
          tracing::debug!( len = bytes.len(), max_event_bytes, "event still over size budget after dropping metadata, dropping event" );
          None
        },
        Err( _ ) =>
        {
          tracing::debug!( "dropping event : failed to serialize after dropping metadata" );
          None
        },
      }
    }
  }
}

crate::mod_interface!
{
  exposed use RequestEvent;
}
