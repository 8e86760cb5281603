use super::*;

fn sample_event( path : &str ) -> the_module::RequestEvent
{
  the_module::RequestEvent
  {
    method : "GET".to_string(),
    path : path.to_string(),
    status_code : 200,
    response_time_ms : 1.0,
    request_size : 0,
    response_size : 0,
    consumer_id : None,
    metadata : None,
    timestamp : "2026-07-28T00:00:00Z".to_string(),
  }
}

#[ test ]
fn append_signals_once_batch_size_is_reached()
{
  let mut buffer = the_module::EventBuffer::new( 10 );
  assert!( !buffer.append( sample_event( "/a" ), 2 ) );
  assert!( buffer.append( sample_event( "/b" ), 2 ) );
  assert_eq!( buffer.len(), 2 );
}

#[ test ]
fn append_drops_events_once_at_capacity()
{
  let mut buffer = the_module::EventBuffer::new( 1 );
  buffer.append( sample_event( "/a" ), 10 );
  assert!( !buffer.append( sample_event( "/b" ), 10 ), "buffer is full, second event is dropped" );
  assert_eq!( buffer.len(), 1 );
}

#[ test ]
fn drain_front_removes_in_fifo_order()
{
  let mut buffer = the_module::EventBuffer::new( 10 );
  buffer.append( sample_event( "/a" ), 10 );
  buffer.append( sample_event( "/b" ), 10 );
  buffer.append( sample_event( "/c" ), 10 );

  let drained = buffer.drain_front( 2 );
  assert_eq!( drained.len(), 2 );
  assert_eq!( drained[ 0 ].path, "/a" );
  assert_eq!( drained[ 1 ].path, "/b" );
  assert_eq!( buffer.len(), 1 );
}

#[ test ]
fn prepend_front_restores_order_ahead_of_newer_events()
{
  let mut buffer = the_module::EventBuffer::new( 10 );
  buffer.append( sample_event( "/newer" ), 10 );

  buffer.prepend_front( vec![ sample_event( "/older-1" ), sample_event( "/older-2" ) ] );

  let all = buffer.splice_all();
  assert_eq!( all.len(), 3 );
  assert_eq!( all[ 0 ].path, "/older-1" );
  assert_eq!( all[ 1 ].path, "/older-2" );
  assert_eq!( all[ 2 ].path, "/newer" );
}

#[ test ]
fn prepend_front_drops_oldest_of_the_retried_batch_when_capacity_is_insufficient()
{
  let mut buffer = the_module::EventBuffer::new( 2 );
  buffer.append( sample_event( "/newer" ), 10 );

  buffer.prepend_front( vec![ sample_event( "/older-1" ), sample_event( "/older-2" ) ] );

  let all = buffer.splice_all();
  assert_eq!( all.len(), 2, "only one slot of capacity remained" );
  assert_eq!( all[ 0 ].path, "/older-1" );
  assert_eq!( all[ 1 ].path, "/newer" );
}

#[ test ]
fn splice_all_empties_the_buffer()
{
  let mut buffer = the_module::EventBuffer::new( 10 );
  buffer.append( sample_event( "/a" ), 10 );
  buffer.append( sample_event( "/b" ), 10 );

  let all = buffer.splice_all();
  assert_eq!( all.len(), 2 );
  assert!( buffer.is_empty() );
}
