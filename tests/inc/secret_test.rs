use super::*;

#[ test ]
fn empty_api_key_is_rejected()
{
  let result = the_module::ClientConfig::builder( "https://telemetry.example.com/ingest", "" ).build();
  assert!( result.is_err() );
}

#[ test ]
fn api_key_with_embedded_newline_is_rejected()
{
  let result = the_module::ClientConfig::builder( "https://telemetry.example.com/ingest", "key\nwith-newline" ).build();
  assert!( result.is_err() );
}

#[ test ]
fn api_key_with_embedded_carriage_return_is_rejected()
{
  let result = the_module::ClientConfig::builder( "https://telemetry.example.com/ingest", "key\rwith-cr" ).build();
  assert!( result.is_err() );
}

#[ test ]
fn api_key_with_embedded_nul_is_rejected()
{
  let result = the_module::ClientConfig::builder( "https://telemetry.example.com/ingest", "key\0with-nul" ).build();
  assert!( result.is_err() );
}

#[ test ]
fn ordinary_api_key_is_accepted()
{
  let result = the_module::ClientConfig::builder( "https://telemetry.example.com/ingest", "sk-telemetry-abc123" ).build();
  assert!( result.is_ok() );
}

#[ test ]
fn api_key_debug_output_is_redacted()
{
  let config = the_module::ClientConfig::builder( "https://telemetry.example.com/ingest", "super-secret-value" )
    .build()
    .expect( "valid configuration" );

  let debug_output = format!( "{config:?}" );
  assert!( !debug_output.contains( "super-secret-value" ) );
}
