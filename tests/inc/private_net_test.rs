use super::*;

#[ test ]
fn cgnat_boundary_is_private_just_inside_range()
{
  assert!( the_module::is_private_address_str( "100.127.255.255" ) );
}

#[ test ]
fn cgnat_boundary_is_public_just_outside_range()
{
  assert!( !the_module::is_private_address_str( "100.128.0.1" ) );
}

#[ test ]
fn ipv4_mapped_ipv6_inherits_ipv4_classification()
{
  assert!( the_module::is_private_address_str( "::ffff:10.0.0.1" ) );
  assert!( !the_module::is_private_address_str( "::ffff:1.1.1.1" ) );
}

#[ test ]
fn loopback_v6_is_private()
{
  assert!( the_module::is_private_address_str( "::1" ) );
}

#[ test ]
fn ordinary_public_addresses_are_not_private()
{
  assert!( !the_module::is_private_address_str( "8.8.8.8" ) );
  assert!( !the_module::is_private_address_str( "2606:4700:4700::1111" ) );
}

#[ test ]
fn hostnames_never_classify_as_private()
{
  assert!( !the_module::is_private_address_str( "internal.corp.example" ) );
  assert!( !the_module::is_private_address_str( "localhost" ) );
}

#[ test ]
fn rfc1918_and_link_local_ranges_are_private()
{
  assert!( the_module::is_private_address_str( "10.1.2.3" ) );
  assert!( the_module::is_private_address_str( "172.16.0.1" ) );
  assert!( !the_module::is_private_address_str( "172.32.0.1" ) );
  assert!( the_module::is_private_address_str( "192.168.1.1" ) );
  assert!( the_module::is_private_address_str( "169.254.1.1" ) );
  assert!( the_module::is_private_address_str( "fc00::1" ) );
  assert!( the_module::is_private_address_str( "fe80::1" ) );
}
