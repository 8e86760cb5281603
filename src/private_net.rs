//! Private/reserved address predicate used by the Endpoint Validator and the
//! Resolving Dialer.
//!
//! Non-IP strings (hostnames) are never considered private by this
//! predicate — a hostname's reputation is established by what it *resolves
//! to*, not by its name.

mod private
{
  use std::net::{ IpAddr, Ipv4Addr, Ipv6Addr };

  /// Returns `true` if `addr` falls in a private, loopback, link-local, or
  /// carrier-grade-NAT range.
  ///
  /// Covers : `127.0.0.0/8`, `10.0.0.0/8`, `172.16.0.0/12`, `192.168.0.0/16`,
  /// `169.254.0.0/16`, `100.64.0.0/10` (CGNAT), `0.0.0.0/8`, IPv6 `::1`,
  /// `fc00::/7` (ULA), `fe80::/10` (link-local), and any IPv4-mapped IPv6
  /// address whose embedded IPv4 address matches one of the above.
  #[ must_use ]
  pub fn is_private_address( addr : IpAddr ) -> bool
  {
    match addr
    {
      IpAddr::V4( v4 ) => is_private_v4( v4 ),
      IpAddr::V6( v6 ) => is_private_v6( v6 ),
    }
  }

  /// Same predicate over a textual IP form. Returns `false` for anything
  /// that does not parse as an IP address (hostnames are not private by
  /// virtue of their name).
  #[ must_use ]
  pub fn is_private_address_str( text : &str ) -> bool
  {
    text.parse::< IpAddr >().is_ok_and( is_private_address )
  }

  fn is_private_v4( v4 : Ipv4Addr ) -> bool
  {
    let octets = v4.octets();

    // 100.64.0.0/10 : second octet in 64..=127
    let is_cgnat = octets[ 0 ] == 100 && ( 64..=127 ).contains( &octets[ 1 ] );

    v4.is_loopback()               // 127.0.0.0/8
      || octets[ 0 ] == 10          // 10.0.0.0/8
      || ( octets[ 0 ] == 172 && ( 16..=31 ).contains( &octets[ 1 ] ) ) // 172.16.0.0/12
      || ( octets[ 0 ] == 192 && octets[ 1 ] == 168 )                  // 192.168.0.0/16
      || ( octets[ 0 ] == 169 && octets[ 1 ] == 254 )                  // 169.254.0.0/16
      || is_cgnat
      || octets[ 0 ] == 0           // 0.0.0.0/8
  }

  fn is_private_v6( v6 : Ipv6Addr ) -> bool
  {
    if let Some( mapped ) = v6.to_ipv4_mapped()
    {
      return is_private_v4( mapped );
    }

    let segments = v6.segments();

    v6.is_loopback()                          // ::1
      || ( segments[ 0 ] & 0xfe00 ) == 0xfc00  // fc00::/7 (ULA)
      || ( segments[ 0 ] & 0xffc0 ) == 0xfe80  // fe80::/10 (link-local)
  }
}

crate::mod_interface!
{
  exposed use is_private_address;
  exposed use is_private_address_str;
}
