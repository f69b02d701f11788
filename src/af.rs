use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Maximum length of an IPv4 address prefix in bits.
pub const IPV4_PREFIX_LEN: u8 = 32;

/// Maximum length of an IPv6 address prefix in bits.
pub const IPV6_PREFIX_LEN: u8 = 128;

//------------ AddressFamily (trait) ----------------------------------------

/// The address family of an IP address as a trait.
///
/// Each family is represented by the unsigned integer that exactly fits
/// its addresses, in network byte order: `u32` for IPv4 and `u128` for
/// IPv6. The prefix algorithms in this crate are written once, generically
/// over this trait, and routed to the right family by the [`Prefix`]
/// enum.
///
/// [`Prefix`]: crate::Prefix
pub trait AddressFamily:
    Copy
    + std::fmt::Debug
    + std::hash::Hash
    + Eq
    + Ord
    + std::ops::BitAnd<Output = Self>
    + std::ops::BitOr<Output = Self>
    + std::ops::BitXor<Output = Self>
    + std::ops::Not<Output = Self>
{
    /// The number of bits in an address of the family.
    const BITS: u8;
    /// The all-zeros address.
    const ZERO: Self;
    /// The all-ones address.
    const MAX: Self;

    /// The `std::net` address type of the family.
    type Addr: Copy + Into<IpAddr>;

    /// The big-endian byte form of an address.
    type Octets: AsRef<[u8]>;

    fn from_addr(addr: Self::Addr) -> Self;

    fn to_addr(self) -> Self::Addr;

    fn into_ipaddr(self) -> IpAddr {
        self.to_addr().into()
    }

    /// The mask with `len` leading ones.
    fn netmask(len: u8) -> Self;

    /// The inverse of [`netmask`]: `len` leading zeros, ones below.
    ///
    /// [`netmask`]: AddressFamily::netmask
    fn hostmask(len: u8) -> Self {
        !Self::netmask(len)
    }

    /// Zeros every bit below `len`. Interpreted as a prefix address, this
    /// truncates self to the given prefix length.
    fn truncate_to_len(self, len: u8) -> Self {
        self & Self::netmask(len)
    }

    /// The address with only the bit at `pos` set, counting from the
    /// most significant bit.
    fn bit(pos: u8) -> Self;

    /// Extracts `len` bits starting at `pos` (0 is the MSB), shifted to
    /// the right. Out-of-range positions or widths yield 0.
    fn bits(self, pos: u8, len: u8) -> u32;

    fn leading_zeros(self) -> u8;

    fn wrapping_incr(self) -> Self;

    fn octets(self) -> Self::Octets;

    /// Rebuilds an address from up to `BITS / 8` big-endian bytes; the
    /// missing tail is taken to be zero.
    fn from_be_slice(b: &[u8]) -> Self;

    /// The host-assignability rule of the family for an address `i`
    /// inside the prefix `(net, len)`. Returns `(assignable, last)`,
    /// where `last` marks the end of the enumerable range.
    fn host_assignable(net: Self, len: u8, i: Self) -> (bool, bool);
}

//-------------- Ipv4 Type --------------------------------------------------

/// Exactly fitting IPv4 bytes (4 octets).
pub type IPv4 = u32;

impl AddressFamily for IPv4 {
    const BITS: u8 = IPV4_PREFIX_LEN;
    const ZERO: u32 = 0;
    const MAX: u32 = u32::MAX;

    type Addr = Ipv4Addr;
    type Octets = [u8; 4];

    fn from_addr(addr: Ipv4Addr) -> u32 {
        addr.into()
    }

    fn to_addr(self) -> Ipv4Addr {
        Ipv4Addr::from(self)
    }

    // You can't shift by the full number of bits of self, so the edges
    // get their own arms.
    fn netmask(len: u8) -> u32 {
        match len {
            0 => 0,
            1..=31 => u32::MAX << (32 - len),
            _ => u32::MAX,
        }
    }

    fn bit(pos: u8) -> u32 {
        1 << (31 - pos)
    }

    fn bits(self, pos: u8, len: u8) -> u32 {
        if pos > 31 || len > 32 {
            return 0;
        }
        (self << pos).checked_shr(u32::from(32 - len)).unwrap_or(0)
    }

    fn leading_zeros(self) -> u8 {
        u32::leading_zeros(self) as u8
    }

    fn wrapping_incr(self) -> u32 {
        self.wrapping_add(1)
    }

    fn octets(self) -> [u8; 4] {
        self.to_be_bytes()
    }

    fn from_be_slice(b: &[u8]) -> u32 {
        let mut bytes = [0; 4];
        bytes[..b.len()].copy_from_slice(b);
        u32::from_be_bytes(bytes)
    }

    // The limited broadcast ends every enumeration and is assignable on
    // the default route only. A full-width prefix is its own single
    // assignable address. Below that, the directed broadcast and the
    // network address are excluded.
    fn host_assignable(net: u32, len: u8, i: u32) -> (bool, bool) {
        if i == u32::MAX {
            return (net == 0 && len == 0, true);
        }
        if len == 32 {
            return (true, true);
        }
        if i == net | Self::hostmask(len) {
            return (false, true);
        }
        if i == net {
            return (false, false);
        }
        (true, false)
    }
}

//-------------- Ipv6 Type --------------------------------------------------

/// Exactly fitting IPv6 bytes (16 octets).
pub type IPv6 = u128;

impl AddressFamily for IPv6 {
    const BITS: u8 = IPV6_PREFIX_LEN;
    const ZERO: u128 = 0;
    const MAX: u128 = u128::MAX;

    type Addr = Ipv6Addr;
    type Octets = [u8; 16];

    fn from_addr(addr: Ipv6Addr) -> u128 {
        addr.into()
    }

    fn to_addr(self) -> Ipv6Addr {
        Ipv6Addr::from(self)
    }

    fn netmask(len: u8) -> u128 {
        match len {
            0 => 0,
            1..=127 => u128::MAX << (128 - len),
            _ => u128::MAX,
        }
    }

    fn bit(pos: u8) -> u128 {
        1 << (127 - pos)
    }

    fn bits(self, pos: u8, len: u8) -> u32 {
        if pos > 127 || len > 32 {
            return 0;
        }
        (self << pos)
            .checked_shr(u32::from(128 - len))
            .unwrap_or(0) as u32
    }

    fn leading_zeros(self) -> u8 {
        u128::leading_zeros(self) as u8
    }

    fn wrapping_incr(self) -> u128 {
        self.wrapping_add(1)
    }

    fn octets(self) -> [u8; 16] {
        self.to_be_bytes()
    }

    fn from_be_slice(b: &[u8]) -> u128 {
        let mut bytes = [0; 16];
        bytes[..b.len()].copy_from_slice(b);
        u128::from_be_bytes(bytes)
    }

    // The all-ones host part is a regular assignable address in IPv6 and
    // closes the range; the all-zeros host part is the subnet-router
    // anycast address (RFC 4291) on anything shorter than a full-width
    // prefix.
    fn host_assignable(net: u128, len: u8, i: u128) -> (bool, bool) {
        if i == net | Self::hostmask(len) {
            return (true, true);
        }
        if len < 128 && i == net {
            return (false, false);
        }
        (true, false)
    }
}
