use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use log::trace;

use crate::af::{AddressFamily, IPv4, IPv6};
use crate::errors::Error;
use crate::iterators::{AfHostIter, HostIter, SubnetIter};
use crate::synth_int::U256;

//------------ AfPrefix ------------------------------------------------------

/// A prefix of a single address family: an `(address, length)` pair with
/// every bit below the prefix length held at zero.
///
/// The derived order sorts by address first and breaks ties on the
/// length, shortest first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AfPrefix<AF: AddressFamily> {
    addr: AF,
    len: u8,
}

impl<AF: AddressFamily> AfPrefix<AF> {
    /// Creates the prefix, truncating the address to the length.
    pub(crate) fn new(addr: AF, len: u8) -> Self {
        AfPrefix {
            addr: addr.truncate_to_len(len),
            len,
        }
    }

    /// The network address.
    pub fn addr(&self) -> AF {
        self.addr
    }

    /// The prefix length in bits.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// The last address covered by the prefix.
    pub fn last(&self) -> AF {
        self.addr | AF::hostmask(self.len)
    }

    pub(crate) fn is_default_route(&self) -> bool {
        self.addr == AF::ZERO && self.len == 0
    }

    pub(crate) fn contains_addr(&self, i: AF) -> bool {
        self.addr == i & AF::netmask(self.len)
    }

    pub(crate) fn contains_prefix(&self, q: &Self) -> bool {
        self.len <= q.len && self.contains_addr(q.addr)
    }

    pub(crate) fn overlaps(&self, q: &Self) -> bool {
        self.contains_addr(q.addr)
            || self.contains_addr(q.last())
            || q.contains_addr(self.addr)
            || q.contains_addr(self.last())
    }

    /// Splits the prefix into its two one-bit-longer children.
    /// The prefix must be shorter than the family width.
    pub(crate) fn halves(&self) -> (Self, Self) {
        let len = self.len + 1;
        (
            AfPrefix { addr: self.addr, len },
            AfPrefix {
                addr: self.addr | AF::bit(self.len),
                len,
            },
        )
    }

    pub(crate) fn set(&mut self, addr: AF, len: u8) {
        self.addr = addr.truncate_to_len(len);
        self.len = len;
    }

    /// The minimal set of disjoint prefixes covering `self` minus `x`,
    /// by descending into the half that holds `x` and emitting the
    /// other half at every step.
    pub(crate) fn exclude(&self, x: &Self) -> Vec<Self> {
        if !self.contains_prefix(x) {
            return Vec::new();
        }
        if self == x {
            return vec![*x];
        }
        let mut subs = Vec::with_capacity(usize::from(x.len - self.len));
        let (mut l, mut r) = self.halves();
        while l != *x && r != *x {
            if l.contains_addr(x.addr) {
                subs.push(r);
                (l, r) = l.halves();
            } else if r.contains_addr(x.addr) {
                subs.push(l);
                (l, r) = r.halves();
            } else {
                unreachable!("neither half holds the excluded prefix");
            }
        }
        if l == *x {
            subs.push(r);
        } else {
            subs.push(l);
        }
        trace!(
            "excluded /{} from /{}, {} prefixes remain",
            x.len,
            self.len,
            subs.len()
        );
        subs
    }

    /// One NLRI record: the length octet, then just enough address bytes
    /// to carry the prefix bits.
    pub(crate) fn to_nlri(&self) -> Vec<u8> {
        let n = usize::from((self.len + 7) / 8);
        let mut b = Vec::with_capacity(1 + n);
        b.push(self.len);
        b.extend_from_slice(&self.addr.octets().as_ref()[..n]);
        b
    }

    /// The inverse of [`to_nlri`]; the buffer must be sized exactly.
    ///
    /// [`to_nlri`]: AfPrefix::to_nlri
    pub(crate) fn from_nlri(data: &[u8]) -> Result<Self, Error> {
        let (&len, rest) = data.split_first().ok_or(Error::InvalidArgument)?;
        if len > AF::BITS || rest.len() != usize::from((len + 7) / 8) {
            return Err(Error::InvalidArgument);
        }
        Ok(AfPrefix::new(AF::from_be_slice(rest), len))
    }
}

fn af_hosts<AF: AddressFamily>(p: &AfPrefix<AF>, begin: Option<AF>) -> Vec<AF> {
    if p.is_default_route() {
        return Vec::new();
    }
    let cur = begin.unwrap_or_else(|| p.addr());
    let mut hosts = Vec::new();
    let (ok, _) = AF::host_assignable(p.addr(), p.len(), cur);
    if ok && p.contains_addr(cur) {
        hosts.push(cur);
    }
    hosts.extend(AfHostIter::new(*p, cur));
    hosts
}

/// Folds an IPv4-mapped IPv6 address back to its IPv4 form; everything
/// else passes through untouched.
pub(crate) fn canon_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(a) => a.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        ip => ip,
    }
}

//------------ Prefix --------------------------------------------------------

/// An IP address prefix: an aligned block of addresses identified by a
/// network address and a prefix length, as described in RFC 4632 (IPv4)
/// and RFC 4291 (IPv6).
///
/// Prefixes are immutable values; construction truncates the address to
/// the prefix length, so the pair is always in canonical form. The two
/// families never mix: a binary operation between a V4 and a V6 prefix
/// compares unequal, does not overlap and contains nothing, rather than
/// failing.
///
/// The derived order is total across families (V4 before V6, then by
/// address, then by length ascending) and is the order every sorted
/// prefix list in this crate uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prefix {
    V4(AfPrefix<IPv4>),
    V6(AfPrefix<IPv6>),
}

impl Prefix {
    /// Creates a prefix from an address and a prefix length.
    ///
    /// An IPv4-mapped IPv6 address is folded to IPv4 first, so it takes
    /// the V4 length bound. A length beyond the family width is an
    /// [`Error::InvalidArgument`].
    pub fn new(ip: IpAddr, len: u8) -> Result<Prefix, Error> {
        match canon_ip(ip) {
            IpAddr::V4(a) => {
                if len > <IPv4 as AddressFamily>::BITS {
                    return Err(Error::InvalidArgument);
                }
                Ok(Prefix::V4(AfPrefix::new(IPv4::from_addr(a), len)))
            }
            IpAddr::V6(a) => {
                if len > <IPv6 as AddressFamily>::BITS {
                    return Err(Error::InvalidArgument);
                }
                Ok(Prefix::V6(AfPrefix::new(IPv6::from_addr(a), len)))
            }
        }
    }

    /// Like [`Prefix::new`], from the 4-byte or 16-byte address form.
    pub fn from_bytes(bytes: &[u8], len: u8) -> Result<Prefix, Error> {
        match bytes.len() {
            4 => {
                let b = <[u8; 4]>::try_from(bytes).expect("length checked");
                Prefix::new(IpAddr::from(b), len)
            }
            16 => {
                let b = <[u8; 16]>::try_from(bytes).expect("length checked");
                Prefix::new(IpAddr::from(b), len)
            }
            _ => Err(Error::InvalidArgument),
        }
    }

    /// The prefix length in bits.
    pub fn len(&self) -> u8 {
        match self {
            Prefix::V4(p) => p.len(),
            Prefix::V6(p) => p.len(),
        }
    }

    /// The network address.
    pub fn addr(&self) -> IpAddr {
        match self {
            Prefix::V4(p) => p.addr().into_ipaddr(),
            Prefix::V6(p) => p.addr().into_ipaddr(),
        }
    }

    /// The last address in the range of the prefix; the address itself
    /// for a full-width prefix.
    pub fn last_addr(&self) -> IpAddr {
        match self {
            Prefix::V4(p) => p.last().into_ipaddr(),
            Prefix::V6(p) => p.last().into_ipaddr(),
        }
    }

    /// The network mask of the prefix.
    pub fn netmask(&self) -> IpAddr {
        match self {
            Prefix::V4(p) => IPv4::netmask(p.len()).into_ipaddr(),
            Prefix::V6(p) => IPv6::netmask(p.len()).into_ipaddr(),
        }
    }

    /// The host mask, the inverse of the network mask.
    pub fn hostmask(&self) -> IpAddr {
        match self {
            Prefix::V4(p) => IPv4::hostmask(p.len()).into_ipaddr(),
            Prefix::V6(p) => IPv6::hostmask(p.len()).into_ipaddr(),
        }
    }

    /// The directed broadcast address of an IPv4 prefix. `None` for a
    /// full-width prefix, and for IPv6, which has no broadcast.
    pub fn broadcast_addr(&self) -> Option<IpAddr> {
        match self {
            Prefix::V4(p) if p.len() < 32 => Some(p.last().into_ipaddr()),
            _ => None,
        }
    }

    /// Whether this is `0.0.0.0/0` or `::/0`.
    pub fn is_default_route(&self) -> bool {
        match self {
            Prefix::V4(p) => p.is_default_route(),
            Prefix::V6(p) => p.is_default_route(),
        }
    }

    /// The number of addresses covered by the prefix, `2^(width - len)`.
    pub fn num_addr(&self) -> U256 {
        match self {
            Prefix::V4(p) => U256::power_of_two(<IPv4 as AddressFamily>::BITS - p.len()),
            Prefix::V6(p) => U256::power_of_two(<IPv6 as AddressFamily>::BITS - p.len()),
        }
    }

    /// Extracts `len` bits of the address starting at bit `pos` (0 is
    /// the MSB), right-aligned in a 32-bit word. Out-of-range positions
    /// or widths yield 0.
    pub fn bits(&self, pos: u8, len: u8) -> u32 {
        match self {
            Prefix::V4(p) => p.addr().bits(pos, len),
            Prefix::V6(p) => p.addr().bits(pos, len),
        }
    }

    /// Whether the prefix includes the given address. An address of the
    /// other family is never included.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self, canon_ip(ip)) {
            (Prefix::V4(p), IpAddr::V4(a)) => p.contains_addr(IPv4::from_addr(a)),
            (Prefix::V6(p), IpAddr::V6(a)) => p.contains_addr(IPv6::from_addr(a)),
            _ => false,
        }
    }

    /// Whether the prefix includes the whole of `q`.
    pub fn contains_prefix(&self, q: &Prefix) -> bool {
        match (self, q) {
            (Prefix::V4(p), Prefix::V4(q)) => p.contains_prefix(q),
            (Prefix::V6(p), Prefix::V6(q)) => p.contains_prefix(q),
            _ => false,
        }
    }

    /// Whether the two prefixes share any address.
    pub fn overlaps(&self, q: &Prefix) -> bool {
        match (self, q) {
            (Prefix::V4(p), Prefix::V4(q)) => p.overlaps(q),
            (Prefix::V6(p), Prefix::V6(q)) => p.overlaps(q),
            _ => false,
        }
    }

    /// Splits the prefix into `2^n` equal child prefixes, `n` bits
    /// longer each, in ascending address order. Empty when the children
    /// would be longer than the family width.
    pub fn subnets(&self, n: u8) -> Vec<Prefix> {
        if u16::from(self.len()) + u16::from(n) > u16::from(self.width()) {
            return Vec::new();
        }
        // Preallocate only for modest splits; bigger ones stream through
        // the iterator into the result.
        let mut subs = if n < 17 {
            Vec::with_capacity(1 << n)
        } else {
            Vec::new()
        };
        subs.extend(self.subnet_iter(n));
        subs
    }

    /// Lazy variant of [`Prefix::subnets`].
    pub fn subnet_iter(&self, n: u8) -> SubnetIter {
        SubnetIter::new(self, n)
    }

    /// The addresses of the prefix that are assignable to hosts, nodes
    /// that are not routers or other intermediate systems, beginning at
    /// `begin` (the prefix address when `None`).
    ///
    /// For IPv4 the network address and the directed broadcast are not
    /// assignable, and the limited broadcast only belongs to the default
    /// route; for IPv6 only the subnet-router anycast address is held
    /// back. A default route yields nothing. Multicast addresses are not
    /// distinguished from unicast here.
    ///
    /// Note that this materializes the whole list; shorter prefixes are
    /// better served by [`Prefix::host_iter`].
    pub fn hosts(&self, begin: Option<IpAddr>) -> Vec<IpAddr> {
        let begin = begin.map(canon_ip);
        match self {
            Prefix::V4(p) => {
                let begin = match begin {
                    None => None,
                    Some(IpAddr::V4(a)) => Some(IPv4::from_addr(a)),
                    Some(_) => return Vec::new(),
                };
                af_hosts(p, begin)
                    .into_iter()
                    .map(AddressFamily::into_ipaddr)
                    .collect()
            }
            Prefix::V6(p) => {
                let begin = match begin {
                    None => None,
                    Some(IpAddr::V6(a)) => Some(IPv6::from_addr(a)),
                    Some(_) => return Vec::new(),
                };
                af_hosts(p, begin)
                    .into_iter()
                    .map(AddressFamily::into_ipaddr)
                    .collect()
            }
        }
    }

    /// Iterates over the host-assignable addresses strictly after
    /// `first` (the prefix address when `None`), under the same rules as
    /// [`Prefix::hosts`].
    pub fn host_iter(&self, first: Option<IpAddr>) -> HostIter {
        HostIter::new(self, first.map(canon_ip))
    }

    /// The minimal set of disjoint prefixes whose union is `self` minus
    /// `x`. Empty unless `x` lies within `self`; when `x` equals `self`
    /// the result is `[x]` rather than the empty set.
    pub fn exclude(&self, x: &Prefix) -> Vec<Prefix> {
        match (self, x) {
            (Prefix::V4(p), Prefix::V4(x)) => {
                p.exclude(x).into_iter().map(Prefix::V4).collect()
            }
            (Prefix::V6(p), Prefix::V6(x)) => {
                p.exclude(x).into_iter().map(Prefix::V6).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Replaces the address and prefix length of the holder, truncating
    /// the address to the length. The family follows the new address.
    pub fn set(&mut self, ip: IpAddr, len: u8) -> Result<(), Error> {
        *self = Prefix::new(ip, len)?;
        Ok(())
    }

    /// The BGP NLRI binary form of the prefix: the length octet followed
    /// by just enough address bytes to carry the prefix bits.
    pub fn to_binary(&self) -> Vec<u8> {
        match self {
            Prefix::V4(p) => p.to_nlri(),
            Prefix::V6(p) => p.to_nlri(),
        }
    }

    /// Replaces the holder with the prefix decoded from one exactly
    /// sized NLRI record, keeping the holder's family.
    pub fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), Error> {
        match self {
            Prefix::V4(p) => *p = AfPrefix::from_nlri(data)?,
            Prefix::V6(p) => *p = AfPrefix::from_nlri(data)?,
        }
        Ok(())
    }

    fn width(&self) -> u8 {
        match self {
            Prefix::V4(_) => <IPv4 as AddressFamily>::BITS,
            Prefix::V6(_) => <IPv6 as AddressFamily>::BITS,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.len())
    }
}

impl FromStr for Prefix {
    type Err = Error;

    /// Parses the canonical `address/length` form; the address decides
    /// the family. The address is truncated to the length.
    fn from_str(s: &str) -> Result<Self, Error> {
        let (addr, len) = s.split_once('/').ok_or(Error::InvalidArgument)?;
        let ip: IpAddr = addr.parse().map_err(|_| Error::InvalidArgument)?;
        let len: u8 = len.parse().map_err(|_| Error::InvalidArgument)?;
        Prefix::new(ip, len)
    }
}

//------------ serde ---------------------------------------------------------

#[cfg(feature = "serde")]
impl serde::Serialize for Prefix {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Prefix {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        struct PrefixVisitor;

        impl serde::de::Visitor<'_> for PrefixVisitor {
            type Value = Prefix;

            fn expecting(
                &self,
                formatter: &mut fmt::Formatter,
            ) -> fmt::Result {
                formatter.write_str("an address/length prefix string")
            }

            fn visit_str<E: serde::de::Error>(
                self,
                v: &str,
            ) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(PrefixVisitor)
    }
}
