// The lazy halves of host and subnet enumeration. Both walk strictly
// ascending, never past the last address of the prefix, and are
// restartable only by constructing a fresh iterator. The public types
// wrap a per-family generic iterator and dispatch `next` per variant.

use std::net::IpAddr;

use crate::af::{AddressFamily, IPv4, IPv6};
use crate::prefix::{AfPrefix, Prefix};

//------------ HostIter ------------------------------------------------------

pub(crate) struct AfHostIter<AF: AddressFamily> {
    prefix: AfPrefix<AF>,
    cur: AF,
}

impl<AF: AddressFamily> AfHostIter<AF> {
    /// Starts right after `cur`; `cur` itself is never yielded.
    pub(crate) fn new(prefix: AfPrefix<AF>, cur: AF) -> Self {
        AfHostIter { prefix, cur }
    }
}

impl<AF: AddressFamily> Iterator for AfHostIter<AF> {
    type Item = AF;

    fn next(&mut self) -> Option<AF> {
        loop {
            if !self.prefix.contains_addr(self.cur) {
                return None;
            }
            let (_, last) =
                AF::host_assignable(self.prefix.addr(), self.prefix.len(), self.cur);
            if last {
                return None;
            }
            self.cur = self.cur.wrapping_incr();
            let (ok, _) =
                AF::host_assignable(self.prefix.addr(), self.prefix.len(), self.cur);
            if ok {
                return Some(self.cur);
            }
        }
    }
}

enum HostIterInner {
    V4(AfHostIter<IPv4>),
    V6(AfHostIter<IPv6>),
    Done,
}

/// Iterator over the host-assignable addresses of a prefix, strictly
/// after its starting address. Returned by [`Prefix::host_iter`].
pub struct HostIter {
    inner: HostIterInner,
}

impl HostIter {
    pub(crate) fn new(prefix: &Prefix, first: Option<IpAddr>) -> Self {
        let inner = match (prefix, first) {
            (Prefix::V4(p), None) => {
                HostIterInner::V4(AfHostIter::new(*p, p.addr()))
            }
            (Prefix::V4(p), Some(IpAddr::V4(a))) => {
                HostIterInner::V4(AfHostIter::new(*p, IPv4::from_addr(a)))
            }
            (Prefix::V6(p), None) => {
                HostIterInner::V6(AfHostIter::new(*p, p.addr()))
            }
            (Prefix::V6(p), Some(IpAddr::V6(a))) => {
                HostIterInner::V6(AfHostIter::new(*p, IPv6::from_addr(a)))
            }
            _ => HostIterInner::Done,
        };
        HostIter { inner }
    }
}

impl Iterator for HostIter {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        match &mut self.inner {
            HostIterInner::V4(iter) => iter.next().map(AddressFamily::into_ipaddr),
            HostIterInner::V6(iter) => iter.next().map(AddressFamily::into_ipaddr),
            HostIterInner::Done => None,
        }
    }
}

//------------ SubnetIter ----------------------------------------------------

pub(crate) struct AfSubnetIter<AF: AddressFamily> {
    parent_last: AF,
    mask: AF, // host mask of the child length
    child_len: u8,
    cur: AF,
    started: bool,
    live: bool,
}

impl<AF: AddressFamily> AfSubnetIter<AF> {
    pub(crate) fn new(p: &AfPrefix<AF>, n: u8) -> Self {
        let live = u16::from(p.len()) + u16::from(n) <= u16::from(AF::BITS);
        let child_len = if live { p.len() + n } else { AF::BITS };
        AfSubnetIter {
            parent_last: p.last(),
            mask: AF::hostmask(child_len),
            child_len,
            cur: p.addr(),
            started: false,
            live,
        }
    }
}

impl<AF: AddressFamily> Iterator for AfSubnetIter<AF> {
    type Item = AfPrefix<AF>;

    fn next(&mut self) -> Option<AfPrefix<AF>> {
        if !self.live {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(AfPrefix::new(self.cur, self.child_len));
        }
        if self.cur | self.mask == self.parent_last {
            self.live = false;
            return None;
        }
        self.cur = (self.cur | self.mask).wrapping_incr();
        Some(AfPrefix::new(self.cur, self.child_len))
    }
}

enum SubnetIterInner {
    V4(AfSubnetIter<IPv4>),
    V6(AfSubnetIter<IPv6>),
}

/// Iterator over the equal-length subdivisions of a prefix, in ascending
/// address order. Returned by [`Prefix::subnet_iter`].
pub struct SubnetIter {
    inner: SubnetIterInner,
}

impl SubnetIter {
    pub(crate) fn new(prefix: &Prefix, n: u8) -> Self {
        let inner = match prefix {
            Prefix::V4(p) => SubnetIterInner::V4(AfSubnetIter::new(p, n)),
            Prefix::V6(p) => SubnetIterInner::V6(AfSubnetIter::new(p, n)),
        };
        SubnetIter { inner }
    }
}

impl Iterator for SubnetIter {
    type Item = Prefix;

    fn next(&mut self) -> Option<Prefix> {
        match &mut self.inner {
            SubnetIterInner::V4(iter) => iter.next().map(Prefix::V4),
            SubnetIterInner::V6(iter) => iter.next().map(Prefix::V6),
        }
    }
}
