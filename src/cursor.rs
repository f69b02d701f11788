use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use log::trace;

use crate::aggregate::sort_and_dedup;
use crate::errors::Error;
use crate::prefix::Prefix;

//------------ Position ------------------------------------------------------

/// A spot on a [`Cursor`]: an address and the prefix it belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub addr: IpAddr,
    pub prefix: Prefix,
}

//------------ Cursor --------------------------------------------------------

// V4 walks through the 128-bit space as IPv4-mapped IPv6, so one pair of
// integers tracks the current spot regardless of family.
const V4_MAPPED: u128 = 0xffff << 32;

fn fold(ip: IpAddr) -> u128 {
    match ip {
        IpAddr::V4(a) => V4_MAPPED | u128::from(u32::from(a)),
        IpAddr::V6(a) => u128::from(a),
    }
}

fn unfold(prefix: &Prefix, i: u128) -> IpAddr {
    match prefix {
        Prefix::V4(_) => IpAddr::V4(Ipv4Addr::from(i as u32)),
        Prefix::V6(_) => IpAddr::V6(Ipv6Addr::from(i)),
    }
}

/// A movable indicator over every address of a prefix list.
///
/// The cursor owns a sorted, deduplicated copy of the list (families
/// may be mixed, V4 sorting first) and walks it address by address,
/// hopping to the next prefix when the current one runs out.
#[derive(Clone, Debug)]
pub struct Cursor {
    curr: u128,
    last: u128,
    pi: usize,
    ps: Vec<Prefix>,
}

impl Cursor {
    /// Returns a cursor over a copy of `ps`, or `None` when the list is
    /// empty. The caller's list is left untouched.
    pub fn new(ps: &[Prefix]) -> Option<Cursor> {
        let ps = sort_and_dedup(ps);
        if ps.is_empty() {
            return None;
        }
        let mut c = Cursor {
            curr: 0,
            last: 0,
            pi: 0,
            ps,
        };
        c.rewind_to(0);
        Some(c)
    }

    fn rewind_to(&mut self, pi: usize) {
        trace!("cursor moves onto {}", self.ps[pi]);
        self.pi = pi;
        self.curr = fold(self.ps[pi].addr());
        self.last = fold(self.ps[pi].last_addr());
    }

    /// The first position on the cursor.
    pub fn first(&self) -> Position {
        Position {
            addr: self.ps[0].addr(),
            prefix: self.ps[0],
        }
    }

    /// The end position on the cursor.
    pub fn last(&self) -> Position {
        let p = self.ps[self.ps.len() - 1];
        Position {
            addr: p.last_addr(),
            prefix: p,
        }
    }

    /// The prefixes on the cursor, sorted and deduplicated.
    pub fn list(&self) -> &[Prefix] {
        &self.ps
    }

    /// The current position on the cursor.
    pub fn pos(&self) -> Position {
        Position {
            addr: unfold(&self.ps[self.pi], self.curr),
            prefix: self.ps[self.pi],
        }
    }

    /// Advances one address, hopping to the next prefix at a range end,
    /// and returns the new position. `None` once the last address of the
    /// last prefix has been reached, repeatedly, without moving past it.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Position> {
        if self.curr == self.last {
            if self.pi == self.ps.len() - 1 {
                return None;
            }
            self.rewind_to(self.pi + 1);
        } else {
            self.curr += 1;
        }
        Some(self.pos())
    }

    /// Moves the cursor to `pos`. Fails with
    /// [`Error::PositionOutOfRange`] unless the position's prefix is on
    /// the cursor and contains the position's address.
    pub fn set(&mut self, pos: &Position) -> Result<(), Error> {
        let pi = self
            .ps
            .iter()
            .position(|p| *p == pos.prefix)
            .ok_or(Error::PositionOutOfRange)?;
        if !self.ps[pi].contains(pos.addr) {
            return Err(Error::PositionOutOfRange);
        }
        self.pi = pi;
        self.curr = fold(pos.addr);
        self.last = fold(self.ps[pi].last_addr());
        Ok(())
    }
}
