//! Operations across prefix lists: common supernet, aggregation into the
//! smallest equivalent set, and summarization of an address range.

use std::net::IpAddr;

use log::trace;

use crate::af::{AddressFamily, IPv4, IPv6};
use crate::prefix::{canon_ip, AfPrefix, Prefix};

//------------ sorting -------------------------------------------------------

/// Sorts family-then-address-then-length and drops exact duplicates.
pub(crate) fn sort_and_dedup(ps: &[Prefix]) -> Vec<Prefix> {
    let mut ps = ps.to_vec();
    ps.sort();
    ps.dedup();
    ps
}

/// Drops every prefix contained in an earlier one. The input must be
/// sorted: a container always sorts before its contents, so one compare
/// against the last kept element suffices.
fn absorb_contained<AF: AddressFamily>(
    ps: Vec<AfPrefix<AF>>,
) -> Vec<AfPrefix<AF>> {
    let mut kept: Vec<AfPrefix<AF>> = Vec::with_capacity(ps.len());
    for p in ps {
        if let Some(k) = kept.last() {
            if k.contains_prefix(&p) {
                continue;
            }
        }
        kept.push(p);
    }
    kept
}

//------------ supernet ------------------------------------------------------

fn af_supernet<AF: AddressFamily>(
    ps: &[AfPrefix<AF>],
) -> Option<AfPrefix<AF>> {
    let m = AF::netmask(ps[0].len());
    let base = ps[0].addr() & m;
    let mut len = ps[0].len();
    for p in &ps[1..] {
        let diff = (base ^ p.addr()) & m;
        if diff != AF::ZERO {
            len = len.min(diff.leading_zeros());
        }
    }
    if len == 0 {
        None
    } else {
        Some(AfPrefix::new(ps[0].addr(), len))
    }
}

/// Tries to find the shortest prefix that contains every prefix of the
/// list. A single-element list yields that element. `None` for an empty
/// list, for a mixed-family list, and when only a zero-length prefix
/// would do.
pub fn supernet(ps: &[Prefix]) -> Option<Prefix> {
    match ps {
        [] => None,
        [p] => Some(*p),
        [Prefix::V4(first), rest @ ..] => {
            let mut v = Vec::with_capacity(ps.len());
            v.push(*first);
            for p in rest {
                match p {
                    Prefix::V4(p) => v.push(*p),
                    Prefix::V6(_) => return None,
                }
            }
            af_supernet(&v).map(Prefix::V4)
        }
        [Prefix::V6(first), rest @ ..] => {
            let mut v = Vec::with_capacity(ps.len());
            v.push(*first);
            for p in rest {
                match p {
                    Prefix::V6(p) => v.push(*p),
                    Prefix::V4(_) => return None,
                }
            }
            af_supernet(&v).map(Prefix::V6)
        }
    }
}

//------------ aggregate -----------------------------------------------------

/// The largest branching factor `bf` such that the first `2^bf` elements
/// are exactly the complete subtree under a common root: the head must
/// be the root's leftmost child and the elements must tile the root's
/// range gaplessly at the head's length. Returns `(bf, 2^bf)`.
fn af_ascend<AF: AddressFamily>(subs: &[AfPrefix<AF>]) -> (u8, usize) {
    let base = subs[0];
    let mut best = 0;
    for bf in 1..=base.len() {
        let count = match 1_usize.checked_shl(u32::from(bf)) {
            Some(count) if count <= subs.len() => count,
            _ => break,
        };
        let root = AfPrefix::new(base.addr(), base.len() - bf);
        if root.addr() != base.addr() {
            // Not aligned at this depth; deeper roots only need more
            // zero bits, so no point looking further.
            break;
        }
        let mut expected = base.addr();
        let mut complete = true;
        for s in &subs[..count] {
            if *s != AfPrefix::new(expected, base.len()) {
                complete = false;
                break;
            }
            expected = s.last().wrapping_incr();
        }
        if !complete {
            break;
        }
        best = bf;
    }
    (best, 1 << best)
}

fn af_aggregate<AF: AddressFamily>(
    subs: Vec<AfPrefix<AF>>,
) -> Vec<AfPrefix<AF>> {
    let mut subs = absorb_contained(subs);
    loop {
        let mut aggrs: Vec<AfPrefix<AF>> = Vec::with_capacity(subs.len());
        let mut rest = subs.as_slice();
        while let Some(&head) = rest.first() {
            if head.len() == 0 {
                aggrs.push(head);
                rest = &rest[1..];
                continue;
            }
            let (bf, count) = af_ascend(rest);
            if bf == 0 {
                aggrs.push(head);
                rest = &rest[1..];
                continue;
            }
            let root = AfPrefix::new(head.addr(), head.len() - bf);
            trace!(
                "folded {} x /{} into /{}",
                count,
                head.len(),
                root.len()
            );
            aggrs.push(root);
            rest = &rest[count..];
            // The wider root may swallow following prefixes as well.
            while let Some(s) = rest.first() {
                if !root.contains_prefix(s) {
                    break;
                }
                rest = &rest[1..];
            }
        }
        // A fold can leave two freshly minted siblings next to each
        // other; go again until nothing moves.
        let stable = aggrs == subs;
        subs = aggrs;
        if stable {
            return subs;
        }
    }
}

/// Aggregates the list into the smallest set of prefixes that covers
/// exactly the same addresses, merging complete groups of aligned
/// neighbors and absorbing contained prefixes.
///
/// Duplicates are dropped. A mixed-family list is aggregated per family,
/// V4 block first. The result is sorted.
pub fn aggregate(ps: &[Prefix]) -> Vec<Prefix> {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for p in sort_and_dedup(ps) {
        match p {
            Prefix::V4(p) => v4.push(p),
            Prefix::V6(p) => v6.push(p),
        }
    }
    let mut aggrs: Vec<Prefix> =
        af_aggregate(v4).into_iter().map(Prefix::V4).collect();
    aggrs.extend(af_aggregate(v6).into_iter().map(Prefix::V6));
    aggrs
}

//------------ summarize -----------------------------------------------------

fn af_summarize<AF: AddressFamily>(
    mut first: AF,
    last: AF,
) -> Vec<AfPrefix<AF>> {
    let mut sums = Vec::new();
    while first <= last {
        // Stretch the block while its start stays aligned and its end
        // stays inside the range.
        let mut len = AF::BITS;
        while len > 0 {
            let l = first & AF::netmask(len - 1);
            let r = first | AF::hostmask(len - 1);
            if first != l || r > last {
                break;
            }
            len -= 1;
        }
        let p = AfPrefix::new(first, len);
        sums.push(p);
        let end = p.last();
        if end == AF::MAX {
            break;
        }
        first = end.wrapping_incr();
    }
    sums
}

/// Expresses the inclusive address range `[first, last]` as the minimal
/// list of prefixes whose union is exactly the range, in ascending
/// order. Empty when the addresses are of different families or in the
/// wrong order.
pub fn summarize(first: IpAddr, last: IpAddr) -> Vec<Prefix> {
    match (canon_ip(first), canon_ip(last)) {
        (IpAddr::V4(f), IpAddr::V4(l)) => {
            af_summarize(IPv4::from_addr(f), IPv4::from_addr(l))
                .into_iter()
                .map(Prefix::V4)
                .collect()
        }
        (IpAddr::V6(f), IpAddr::V6(l)) => {
            af_summarize(IPv6::from_addr(f), IPv6::from_addr(l))
                .into_iter()
                .map(Prefix::V6)
                .collect()
        }
        _ => Vec::new(),
    }
}
