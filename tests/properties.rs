use std::io::Cursor as IoCursor;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use proptest::prelude::*;

use cidrcore::{aggregate, summarize, supernet, Cursor, Decoder, Encoder, Prefix, U256};

fn v4_prefix() -> impl Strategy<Value = Prefix> {
    (any::<u32>(), 0u8..=32).prop_map(|(addr, len)| {
        Prefix::new(IpAddr::V4(Ipv4Addr::from(addr)), len).unwrap()
    })
}

fn v6_prefix() -> impl Strategy<Value = Prefix> {
    (any::<u128>(), 0u8..=128).prop_filter_map(
        "mapped addresses fold to V4",
        |(addr, len)| {
            Prefix::new(IpAddr::V6(Ipv6Addr::from(addr)), len)
                .ok()
                .filter(|p| matches!(p, Prefix::V6(_)))
        },
    )
}

fn any_prefix() -> impl Strategy<Value = Prefix> {
    prop_oneof![v4_prefix(), v6_prefix()]
}

// Cursor walks are exhaustive, so keep their prefixes tiny.
fn narrow_prefix() -> impl Strategy<Value = Prefix> {
    prop_oneof![
        (any::<u32>(), 28u8..=32).prop_map(|(addr, len)| {
            Prefix::new(IpAddr::V4(Ipv4Addr::from(addr)), len).unwrap()
        }),
        (any::<u128>(), 124u8..=128).prop_filter_map(
            "mapped addresses fold to V4",
            |(addr, len)| {
                Prefix::new(IpAddr::V6(Ipv6Addr::from(addr)), len)
                    .ok()
                    .filter(|p| matches!(p, Prefix::V6(_)))
            },
        ),
    ]
}

proptest! {
    #[test]
    fn prefix_contains_its_own_range(p in any_prefix()) {
        prop_assert!(p.contains(p.addr()));
        prop_assert!(p.contains(p.last_addr()));
        prop_assert!(p.contains_prefix(&p));
        prop_assert!(p.overlaps(&p));
    }

    #[test]
    fn overlap_is_nesting(p in v4_prefix(), q in v4_prefix()) {
        // Aligned blocks only ever overlap by one containing the other.
        prop_assert_eq!(
            p.overlaps(&q),
            p.contains_prefix(&q) || q.contains_prefix(&p)
        );
        prop_assert_eq!(p.overlaps(&q), q.overlaps(&p));
    }

    #[test]
    fn num_addr_matches_the_length(p in any_prefix()) {
        let width = match p {
            Prefix::V4(_) => 32,
            Prefix::V6(_) => 128,
        };
        prop_assert_eq!(p.num_addr(), U256::power_of_two(width - p.len()));
    }

    #[test]
    fn subnets_tile_the_prefix(
        (p, n) in (any::<u32>(), 1u8..=28).prop_flat_map(|(addr, len)| {
            let p = Prefix::new(IpAddr::V4(Ipv4Addr::from(addr)), len).unwrap();
            (Just(p), 0u8..=(32 - len).min(6))
        })
    ) {
        let subs = p.subnets(n);
        prop_assert_eq!(subs.len(), 1usize << n);
        for (i, sub) in subs.iter().enumerate() {
            prop_assert_eq!(sub.len(), p.len() + n);
            prop_assert!(p.contains_prefix(sub));
            if i > 0 {
                prop_assert!(subs[i - 1] < *sub);
                prop_assert!(!subs[i - 1].overlaps(sub));
            }
        }
        prop_assert_eq!(supernet(&subs), Some(p));
    }

    #[test]
    fn exclude_partitions_the_prefix(
        (p, x) in (any::<u32>(), 0u8..=24).prop_flat_map(|(addr, len)| {
            let p = Prefix::new(IpAddr::V4(Ipv4Addr::from(addr)), len).unwrap();
            let split = (1u8..=(32 - len).min(8)).prop_flat_map(move |k| {
                let subs = p.subnets(k);
                (0..subs.len()).prop_map(move |i| subs[i])
            });
            (Just(p), split)
        })
    ) {
        let subs = p.exclude(&x);
        prop_assert_eq!(subs.len(), usize::from(x.len() - p.len()));
        let total: U256 = subs.iter().map(|s| s.num_addr()).sum();
        prop_assert_eq!(total + x.num_addr(), p.num_addr());
        for (i, s) in subs.iter().enumerate() {
            prop_assert!(!s.overlaps(&x));
            prop_assert!(p.contains_prefix(s));
            for t in &subs[..i] {
                prop_assert!(!s.overlaps(t));
            }
        }
    }

    #[test]
    fn aggregate_rebuilds_subnet_splits(
        (p, n) in (any::<u32>(), 1u8..=28).prop_flat_map(|(addr, len)| {
            let p = Prefix::new(IpAddr::V4(Ipv4Addr::from(addr)), len).unwrap();
            (Just(p), 0u8..=(32 - len).min(5))
        })
    ) {
        prop_assert_eq!(aggregate(&p.subnets(n)), vec![p]);
    }

    #[test]
    fn aggregate_is_idempotent_and_coverage_preserving(
        (p, k, mask) in (any::<u32>(), 8u8..=24).prop_flat_map(|(addr, len)| {
            let p = Prefix::new(IpAddr::V4(Ipv4Addr::from(addr)), len).unwrap();
            (Just(p), 1u8..=4, any::<u16>())
        })
    ) {
        let subset: Vec<Prefix> = p
            .subnets(k)
            .into_iter()
            .enumerate()
            .filter(|&(i, _)| mask & (1u16 << (i % 16)) != 0)
            .map(|(_, s)| s)
            .collect();
        let once = aggregate(&subset);
        prop_assert_eq!(&aggregate(&once), &once);

        let before: U256 = subset.iter().map(|s| s.num_addr()).sum();
        let after: U256 = once.iter().map(|s| s.num_addr()).sum();
        prop_assert_eq!(before, after);
        for (i, s) in once.iter().enumerate() {
            for t in &once[..i] {
                prop_assert!(!s.overlaps(t));
            }
        }
    }

    #[test]
    fn summarize_covers_exactly_the_range(a in any::<u32>(), b in any::<u32>()) {
        let (first, last) = (a.min(b), a.max(b));
        let sums = summarize(
            IpAddr::V4(Ipv4Addr::from(first)),
            IpAddr::V4(Ipv4Addr::from(last)),
        );
        prop_assert!(!sums.is_empty());

        let total: U256 = sums.iter().map(|s| s.num_addr()).sum();
        prop_assert_eq!(total, U256::from(u128::from(last - first) + 1));

        prop_assert_eq!(sums[0].addr(), IpAddr::V4(Ipv4Addr::from(first)));
        prop_assert_eq!(
            sums[sums.len() - 1].last_addr(),
            IpAddr::V4(Ipv4Addr::from(last))
        );
        for w in sums.windows(2) {
            let (end, start) = match (w[0].last_addr(), w[1].addr()) {
                (IpAddr::V4(e), IpAddr::V4(s)) => (u32::from(e), u32::from(s)),
                _ => return Err(TestCaseError::fail("family changed mid-chain")),
            };
            prop_assert_eq!(end + 1, start);
        }
    }

    #[test]
    fn text_and_binary_forms_round_trip(p in any_prefix()) {
        prop_assert_eq!(p.to_string().parse::<Prefix>().unwrap(), p);

        let mut q = match p {
            Prefix::V4(_) => "0.0.0.0/0".parse::<Prefix>().unwrap(),
            Prefix::V6(_) => "::/0".parse::<Prefix>().unwrap(),
        };
        q.unmarshal_binary(&p.to_binary()).unwrap();
        prop_assert_eq!(q, p);
    }

    #[test]
    fn codec_streams_round_trip(input in proptest::collection::vec(v4_prefix(), 0..16)) {
        let mut enc = Encoder::new("ipv4", "nlri", Vec::new()).unwrap();
        enc.encode(&input).unwrap();
        let mut dec =
            Decoder::new("ipv4", "nlri", IoCursor::new(enc.into_inner())).unwrap();
        let mut got = Vec::new();
        dec.decode(&mut got).unwrap();
        prop_assert_eq!(got, input);
    }

    #[test]
    fn cursor_visits_every_address_once_per_listing(
        input in proptest::collection::vec(narrow_prefix(), 1..4)
    ) {
        let c = Cursor::new(&input);
        let mut c = match c {
            Some(c) => c,
            None => return Err(TestCaseError::fail("non-empty input lost its cursor")),
        };
        let expected: U256 = c.list().iter().map(|p| p.num_addr()).sum();
        let mut visited = U256::ONE;
        let mut prev = c.pos();
        while let Some(pos) = c.next() {
            visited = visited + U256::ONE;
            // Order never goes backwards across the walk.
            prop_assert!(pos.prefix >= prev.prefix);
            prev = pos;
        }
        prop_assert_eq!(visited, expected);
    }
}
