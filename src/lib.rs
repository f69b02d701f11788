//! Basic functions for the manipulation of IP address prefixes and the
//! address blocks they describe, as laid out in RFC 4632 and RFC 4291.
//!
//! The central type is [`Prefix`], an immutable `(address, length)` pair
//! normalized on construction, with one variant per address family.
//! Single-prefix operations (containment, overlap, splitting into
//! subnets, subtracting a sub-block, host enumeration, NLRI and text
//! forms) live on the type itself. Operations across prefix lists
//! ([`supernet`], [`aggregate`], [`summarize`]), the address-walking
//! [`Cursor`] and the streaming NLRI codec ([`Encoder`], [`Decoder`])
//! sit next to it.
//!
//! ```
//! use cidrcore::{supernet, Prefix};
//!
//! let p: Prefix = "172.16.0.0/16".parse()?;
//! assert!(p.contains("172.16.31.7".parse()?));
//!
//! let subs = p.subnets(3);
//! assert_eq!(subs.len(), 8);
//! assert_eq!(subs[5].to_string(), "172.16.160.0/19");
//! assert_eq!(supernet(&subs[4..6]), Some("172.16.128.0/18".parse()?));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod af;
mod aggregate;
mod codec;
mod cursor;
mod errors;
mod iterators;
mod prefix;
pub mod synth_int;

pub use crate::af::{AddressFamily, IPv4, IPv6, IPV4_PREFIX_LEN, IPV6_PREFIX_LEN};
pub use crate::aggregate::{aggregate, summarize, supernet};
pub use crate::codec::{Decoder, Encoder};
pub use crate::cursor::{Cursor, Position};
pub use crate::errors::Error;
pub use crate::iterators::{HostIter, SubnetIter};
pub use crate::prefix::{AfPrefix, Prefix};
pub use crate::synth_int::U256;
