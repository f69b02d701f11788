use std::io::{self, Read, Write};

use crate::af::{IPV4_PREFIX_LEN, IPV6_PREFIX_LEN};
use crate::errors::Error;
use crate::prefix::{AfPrefix, Prefix};

//------------ Afi -----------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Afi {
    Ipv4,
    Ipv6,
}

impl Afi {
    fn max_len(self) -> u8 {
        match self {
            Afi::Ipv4 => IPV4_PREFIX_LEN,
            Afi::Ipv6 => IPV6_PREFIX_LEN,
        }
    }

    fn matches(self, p: &Prefix) -> bool {
        matches!(
            (self, p),
            (Afi::Ipv4, Prefix::V4(_)) | (Afi::Ipv6, Prefix::V6(_))
        )
    }
}

fn select(afi: &str, typ: &str) -> Option<Afi> {
    match (afi, typ) {
        ("ipv4", "nlri") => Some(Afi::Ipv4),
        ("ipv6", "nlri") => Some(Afi::Ipv6),
        _ => None,
    }
}

// Fills the buffer from the reader. `Ok(false)` when the stream ends
// before the buffer does, which terminates a record stream cleanly.
fn read_full(r: &mut impl Read, buf: &mut [u8]) -> Result<bool, Error> {
    let mut off = 0;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => return Ok(false),
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(true)
}

//------------ Decoder -------------------------------------------------------

/// An IP address prefix decoder: streams NLRI records of one declared
/// address family from a reader.
///
/// Each record is a length octet followed by just enough big-endian
/// address bytes to carry that many bits.
pub struct Decoder<R> {
    r: R,
    afi: Afi,
}

impl<R: Read> Decoder<R> {
    /// Returns a new decoder that reads from `r`. Known address family
    /// identifiers are `"ipv4"` and `"ipv6"`, the known decoding type is
    /// `"nlri"` (Network Layer Reachability Information).
    pub fn new(afi: &str, typ: &str, r: R) -> Result<Decoder<R>, Error> {
        let afi = select(afi, typ).ok_or(Error::UnknownDecodingType)?;
        Ok(Decoder { r, afi })
    }

    /// Reads records until the stream ends, appending each prefix to
    /// `prefixes`. A record cut short by the end of the stream ends the
    /// stream cleanly; a length octet beyond the family width is an
    /// [`Error::InvalidArgument`]; I/O errors surface unchanged.
    pub fn decode(&mut self, prefixes: &mut Vec<Prefix>) -> Result<(), Error> {
        loop {
            let mut hdr = [0; 1];
            if !read_full(&mut self.r, &mut hdr)? {
                return Ok(());
            }
            let len = hdr[0];
            if len > self.afi.max_len() {
                return Err(Error::InvalidArgument);
            }
            let n = usize::from((len + 7) / 8);
            match self.afi {
                Afi::Ipv4 => {
                    let mut b = [0; 4];
                    if !read_full(&mut self.r, &mut b[..n])? {
                        return Ok(());
                    }
                    prefixes.push(Prefix::V4(AfPrefix::new(
                        u32::from_be_bytes(b),
                        len,
                    )));
                }
                Afi::Ipv6 => {
                    let mut b = [0; 16];
                    if !read_full(&mut self.r, &mut b[..n])? {
                        return Ok(());
                    }
                    prefixes.push(Prefix::V6(AfPrefix::new(
                        u128::from_be_bytes(b),
                        len,
                    )));
                }
            }
        }
    }
}

//------------ Encoder -------------------------------------------------------

/// An IP address prefix encoder: writes prefixes of one declared address
/// family as NLRI records to a writer.
pub struct Encoder<W> {
    w: W,
    afi: Afi,
}

impl<W: Write> Encoder<W> {
    /// Returns a new encoder that writes to `w`. Known address family
    /// identifiers are `"ipv4"` and `"ipv6"`, the known encoding type is
    /// `"nlri"` (Network Layer Reachability Information).
    pub fn new(afi: &str, typ: &str, w: W) -> Result<Encoder<W>, Error> {
        let afi = select(afi, typ).ok_or(Error::UnknownEncodingType)?;
        Ok(Encoder { w, afi })
    }

    /// Writes every prefix of the encoder's family to the stream;
    /// prefixes of the other family are skipped. A write that lands
    /// short of a record is an [`Error::ShortWrite`].
    pub fn encode(&mut self, prefixes: &[Prefix]) -> Result<(), Error> {
        for p in prefixes {
            if !self.afi.matches(p) {
                continue;
            }
            let b = p.to_binary();
            let n = self.w.write(&b)?;
            if n < b.len() {
                return Err(Error::ShortWrite);
            }
        }
        Ok(())
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.w
    }
}
