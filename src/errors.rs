use std::fmt;
use std::io;

//------------ Error ---------------------------------------------------------

/// The errors returned by the fallible operations of this crate.
///
/// Pure prefix arithmetic never produces these: a domain violation there
/// (a cross-family comparison, a malformed operand list) yields the
/// neutral result instead, be it `false`, `None` or an empty list. The error
/// paths are the constructors, the mutating setters, cursor seeks and the
/// NLRI codec.
#[derive(Debug)]
pub enum Error {
    /// An address of unexpected byte length, a prefix length outside the
    /// family width, or otherwise malformed input.
    InvalidArgument,
    /// A cursor seek to a prefix that is not on the cursor, or to an
    /// address outside the referenced prefix.
    PositionOutOfRange,
    /// The encoder selector does not name a known family/type pair.
    UnknownEncodingType,
    /// The decoder selector does not name a known family/type pair.
    UnknownDecodingType,
    /// The underlying writer accepted fewer bytes than one record; the
    /// stream should be considered out of sync.
    ShortWrite,
    /// An error surfaced unchanged from the underlying stream.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument => {
                write!(f, "invalid argument")
            }
            Error::PositionOutOfRange => {
                write!(f, "position out of range")
            }
            Error::UnknownEncodingType => {
                write!(f, "unknown encoding type")
            }
            Error::UnknownDecodingType => {
                write!(f, "unknown decoding type")
            }
            Error::ShortWrite => {
                write!(f, "short write")
            }
            Error::Io(err) => {
                write!(f, "{}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
