use std::{error::Error, fmt};

/// Returned when a value cannot be read out of a byte buffer, which in
/// practice means the buffer ended mid-message or a discriminant byte was
/// out of range. Carries no detail on purpose: the only sane reaction to a
/// malformed message is to drop that message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerdeErr;

impl fmt::Display for SerdeErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "malformed or truncated message bytes")
    }
}

impl Error for SerdeErr {}
