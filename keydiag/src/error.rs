//! Error taxonomy for the diagnostics pipeline.
//!
//! Errors here never abort the report; they are rendered into it. The
//! variants name the stage that failed, which decides the line format.

use std::fmt;

use thiserror::Error;

use keydiag_transport as transport;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Listing readers or devices on a backend failed
    #[error("{0}")]
    Enumeration(String),
    /// Opening a connection to one device failed
    #[error("{0}")]
    Connection(String),
    /// A read against an open connection failed
    #[error("{0}")]
    Probe(String),
    /// The device answered, but the payload would not decode
    #[error("{0}")]
    Decode(String),
}

impl Error {
    pub fn enumeration(err: impl fmt::Display) -> Self {
        Error::Enumeration(err.to_string())
    }

    pub fn connection(err: impl fmt::Display) -> Self {
        Error::Connection(err.to_string())
    }
}

// Transport errors crossing a probe boundary: an answer that would not
// decode is a Decode failure, everything else a Probe failure. The
// enumeration and connection seams classify explicitly instead.
impl From<transport::Error> for Error {
    fn from(err: transport::Error) -> Self {
        if matches!(err, transport::Error::InvalidResponse(_)) {
            Error::Decode(err.to_string())
        } else {
            Error::Probe(err.to_string())
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
