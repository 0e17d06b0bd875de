//! Error types for device access.

use thiserror::Error;

use crate::ctap::CtapError;

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a device.
#[derive(Debug, Error)]
pub enum Error {
    /// PC/SC service, reader or card failure.
    #[error("{0}")]
    Pcsc(#[from] pcsc::Error),

    /// HID layer failure.
    #[error("{0}")]
    Hid(#[from] hidapi::HidError),

    /// The card answered with an unexpected status word.
    #[error("APDU error SW=0x{sw:04X}")]
    Apdu { sw: u16 },

    /// The requested application is not present on the device.
    #[error("application not available")]
    ApplicationNotAvailable,

    /// A reply was received but could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A request could not be encoded.
    #[error("CBOR encode failed: {0}")]
    Encode(String),

    /// CTAP2 error status returned by the authenticator.
    #[error("{0}")]
    Ctap(CtapError),

    /// CTAPHID transaction failed at the channel level.
    #[error("CTAPHID error 0x{0:02X}")]
    Ctaphid(u8),

    /// Malformed or truncated CTAPHID packet.
    #[error("malformed CTAPHID packet")]
    InvalidPacket,

    /// The device did not answer in time.
    #[error("timed out waiting for the device")]
    Timeout,

    /// The handle was not produced by this backend.
    #[error("device handle does not belong to this backend")]
    ForeignHandle,
}
