//! Security key access for diagnostics
//!
//! This crate provides the device plumbing the diagnostics report is built
//! from, across the three transports a key can surface on:
//! - PC/SC smartcard (APDU framing, application SELECT)
//! - HID OTP (feature-report frames, slot commands)
//! - HID FIDO (CTAPHID framing, CTAP2 CBOR commands)
//!
//! On top of the connections sit thin application sessions (management,
//! PIV, OATH, OpenPGP, OTP state, CTAP2) that read exactly what the
//! report shows and decode it into small owned types.
//!
//! Spec: <https://fidoalliance.org/specs/fido-v2.2-rd-20230321/fido-client-to-authenticator-protocol-v2.2-rd-20230321.html#usb>

pub mod ctap;
pub mod device;
pub mod error;
pub mod hid;
pub mod info;
pub mod mgmt;
pub mod oath;
pub mod openpgp;
pub mod otp;
pub mod piv;
pub mod scard;
mod tlv;

// Re-export commonly used types
pub use ctap::{Ctap2Info, Ctap2Session, CtapError};
pub use device::{DeviceHandle, ProductFamily, ProductId, UsbInterfaces, Version};
pub use error::{Error, Result};
pub use hid::{FidoHidConnection, HidFidoBackend, HidOtpBackend, OtpHidConnection};
pub use info::{DeviceInfo, FormFactor, device_name};
pub use mgmt::{ConfigRead, ManagementSession};
pub use oath::{OathInfo, OathSession};
pub use openpgp::{OpenPgpInfo, OpenPgpSession};
pub use otp::{OtpSession, OtpState};
pub use piv::{ManagementKeyType, PivSession, PivSummary};
pub use scard::{PcscBackend, ScardConnection};
