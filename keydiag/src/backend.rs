//! Trait seams between the pipeline and the hardware.
//!
//! Each transport contributes a backend (enumeration plus connection
//! open) and a connection trait exposing session constructors for the
//! applications that transport can reach. The hardware implementations
//! live in `keydiag-transport`; tests substitute scripted mocks.

use keydiag_transport::{
    Ctap2Info, DeviceHandle, DeviceInfo, OathInfo, OpenPgpInfo, OtpState, PivSummary, Version,
};

use crate::error::Result;

/// Management application reads (raw config page, decoded info).
pub trait ManagementSession {
    fn read_raw_config(&mut self) -> Result<Vec<u8>>;
    fn read_device_info(&mut self) -> Result<DeviceInfo>;
}

pub trait PivSession {
    fn summary(&mut self) -> Result<PivSummary>;
}

pub trait OathSession {
    fn info(&mut self) -> Result<OathInfo>;
}

pub trait OpenPgpSession {
    fn read_info(&mut self) -> Result<OpenPgpInfo>;
}

pub trait OtpSession {
    fn read_state(&mut self) -> Result<OtpState>;
}

pub trait Ctap2Session {
    fn get_info(&mut self) -> Result<Ctap2Info>;
    fn pin_retries(&mut self) -> Result<u64>;
    fn uv_retries(&mut self) -> Result<u64>;
}

/// Every transport can reach the management application, each through
/// its own plumbing.
pub trait ManagementAccess {
    fn management(&mut self) -> Box<dyn ManagementSession + '_>;
}

/// An open smartcard connection over PC/SC.
pub trait SmartCardConnection: ManagementAccess {
    fn piv(&mut self) -> Box<dyn PivSession + '_>;
    fn oath(&mut self) -> Box<dyn OathSession + '_>;
    fn openpgp(&mut self) -> Box<dyn OpenPgpSession + '_>;
}

/// An open connection to the HID OTP interface.
pub trait OtpConnection: ManagementAccess {
    fn otp(&mut self) -> Box<dyn OtpSession + '_>;
}

/// An open connection to the HID FIDO interface.
///
/// The version and capability getters are infallible: the values are
/// captured during the CTAPHID handshake that opened the connection.
pub trait FidoConnection: ManagementAccess {
    fn ctap2(&mut self) -> Box<dyn Ctap2Session + '_>;
    fn protocol_version(&self) -> u8;
    fn device_version(&self) -> Version;
    fn capabilities(&self) -> u8;
}

pub trait SmartCardBackend {
    fn list_readers(&self) -> Result<Vec<String>>;
    /// Connect/disconnect once, to report reader health.
    fn test_reader(&self, name: &str) -> Result<()>;
    fn list_devices(&self) -> Result<Vec<DeviceHandle>>;
    fn open(&self, device: &DeviceHandle) -> Result<Box<dyn SmartCardConnection + '_>>;
}

pub trait OtpBackend {
    fn list_devices(&self) -> Result<Vec<DeviceHandle>>;
    fn open(&self, device: &DeviceHandle) -> Result<Box<dyn OtpConnection + '_>>;
}

pub trait FidoBackend {
    fn list_devices(&self) -> Result<Vec<DeviceHandle>>;
    fn open(&self, device: &DeviceHandle) -> Result<Box<dyn FidoConnection + '_>>;
}
