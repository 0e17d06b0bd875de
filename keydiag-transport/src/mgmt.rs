//! Management application: raw config pages and decoded device info.
//!
//! The same length-prefixed config blob is reachable over all three
//! transports, each with its own read instruction. Connections provide
//! the page read through [`ConfigRead`]; the session adds decoding.

use crate::error::Result;
use crate::info::DeviceInfo;

/// APDU instruction for a config page read (smartcard transport).
pub(crate) const INS_READ_CONFIG: u8 = 0x1d;

/// OTP slot instruction carrying the config blob.
pub(crate) const SLOT_CAPABILITIES: u8 = 0x13;

/// Vendor CTAPHID command carrying the config blob.
pub(crate) const CTAPHID_READ_CONFIG: u8 = 0x42;

/// Transport-specific access to management config pages.
pub trait ConfigRead {
    /// Selects the management application when the transport needs it.
    fn select_management(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reads one raw config page, length prefix included.
    fn read_config_page(&mut self, page: u8) -> Result<Vec<u8>>;
}

/// Session over the management application of an open connection.
pub struct ManagementSession<'a, C: ConfigRead + ?Sized> {
    conn: &'a mut C,
}

impl<'a, C: ConfigRead + ?Sized> ManagementSession<'a, C> {
    pub fn new(conn: &'a mut C) -> Result<Self> {
        conn.select_management()?;
        Ok(ManagementSession { conn })
    }

    /// Raw bytes of the first config page.
    pub fn read_raw_config(&mut self) -> Result<Vec<u8>> {
        self.conn.read_config_page(0)
    }

    /// Decoded device information from the first config page.
    pub fn read_device_info(&mut self) -> Result<DeviceInfo> {
        let page = self.conn.read_config_page(0)?;
        DeviceInfo::parse(&page)
    }
}
