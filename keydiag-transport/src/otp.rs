//! OTP application state, read from the keyboard interface status report.

use std::fmt;

use crate::device::Version;
use crate::error::{Error, Result};
use crate::hid::OtpHidConnection;

// Config-valid flags in the touch level word (firmware >= 2.1).
const CONFIG1_VALID: u16 = 0x0001;
const CONFIG2_VALID: u16 = 0x0002;

/// Decoded status report: firmware version, programming sequence and
/// which of the two OTP slots hold a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpState {
    pub version: Version,
    pub sequence: u8,
    pub slot1_configured: bool,
    pub slot2_configured: bool,
}

impl OtpState {
    pub(crate) fn parse(report: &[u8]) -> Result<Self> {
        if report.len() < 6 {
            return Err(Error::InvalidResponse(format!(
                "status report of {} bytes",
                report.len()
            )));
        }
        let flags = u16::from_le_bytes([report[4], report[5]]);
        Ok(OtpState {
            version: Version::from_bytes(&report[..3])?,
            sequence: report[3],
            slot1_configured: flags & CONFIG1_VALID != 0,
            slot2_configured: flags & CONFIG2_VALID != 0,
        })
    }
}

impl fmt::Display for OtpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OtpState(version={}, slot1_configured={}, slot2_configured={})",
            self.version, self.slot1_configured, self.slot2_configured
        )
    }
}

/// Reads the OTP application state.
pub struct OtpSession<'a> {
    conn: &'a mut OtpHidConnection,
}

impl<'a> OtpSession<'a> {
    pub fn new(conn: &'a mut OtpHidConnection) -> Self {
        OtpSession { conn }
    }

    pub fn read_state(&mut self) -> Result<OtpState> {
        let report = self.conn.read_status()?;
        OtpState::parse(&report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_status_report() {
        let state = OtpState::parse(&[5, 4, 3, 7, 0x01, 0x00, 0, 0]).unwrap();
        assert_eq!(state.version, Version::new(5, 4, 3));
        assert_eq!(state.sequence, 7);
        assert!(state.slot1_configured);
        assert!(!state.slot2_configured);
        assert_eq!(
            state.to_string(),
            "OtpState(version=5.4.3, slot1_configured=true, slot2_configured=false)"
        );
    }

    #[test]
    fn test_short_report_is_rejected() {
        assert!(OtpState::parse(&[5, 4, 3]).is_err());
    }
}
