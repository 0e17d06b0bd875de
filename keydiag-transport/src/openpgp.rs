//! OpenPGP application probing over PC/SC.

use crate::error::{Error, Result};
use crate::scard::{ScardConnection, aid};

const INS_GET_DATA: u8 = 0xca;

/// Data object tags (OpenPGP smart card spec).
const DO_AID: u16 = 0x004f;
const DO_PW_STATUS: u16 = 0x00c4;

/// Spec version and remaining password attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPgpInfo {
    pub version_major: u8,
    pub version_minor: u8,
    pub pw1_attempts: u8,
    pub reset_attempts: u8,
    pub admin_attempts: u8,
}

impl OpenPgpInfo {
    /// Builds the summary from the application AID (version in BCD at
    /// offsets 6 and 7) and the PW status data object (attempt
    /// counters at offsets 4 through 6).
    pub(crate) fn from_parts(aid_data: &[u8], pw_status: &[u8]) -> Result<Self> {
        if aid_data.len() < 8 {
            return Err(Error::InvalidResponse("OpenPGP AID truncated".into()));
        }
        if pw_status.len() < 7 {
            return Err(Error::InvalidResponse("PW status truncated".into()));
        }
        Ok(OpenPgpInfo {
            version_major: bcd(aid_data[6]),
            version_minor: bcd(aid_data[7]),
            pw1_attempts: pw_status[4],
            reset_attempts: pw_status[5],
            admin_attempts: pw_status[6],
        })
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "OpenPGP version: {}.{}",
                self.version_major, self.version_minor
            ),
            format!("PW1 tries remaining: {}", self.pw1_attempts),
            format!("Reset code tries remaining: {}", self.reset_attempts),
            format!("Admin PIN tries remaining: {}", self.admin_attempts),
        ]
    }
}

fn bcd(value: u8) -> u8 {
    10 * (value >> 4) + (value & 0x0f)
}

/// A selected OpenPGP application.
pub struct OpenPgpSession<'a> {
    conn: &'a mut ScardConnection,
}

impl<'a> OpenPgpSession<'a> {
    pub fn new(conn: &'a mut ScardConnection) -> Result<Self> {
        conn.select(aid::OPENPGP)?;
        Ok(OpenPgpSession { conn })
    }

    pub fn read_info(&mut self) -> Result<OpenPgpInfo> {
        let aid_data = self.get_data(DO_AID)?;
        let pw_status = self.get_data(DO_PW_STATUS)?;
        OpenPgpInfo::from_parts(&aid_data, &pw_status)
    }

    fn get_data(&mut self, tag: u16) -> Result<Vec<u8>> {
        self.conn
            .transmit_apdu(0, INS_GET_DATA, (tag >> 8) as u8, tag as u8, &[])
    }
}
