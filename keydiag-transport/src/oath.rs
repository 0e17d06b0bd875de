//! OATH application probing over PC/SC.

use crate::device::Version;
use crate::error::{Error, Result};
use crate::scard::{ScardConnection, aid};
use crate::tlv;

const TAG_VERSION: u8 = 0x79;
const TAG_CHALLENGE: u8 = 0x74;

/// What the SELECT response reveals about the OATH application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OathInfo {
    pub version: Version,
    /// A challenge in the SELECT response means a password is set.
    pub locked: bool,
}

impl OathInfo {
    pub(crate) fn parse(select_response: &[u8]) -> Result<Self> {
        let entries = tlv::parse(select_response)?;
        let version = tlv::get(&entries, TAG_VERSION)
            .ok_or_else(|| Error::InvalidResponse("OATH version missing".into()))
            .and_then(Version::from_bytes)?;
        Ok(OathInfo {
            version,
            locked: tlv::get(&entries, TAG_CHALLENGE).is_some_and(|c| !c.is_empty()),
        })
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Oath version: {}", self.version),
            format!("Password protected: {}", self.locked),
        ]
    }
}

/// A selected OATH application.
pub struct OathSession {
    info: OathInfo,
}

impl OathSession {
    pub fn new(conn: &mut ScardConnection) -> Result<Self> {
        let response = conn.select(aid::OATH)?;
        Ok(OathSession {
            info: OathInfo::parse(&response)?,
        })
    }

    pub fn info(&self) -> &OathInfo {
        &self.info
    }
}
