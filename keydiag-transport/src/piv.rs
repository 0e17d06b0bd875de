//! PIV application probing over PC/SC.

use std::fmt;

use crate::device::Version;
use crate::error::{Error, Result};
use crate::scard::{ScardConnection, aid};
use crate::tlv;

const INS_VERIFY: u8 = 0x20;
const INS_GET_DATA: u8 = 0xcb;
const INS_GET_VERSION: u8 = 0xfd;
const INS_GET_METADATA: u8 = 0xf7;

const KEY_REF_PIN: u8 = 0x80;
const KEY_REF_PUK: u8 = 0x81;
const KEY_REF_MGMT: u8 = 0x9b;

const TAG_METADATA_ALGO: u8 = 0x01;
const TAG_METADATA_RETRIES: u8 = 0x06;

const SW_FILE_NOT_FOUND: u16 = 0x6a82;
const SW_AUTH_BLOCKED: u16 = 0x6983;

/// Certificate slots and their data object ids (SP 800-73).
const CERT_SLOTS: [(u8, u32); 4] = [
    (0x9a, 0x5f_c105),
    (0x9c, 0x5f_c10a),
    (0x9d, 0x5f_c10b),
    (0x9e, 0x5f_c101),
];

/// Management key algorithms (SP 800-78 identifiers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementKeyType {
    Tdes,
    Aes128,
    Aes192,
    Aes256,
}

impl ManagementKeyType {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            0x03 => Some(ManagementKeyType::Tdes),
            0x08 => Some(ManagementKeyType::Aes128),
            0x0a => Some(ManagementKeyType::Aes192),
            0x0c => Some(ManagementKeyType::Aes256),
            _ => None,
        }
    }
}

impl fmt::Display for ManagementKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ManagementKeyType::Tdes => "TDES",
            ManagementKeyType::Aes128 => "AES128",
            ManagementKeyType::Aes192 => "AES192",
            ManagementKeyType::Aes256 => "AES256",
        })
    }
}

/// What the diagnostics report shows for the PIV application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivSummary {
    pub version: Version,
    /// `None` when the card would not reveal the counter.
    pub pin_attempts: Option<u8>,
    pub puk_attempts: Option<u8>,
    pub management_key: ManagementKeyType,
    pub occupied_slots: Vec<u8>,
}

impl PivSummary {
    pub fn lines(&self) -> Vec<String> {
        let counter = |n: Option<u8>| match n {
            Some(n) => n.to_string(),
            None => "unknown".to_string(),
        };
        let slots = if self.occupied_slots.is_empty() {
            "(none)".to_string()
        } else {
            self.occupied_slots
                .iter()
                .map(|slot| format!("{slot:02X}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        vec![
            format!("PIV version: {}", self.version),
            format!("PIN tries remaining: {}", counter(self.pin_attempts)),
            format!("PUK tries remaining: {}", counter(self.puk_attempts)),
            format!("Management key algorithm: {}", self.management_key),
            format!("Occupied slots: {slots}"),
        ]
    }
}

/// A selected PIV application.
pub struct PivSession<'a> {
    conn: &'a mut ScardConnection,
}

impl<'a> PivSession<'a> {
    pub fn new(conn: &'a mut ScardConnection) -> Result<Self> {
        conn.select(aid::PIV)?;
        Ok(PivSession { conn })
    }

    pub fn summary(&mut self) -> Result<PivSummary> {
        Ok(PivSummary {
            version: self.version()?,
            pin_attempts: self.pin_attempts()?,
            puk_attempts: self.puk_attempts()?,
            management_key: self.management_key_type()?,
            occupied_slots: self.occupied_slots()?,
        })
    }

    pub fn version(&mut self) -> Result<Version> {
        let response = self.conn.transmit_apdu(0, INS_GET_VERSION, 0, 0, &[])?;
        Version::from_bytes(&response)
    }

    /// Remaining PIN attempts, without spending one. GET METADATA
    /// (firmware 5.3 and later) reports the counter directly; older
    /// firmware answers an empty VERIFY with SW 63Cx instead.
    pub fn pin_attempts(&mut self) -> Result<Option<u8>> {
        if let Ok(remaining) = self.retries_metadata(KEY_REF_PIN) {
            return Ok(Some(remaining));
        }
        match self.conn.transmit_apdu(0, INS_VERIFY, 0, KEY_REF_PIN, &[]) {
            Ok(_) => Ok(None),
            Err(Error::Apdu { sw }) if sw & 0xfff0 == 0x63c0 => Ok(Some((sw & 0x000f) as u8)),
            Err(Error::Apdu {
                sw: SW_AUTH_BLOCKED,
            }) => Ok(Some(0)),
            Err(e) => Err(e),
        }
    }

    /// The PUK counter is only readable where GET METADATA exists.
    pub fn puk_attempts(&mut self) -> Result<Option<u8>> {
        match self.retries_metadata(KEY_REF_PUK) {
            Ok(remaining) => Ok(Some(remaining)),
            Err(Error::Apdu { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Algorithm of the management key. Cards without GET METADATA all
    /// carry the original TDES key.
    pub fn management_key_type(&mut self) -> Result<ManagementKeyType> {
        match self
            .conn
            .transmit_apdu(0, INS_GET_METADATA, 0, KEY_REF_MGMT, &[])
        {
            Ok(response) => {
                let entries = tlv::parse(&response)?;
                tlv::get(&entries, TAG_METADATA_ALGO)
                    .and_then(|value| value.first())
                    .and_then(|&code| ManagementKeyType::from_code(code))
                    .ok_or_else(|| Error::InvalidResponse("missing key algorithm".into()))
            }
            Err(Error::Apdu { .. }) => Ok(ManagementKeyType::Tdes),
            Err(e) => Err(e),
        }
    }

    pub fn occupied_slots(&mut self) -> Result<Vec<u8>> {
        let mut slots = Vec::new();
        for (slot, object_id) in CERT_SLOTS {
            match self.get_object(object_id) {
                Ok(_) => slots.push(slot),
                Err(Error::Apdu {
                    sw: SW_FILE_NOT_FOUND,
                }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(slots)
    }

    fn retries_metadata(&mut self, key_ref: u8) -> Result<u8> {
        let response = self
            .conn
            .transmit_apdu(0, INS_GET_METADATA, 0, key_ref, &[])?;
        let entries = tlv::parse(&response)?;
        tlv::get(&entries, TAG_METADATA_RETRIES)
            // Retries metadata holds (total, remaining).
            .and_then(|value| value.get(1))
            .copied()
            .ok_or_else(|| Error::InvalidResponse("missing retry metadata".into()))
    }

    fn get_object(&mut self, object_id: u32) -> Result<Vec<u8>> {
        let data = [
            0x5c,
            0x03,
            (object_id >> 16) as u8,
            (object_id >> 8) as u8,
            object_id as u8,
        ];
        self.conn.transmit_apdu(0, INS_GET_DATA, 0x3f, 0xff, &data)
    }
}
