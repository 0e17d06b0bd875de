//! PC/SC backend: reader listing and smartcard connections.

use std::ffi::CString;

use pcsc::{Card, Context, Protocols, Scope, ShareMode};
use tracing::debug;

use crate::device::{DeviceHandle, ProductFamily, ProductId, UsbInterfaces};
use crate::error::{Error, Result};
use crate::mgmt::{ConfigRead, INS_READ_CONFIG};

const INS_SELECT: u8 = 0xa4;
const INS_GET_RESPONSE: u8 = 0xc0;

const SW_OK: u16 = 0x9000;

/// Application identifiers the diagnostics probes select.
pub mod aid {
    pub const MANAGEMENT: &[u8] = &[0xf0, 0x00, 0x00, 0x00, 0x00];
    pub const PIV: &[u8] = &[0xa0, 0x00, 0x00, 0x03, 0x08];
    pub const OATH: &[u8] = &[0xa0, 0x00, 0x00, 0x05, 0x27, 0x21, 0x01];
    pub const OPENPGP: &[u8] = &[0xd2, 0x76, 0x00, 0x01, 0x24, 0x01];
}

/// Reader name fragments that identify a security key.
const READER_NAME_HINTS: [&str; 2] = ["yubikey", "canokey"];

/// Access to smartcards through the system PC/SC service.
///
/// A fresh context is established per call so that a stopped or
/// restarted PC/SC daemon surfaces as a per-call failure instead of a
/// poisoned backend.
#[derive(Debug, Default)]
pub struct PcscBackend;

impl PcscBackend {
    pub fn new() -> Self {
        PcscBackend
    }

    fn context(&self) -> Result<Context> {
        Ok(Context::establish(Scope::User)?)
    }

    /// Names of all connected PC/SC readers, security key or not.
    pub fn list_readers(&self) -> Result<Vec<String>> {
        let ctx = self.context()?;
        let mut buf = vec![0u8; ctx.list_readers_len()?];
        let names = ctx
            .list_readers(&mut buf)?
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        Ok(names)
    }

    /// Connects to a reader and immediately disconnects.
    pub fn test_reader(&self, name: &str) -> Result<()> {
        let ctx = self.context()?;
        let name = reader_cstring(name)?;
        let card = ctx.connect(&name, ShareMode::Shared, Protocols::ANY)?;
        drop(card);
        Ok(())
    }

    /// Security keys among the connected readers.
    ///
    /// PC/SC exposes no USB descriptors, so the pid is recovered from
    /// the reader name where possible and left unset otherwise.
    pub fn list_devices(&self) -> Result<Vec<DeviceHandle>> {
        let mut devices = Vec::new();
        for name in self.list_readers()? {
            let lower = name.to_lowercase();
            if !READER_NAME_HINTS.iter().any(|hint| lower.contains(hint)) {
                continue;
            }
            devices.push(DeviceHandle::for_reader(
                product_id_from_reader_name(&name),
                name,
            ));
        }
        debug!(count = devices.len(), "security keys reachable over PC/SC");
        Ok(devices)
    }

    /// Opens a connection to the card behind a previously listed device.
    pub fn open(&self, device: &DeviceHandle) -> Result<ScardConnection> {
        let reader = device.reader_name().ok_or(Error::ForeignHandle)?;
        debug!(reader, "connecting over PC/SC");
        let ctx = self.context()?;
        let name = reader_cstring(reader)?;
        let card = ctx.connect(&name, ShareMode::Shared, Protocols::ANY)?;
        Ok(ScardConnection { card, _context: ctx })
    }
}

fn reader_cstring(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| Error::InvalidResponse("reader name contains NUL".into()))
}

fn family_from_reader_name(name: &str) -> Option<ProductFamily> {
    let lower = name.to_lowercase();
    if lower.contains("canokey") {
        Some(ProductFamily::CanoKey)
    } else if lower.contains("security key") {
        Some(ProductFamily::SecurityKey)
    } else if lower.contains("yubikey standard") {
        Some(ProductFamily::Standard)
    } else if lower.contains("yubikey neo") {
        Some(ProductFamily::Neo)
    } else if lower.contains("yubikey plus") {
        Some(ProductFamily::Plus)
    } else if lower.contains("yubikey") {
        Some(ProductFamily::YubiKey)
    } else {
        None
    }
}

fn interfaces_from_reader_name(name: &str) -> Option<UsbInterfaces> {
    name.split_whitespace()
        .find_map(UsbInterfaces::from_name_token)
}

/// Recovers a pid from tokens like "Yubico YubiKey OTP+FIDO+CCID 00 00".
fn product_id_from_reader_name(name: &str) -> Option<ProductId> {
    let family = family_from_reader_name(name)?;
    let interfaces = interfaces_from_reader_name(name)?;
    ProductId::from_family_and_interfaces(family, interfaces)
}

/// An open smartcard connection.
///
/// The card is disconnected when the connection goes out of scope.
pub struct ScardConnection {
    card: Card,
    _context: Context,
}

impl ScardConnection {
    /// Sends a short APDU, following 61xx response chaining, and returns
    /// the response body of a 9000 completion.
    pub fn transmit_apdu(
        &mut self,
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let apdu = build_apdu(cla, ins, p1, p2, data)?;
        let mut rbuf = [0u8; pcsc::MAX_BUFFER_SIZE];
        let mut reply = self.card.transmit(&apdu, &mut rbuf)?.to_vec();

        let mut response = Vec::new();
        loop {
            let (body, sw) = split_sw(&reply)?;
            response.extend_from_slice(body);
            match sw {
                SW_OK => return Ok(response),
                sw if sw & 0xff00 == 0x6100 => {
                    let le = (sw & 0x00ff) as u8;
                    let get_response = [0x00, INS_GET_RESPONSE, 0x00, 0x00, le];
                    reply = self.card.transmit(&get_response, &mut rbuf)?.to_vec();
                }
                sw => return Err(Error::Apdu { sw }),
            }
        }
    }

    /// Selects an application by AID.
    pub fn select(&mut self, aid: &[u8]) -> Result<Vec<u8>> {
        match self.transmit_apdu(0x00, INS_SELECT, 0x04, 0x00, aid) {
            Err(Error::Apdu {
                sw: 0x6a82 | 0x6999 | 0x6d00,
            }) => Err(Error::ApplicationNotAvailable),
            other => other,
        }
    }
}

impl ConfigRead for ScardConnection {
    fn select_management(&mut self) -> Result<()> {
        self.select(aid::MANAGEMENT).map(|_| ())
    }

    fn read_config_page(&mut self, page: u8) -> Result<Vec<u8>> {
        self.transmit_apdu(0x00, INS_READ_CONFIG, page, 0x00, &[])
    }
}

fn build_apdu(cla: u8, ins: u8, p1: u8, p2: u8, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() > 0xff {
        return Err(Error::InvalidResponse(format!(
            "APDU data too long: {} bytes",
            data.len()
        )));
    }
    // The length byte is always present; with no body it doubles as
    // the response-length request.
    let mut apdu = Vec::with_capacity(5 + data.len());
    apdu.extend_from_slice(&[cla, ins, p1, p2]);
    apdu.push(data.len() as u8);
    apdu.extend_from_slice(data);
    Ok(apdu)
}

fn split_sw(reply: &[u8]) -> Result<(&[u8], u16)> {
    if reply.len() < 2 {
        return Err(Error::InvalidResponse("reply shorter than status word".into()));
    }
    let (body, sw) = reply.split_at(reply.len() - 2);
    Ok((body, u16::from_be_bytes([sw[0], sw[1]])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apdu_layout() {
        assert_eq!(build_apdu(0, 0xa4, 4, 0, &[]).unwrap(), vec![0, 0xa4, 4, 0, 0]);
        assert_eq!(
            build_apdu(0, 0xa4, 4, 0, &[0xa0, 0x00]).unwrap(),
            vec![0, 0xa4, 4, 0, 2, 0xa0, 0x00]
        );
        assert!(build_apdu(0, 0, 0, 0, &[0u8; 0x100]).is_err());
    }

    #[test]
    fn test_status_word_split() {
        let (body, sw) = split_sw(&[1, 2, 3, 0x90, 0x00]).unwrap();
        assert_eq!(body, &[1, 2, 3]);
        assert_eq!(sw, 0x9000);
        assert!(split_sw(&[0x90]).is_err());
    }

    #[test]
    fn test_pid_recovery_from_reader_names() {
        assert_eq!(
            product_id_from_reader_name("Yubico YubiKey OTP+FIDO+CCID 00 00"),
            Some(ProductId(0x0407))
        );
        assert_eq!(
            product_id_from_reader_name("Canokey Pirate FIDO+CCID 01 00"),
            Some(ProductId(0x42d4))
        );
        assert_eq!(product_id_from_reader_name("Generic EMV Reader 00"), None);
    }
}
