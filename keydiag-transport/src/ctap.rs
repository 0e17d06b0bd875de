//! CTAP2 probing: getInfo and the ClientPin retry counters.

use std::fmt;

use ciborium::value::Value;

use crate::error::{Error, Result};
use crate::hid::FidoHidConnection;

const CMD_GET_INFO: u8 = 0x04;
const CMD_CLIENT_PIN: u8 = 0x06;

const CLIENT_PIN_PROTOCOL_V1: u8 = 1;
const SUB_CMD_GET_PIN_RETRIES: u8 = 0x01;
const SUB_CMD_GET_UV_RETRIES: u8 = 0x07;

const RESP_PIN_RETRIES: u8 = 0x03;
const RESP_UV_RETRIES: u8 = 0x05;

// getInfo response map keys.
const KEY_VERSIONS: u64 = 1;
const KEY_EXTENSIONS: u64 = 2;
const KEY_AAGUID: u64 = 3;
const KEY_OPTIONS: u64 = 4;

/// A CTAP2 status byte other than CTAP2_OK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtapError(pub u8);

impl CtapError {
    fn name(self) -> &'static str {
        match self.0 {
            0x01 => "INVALID_COMMAND",
            0x02 => "INVALID_PARAMETER",
            0x03 => "INVALID_LENGTH",
            0x04 => "INVALID_SEQ",
            0x05 => "TIMEOUT",
            0x06 => "CHANNEL_BUSY",
            0x11 => "CBOR_UNEXPECTED_TYPE",
            0x12 => "INVALID_CBOR",
            0x14 => "MISSING_PARAMETER",
            0x26 => "UNSUPPORTED_OPTION",
            0x27 => "INVALID_OPTION",
            0x2d => "NO_CREDENTIALS",
            0x31 => "PIN_INVALID",
            0x32 => "PIN_BLOCKED",
            0x33 => "PIN_AUTH_INVALID",
            0x34 => "PIN_AUTH_BLOCKED",
            0x35 => "PIN_NOT_SET",
            0x36 => "PUAT_REQUIRED",
            0x39 => "NOT_ALLOWED",
            _ => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for CtapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CTAP error: 0x{:02X} - {}", self.0, self.name())
    }
}

/// Decoded getInfo response, reduced to what the report shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ctap2Info {
    pub versions: Vec<String>,
    pub extensions: Vec<String>,
    pub aaguid: Vec<u8>,
    /// Sorted by key so the rendering is deterministic.
    pub options: Vec<(String, bool)>,
}

impl Ctap2Info {
    pub(crate) fn parse(payload: &[u8]) -> Result<Self> {
        let value: Value = ciborium::de::from_reader(payload)
            .map_err(|e| Error::InvalidResponse(format!("getInfo CBOR: {e}")))?;
        let Value::Map(entries) = value else {
            return Err(Error::InvalidResponse("getInfo is not a map".into()));
        };
        let mut info = Ctap2Info::default();
        for (key, value) in entries {
            let Some(key) = key.as_integer().and_then(|i| u64::try_from(i).ok()) else {
                continue;
            };
            match key {
                KEY_VERSIONS => info.versions = text_array(&value),
                KEY_EXTENSIONS => info.extensions = text_array(&value),
                KEY_AAGUID => info.aaguid = value.as_bytes().cloned().unwrap_or_default(),
                KEY_OPTIONS => info.options = bool_map(&value),
                _ => {}
            }
        }
        Ok(info)
    }

    pub fn option(&self, name: &str) -> Option<bool> {
        self.options
            .iter()
            .find(|(key, _)| key == name)
            .map(|&(_, value)| value)
    }
}

impl fmt::Display for Ctap2Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{versions: [{}], extensions: [{}], aaguid: {}, options: {{",
            self.versions.join(", "),
            self.extensions.join(", "),
            hex::encode(&self.aaguid),
        )?;
        for (i, (key, value)) in self.options.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}}")
    }
}

fn text_array(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_text().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

fn bool_map(value: &Value) -> Vec<(String, bool)> {
    let mut options: Vec<(String, bool)> = value
        .as_map()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(key, value)| Some((key.as_text()?.to_owned(), value.as_bool()?)))
                .collect()
        })
        .unwrap_or_default();
    options.sort();
    options
}

/// CTAP2 over an open FIDO connection.
pub struct Ctap2Session<'a> {
    conn: &'a mut FidoHidConnection,
}

impl<'a> Ctap2Session<'a> {
    pub fn new(conn: &'a mut FidoHidConnection) -> Self {
        Ctap2Session { conn }
    }

    pub fn get_info(&mut self) -> Result<Ctap2Info> {
        let response = self.conn.ctap_cbor(CMD_GET_INFO, &[])?;
        Ctap2Info::parse(&response)
    }

    pub fn pin_retries(&mut self) -> Result<u64> {
        self.client_pin_counter(SUB_CMD_GET_PIN_RETRIES, RESP_PIN_RETRIES)
    }

    pub fn uv_retries(&mut self) -> Result<u64> {
        self.client_pin_counter(SUB_CMD_GET_UV_RETRIES, RESP_UV_RETRIES)
    }

    /// ClientPin subcommands that take no PIN protocol material:
    /// request is {1: protocol, 2: subcommand}, response carries the
    /// counter under `response_key`.
    fn client_pin_counter(&mut self, sub_command: u8, response_key: u8) -> Result<u64> {
        let request = Value::Map(vec![
            (Value::from(1), Value::from(CLIENT_PIN_PROTOCOL_V1)),
            (Value::from(2), Value::from(sub_command)),
        ]);
        let mut encoded = Vec::new();
        ciborium::ser::into_writer(&request, &mut encoded)
            .map_err(|e| Error::Encode(e.to_string()))?;
        let response = self.conn.ctap_cbor(CMD_CLIENT_PIN, &encoded)?;
        let value: Value = ciborium::de::from_reader(response.as_slice())
            .map_err(|e| Error::InvalidResponse(format!("clientPin CBOR: {e}")))?;
        value
            .as_map()
            .and_then(|entries| {
                entries.iter().find_map(|(key, value)| {
                    let key = key.as_integer().and_then(|i| u8::try_from(i).ok())?;
                    (key == response_key)
                        .then(|| value.as_integer().and_then(|i| u64::try_from(i).ok()))
                        .flatten()
                })
            })
            .ok_or_else(|| Error::InvalidResponse("retry counter missing".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(value, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_parses_get_info() {
        let aaguid: Vec<u8> = (1..=16).collect();
        let payload = encode(&Value::Map(vec![
            (
                Value::from(1),
                Value::Array(vec![Value::from("U2F_V2"), Value::from("FIDO_2_0")]),
            ),
            (Value::from(2), Value::Array(vec![Value::from("hmac-secret")])),
            (Value::from(3), Value::Bytes(aaguid.clone())),
            (
                Value::from(4),
                Value::Map(vec![
                    (Value::from("rk"), Value::from(true)),
                    (Value::from("up"), Value::from(true)),
                    (Value::from("clientPin"), Value::from(false)),
                ]),
            ),
        ]));

        let info = Ctap2Info::parse(&payload).unwrap();
        assert_eq!(info.versions, vec!["U2F_V2", "FIDO_2_0"]);
        assert_eq!(info.aaguid, aaguid);
        assert_eq!(info.option("clientPin"), Some(false));
        assert_eq!(info.option("rk"), Some(true));
        assert_eq!(info.option("bioEnroll"), None);
        assert_eq!(
            info.to_string(),
            "{versions: [U2F_V2, FIDO_2_0], extensions: [hmac-secret], \
             aaguid: 0102030405060708090a0b0c0d0e0f10, \
             options: {clientPin: false, rk: true, up: true}}"
        );
    }

    #[test]
    fn test_missing_fields_default_empty() {
        let payload = encode(&Value::Map(vec![(
            Value::from(1),
            Value::Array(vec![Value::from("FIDO_2_0")]),
        )]));
        let info = Ctap2Info::parse(&payload).unwrap();
        assert!(info.extensions.is_empty());
        assert!(info.aaguid.is_empty());
        assert!(info.options.is_empty());
        assert_eq!(
            info.to_string(),
            "{versions: [FIDO_2_0], extensions: [], aaguid: , options: {}}"
        );
    }

    #[test]
    fn test_non_map_get_info_is_rejected() {
        let payload = encode(&Value::from(17));
        assert!(Ctap2Info::parse(&payload).is_err());
    }

    #[test]
    fn test_ctap_error_names() {
        assert_eq!(
            CtapError(0x31).to_string(),
            "CTAP error: 0x31 - PIN_INVALID"
        );
        assert_eq!(
            CtapError(0xf5).to_string(),
            "CTAP error: 0xF5 - UNKNOWN_ERROR"
        );
    }
}
