//! Decoded management configuration.

use std::fmt;

use crate::device::{ProductFamily, Version};
use crate::error::{Error, Result};
use crate::tlv;

mod tags {
    pub const SERIAL: u8 = 0x02;
    pub const FORM_FACTOR: u8 = 0x04;
    pub const VERSION: u8 = 0x05;
    pub const CONFIG_LOCKED: u8 = 0x0a;
}

/// Physical form factor reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFactor {
    Unknown,
    UsbAKeychain,
    UsbANano,
    UsbCKeychain,
    UsbCNano,
    UsbCLightning,
    UsbABio,
    UsbCBio,
}

impl FormFactor {
    pub fn from_code(code: u8) -> Self {
        match code & 0x0f {
            0x01 => FormFactor::UsbAKeychain,
            0x02 => FormFactor::UsbANano,
            0x03 => FormFactor::UsbCKeychain,
            0x04 => FormFactor::UsbCNano,
            0x05 => FormFactor::UsbCLightning,
            0x06 => FormFactor::UsbABio,
            0x07 => FormFactor::UsbCBio,
            _ => FormFactor::Unknown,
        }
    }
}

impl fmt::Display for FormFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormFactor::Unknown => "Unknown",
            FormFactor::UsbAKeychain => "USB-A Keychain",
            FormFactor::UsbANano => "USB-A Nano",
            FormFactor::UsbCKeychain => "USB-C Keychain",
            FormFactor::UsbCNano => "USB-C Nano",
            FormFactor::UsbCLightning => "USB-C Lightning",
            FormFactor::UsbABio => "USB-A Bio",
            FormFactor::UsbCBio => "USB-C Bio",
        })
    }
}

/// Decoded fields of a management config page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub version: Option<Version>,
    pub serial: Option<u32>,
    pub form_factor: FormFactor,
    pub is_locked: bool,
}

impl DeviceInfo {
    /// Decodes a config page: one length byte, then a TLV map.
    ///
    /// Tags other than the ones named in `tags` are carried by newer
    /// firmware and skipped here.
    pub fn parse(page: &[u8]) -> Result<Self> {
        let (&length, rest) = page
            .split_first()
            .ok_or_else(|| Error::InvalidResponse("empty config page".into()))?;
        let length = length as usize;
        if rest.len() < length {
            return Err(Error::InvalidResponse(format!(
                "config page truncated: {} < {length}",
                rest.len()
            )));
        }
        let entries = tlv::parse(&rest[..length])?;

        let mut info = DeviceInfo {
            version: None,
            serial: None,
            form_factor: FormFactor::Unknown,
            is_locked: false,
        };
        for (tag, value) in &entries {
            match *tag {
                tags::SERIAL => {
                    let bytes: [u8; 4] = value.as_slice().try_into().map_err(|_| {
                        Error::InvalidResponse(format!("serial is {} bytes", value.len()))
                    })?;
                    let serial = u32::from_be_bytes(bytes);
                    info.serial = (serial != 0).then_some(serial);
                }
                tags::FORM_FACTOR => {
                    info.form_factor = value
                        .first()
                        .map(|&code| FormFactor::from_code(code))
                        .unwrap_or(FormFactor::Unknown);
                }
                tags::VERSION => info.version = Some(Version::from_bytes(value)?),
                tags::CONFIG_LOCKED => {
                    info.is_locked = value.first().copied().unwrap_or(0) == 1;
                }
                _ => {}
            }
        }
        Ok(info)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceInfo(version=")?;
        match self.version {
            Some(version) => write!(f, "{version}")?,
            None => f.write_str("unknown")?,
        }
        f.write_str(", serial=")?;
        match self.serial {
            Some(serial) => write!(f, "{serial}")?,
            None => f.write_str("none")?,
        }
        write!(f, ", form_factor={}, locked={})", self.form_factor, self.is_locked)
    }
}

/// Marketing name for a device, from its decoded info and family.
///
/// The YubiKey family carries the firmware major in the product name;
/// other families use the family name as-is.
pub fn device_name(info: &DeviceInfo, family: Option<ProductFamily>) -> String {
    let base = match family {
        Some(family) => family.display_name(),
        None => "Security Key",
    };
    match (family, info.version) {
        (Some(ProductFamily::YubiKey), Some(version)) => format!("{base} {}", version.major),
        _ => base.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> Vec<u8> {
        let body = [
            0x02, 0x04, 0x00, 0x93, 0xb8, 0x76, // serial 9681014
            0x04, 0x01, 0x01, // USB-A keychain
            0x05, 0x03, 0x05, 0x04, 0x03, // version 5.4.3
            0x0a, 0x01, 0x00, // not locked
        ];
        let mut page = vec![body.len() as u8];
        page.extend_from_slice(&body);
        page
    }

    #[test]
    fn test_parses_config_page() {
        let info = DeviceInfo::parse(&sample_page()).unwrap();
        assert_eq!(info.version, Some(Version::new(5, 4, 3)));
        assert_eq!(info.serial, Some(9681014));
        assert_eq!(info.form_factor, FormFactor::UsbAKeychain);
        assert!(!info.is_locked);
        assert_eq!(
            info.to_string(),
            "DeviceInfo(version=5.4.3, serial=9681014, form_factor=USB-A Keychain, locked=false)"
        );
    }

    #[test]
    fn test_zero_serial_reads_as_absent() {
        let page = [6, 0x02, 0x04, 0, 0, 0, 0].to_vec();
        let info = DeviceInfo::parse(&page).unwrap();
        assert_eq!(info.serial, None);
    }

    #[test]
    fn test_truncated_page_is_rejected() {
        let mut page = sample_page();
        page[0] += 4;
        assert!(DeviceInfo::parse(&page).is_err());
        assert!(DeviceInfo::parse(&[]).is_err());
    }

    #[test]
    fn test_names_follow_family_conventions() {
        let info = DeviceInfo::parse(&sample_page()).unwrap();
        assert_eq!(device_name(&info, Some(ProductFamily::YubiKey)), "YubiKey 5");
        assert_eq!(device_name(&info, Some(ProductFamily::CanoKey)), "CanoKey");
        assert_eq!(device_name(&info, None), "Security Key");

        let no_version = DeviceInfo {
            version: None,
            serial: None,
            form_factor: FormFactor::Unknown,
            is_locked: false,
        };
        assert_eq!(device_name(&no_version, Some(ProductFamily::YubiKey)), "YubiKey");
    }
}
