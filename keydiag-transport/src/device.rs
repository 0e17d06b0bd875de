//! USB product vocabulary shared by all transports.
//!
//! Security keys expose one USB product id per combination of enabled
//! interfaces, so a pid maps back to both the hardware family and the
//! interface set. The table below covers the products the diagnostics
//! tooling knows how to name.

use std::ffi::{CStr, CString};
use std::fmt;

use crate::error::{Error, Result};

/// USB interfaces a product exposes, as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbInterfaces(u8);

impl UsbInterfaces {
    pub const OTP: UsbInterfaces = UsbInterfaces(0x01);
    pub const FIDO: UsbInterfaces = UsbInterfaces(0x02);
    pub const CCID: UsbInterfaces = UsbInterfaces(0x04);

    pub fn union(self, other: Self) -> Self {
        UsbInterfaces(self.0 | other.0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Parses a `+`-joined interface list such as `OTP+FIDO+CCID`.
    ///
    /// Reader names embed the enabled interfaces in this form; any token
    /// that is not exactly an interface list yields `None`.
    pub fn from_name_token(token: &str) -> Option<Self> {
        let mut interfaces = UsbInterfaces(0);
        for part in token.split('+') {
            interfaces = interfaces.union(match part {
                "OTP" => UsbInterfaces::OTP,
                "FIDO" | "U2F" => UsbInterfaces::FIDO,
                "CCID" => UsbInterfaces::CCID,
                _ => return None,
            });
        }
        Some(interfaces)
    }
}

impl fmt::Display for UsbInterfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (mask, name) in [
            (UsbInterfaces::OTP, "OTP"),
            (UsbInterfaces::FIDO, "FIDO"),
            (UsbInterfaces::CCID, "CCID"),
        ] {
            if self.contains(mask) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Hardware platform a product belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFamily {
    Standard,
    Neo,
    SecurityKey,
    Plus,
    YubiKey,
    CanoKey,
}

impl ProductFamily {
    pub fn display_name(self) -> &'static str {
        match self {
            ProductFamily::Standard => "YubiKey Standard",
            ProductFamily::Neo => "YubiKey NEO",
            ProductFamily::SecurityKey => "Security Key by Yubico",
            ProductFamily::Plus => "YubiKey Plus",
            ProductFamily::YubiKey => "YubiKey",
            ProductFamily::CanoKey => "CanoKey",
        }
    }
}

impl fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Known products: pid, family and the interface set the pid implies.
const KNOWN_PRODUCTS: &[(u16, ProductFamily, UsbInterfaces)] = &[
    (0x0010, ProductFamily::Standard, UsbInterfaces(0x01)),
    (0x0110, ProductFamily::Neo, UsbInterfaces(0x01)),
    (0x0111, ProductFamily::Neo, UsbInterfaces(0x05)),
    (0x0112, ProductFamily::Neo, UsbInterfaces(0x04)),
    (0x0113, ProductFamily::Neo, UsbInterfaces(0x02)),
    (0x0114, ProductFamily::Neo, UsbInterfaces(0x03)),
    (0x0115, ProductFamily::Neo, UsbInterfaces(0x06)),
    (0x0116, ProductFamily::Neo, UsbInterfaces(0x07)),
    (0x0120, ProductFamily::SecurityKey, UsbInterfaces(0x02)),
    (0x0401, ProductFamily::YubiKey, UsbInterfaces(0x01)),
    (0x0402, ProductFamily::YubiKey, UsbInterfaces(0x02)),
    (0x0403, ProductFamily::YubiKey, UsbInterfaces(0x03)),
    (0x0404, ProductFamily::YubiKey, UsbInterfaces(0x04)),
    (0x0405, ProductFamily::YubiKey, UsbInterfaces(0x05)),
    (0x0406, ProductFamily::YubiKey, UsbInterfaces(0x06)),
    (0x0407, ProductFamily::YubiKey, UsbInterfaces(0x07)),
    (0x0410, ProductFamily::Plus, UsbInterfaces(0x03)),
    (0x42d4, ProductFamily::CanoKey, UsbInterfaces(0x06)),
];

/// USB product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductId(pub u16);

impl ProductId {
    /// Family for a known pid, `None` for products not in the table.
    pub fn family(self) -> Option<ProductFamily> {
        KNOWN_PRODUCTS
            .iter()
            .find(|(pid, _, _)| *pid == self.0)
            .map(|&(_, family, _)| family)
    }

    /// Interface set a known pid implies.
    pub fn usb_interfaces(self) -> Option<UsbInterfaces> {
        KNOWN_PRODUCTS
            .iter()
            .find(|(pid, _, _)| *pid == self.0)
            .map(|&(_, _, interfaces)| interfaces)
    }

    /// Reverse lookup used when a pid has to be recovered from a reader
    /// name instead of a USB descriptor.
    pub fn from_family_and_interfaces(
        family: ProductFamily,
        interfaces: UsbInterfaces,
    ) -> Option<ProductId> {
        KNOWN_PRODUCTS
            .iter()
            .find(|&&(_, f, i)| f == family && i == interfaces)
            .map(|&(pid, _, _)| ProductId(pid))
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// Three-part firmware version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Reads a version triple from the first three bytes of a reply.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 3 {
            return Err(Error::InvalidResponse(format!(
                "version needs 3 bytes, got {}",
                data.len()
            )));
        }
        Ok(Version::new(data[0], data[1], data[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// How a backend finds its way back to an enumerated device.
#[derive(Debug, Clone)]
pub(crate) enum Selector {
    Reader(String),
    HidPath(CString),
}

/// An enumerated device, identified per backend.
///
/// Carries the product id when the backend could determine one, and a
/// human-readable fingerprint (reader name or HID path) that makes the
/// device recognizable in the report.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    pid: Option<ProductId>,
    fingerprint: String,
    selector: Option<Selector>,
}

impl DeviceHandle {
    /// Handle without a backend selector; connections cannot be opened
    /// from it. Intended for tests.
    pub fn new(pid: Option<ProductId>, fingerprint: impl Into<String>) -> Self {
        DeviceHandle {
            pid,
            fingerprint: fingerprint.into(),
            selector: None,
        }
    }

    pub(crate) fn for_reader(pid: Option<ProductId>, name: String) -> Self {
        DeviceHandle {
            pid,
            fingerprint: name.clone(),
            selector: Some(Selector::Reader(name)),
        }
    }

    pub(crate) fn for_hid_path(pid: Option<ProductId>, path: CString) -> Self {
        DeviceHandle {
            pid,
            fingerprint: path.to_string_lossy().into_owned(),
            selector: Some(Selector::HidPath(path)),
        }
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.pid
    }

    pub fn family(&self) -> Option<ProductFamily> {
        self.pid.and_then(ProductId::family)
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub(crate) fn reader_name(&self) -> Option<&str> {
        match &self.selector {
            Some(Selector::Reader(name)) => Some(name),
            _ => None,
        }
    }

    pub(crate) fn hid_path(&self) -> Option<&CStr> {
        match &self.selector {
            Some(Selector::HidPath(path)) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device(pid={:04x}, fingerprint={})",
            self.pid.map(|p| p.0).unwrap_or(0),
            self.fingerprint
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pid_derivations() {
        let pid = ProductId(0x0407);
        assert_eq!(pid.family(), Some(ProductFamily::YubiKey));
        assert_eq!(
            pid.usb_interfaces(),
            Some(UsbInterfaces::OTP.union(UsbInterfaces::FIDO).union(UsbInterfaces::CCID))
        );

        let pid = ProductId(0x42d4);
        assert_eq!(pid.family(), Some(ProductFamily::CanoKey));
        assert_eq!(
            pid.usb_interfaces(),
            Some(UsbInterfaces::FIDO.union(UsbInterfaces::CCID))
        );
    }

    #[test]
    fn test_unknown_pid_has_no_family() {
        assert_eq!(ProductId(0xbeef).family(), None);
        assert_eq!(ProductId(0xbeef).usb_interfaces(), None);
    }

    #[test]
    fn test_pid_recovered_from_family_and_interfaces() {
        let interfaces = UsbInterfaces::from_name_token("OTP+FIDO+CCID").unwrap();
        assert_eq!(
            ProductId::from_family_and_interfaces(ProductFamily::YubiKey, interfaces),
            Some(ProductId(0x0407))
        );
        assert_eq!(
            ProductId::from_family_and_interfaces(ProductFamily::SecurityKey, UsbInterfaces::FIDO),
            Some(ProductId(0x0120))
        );
    }

    #[test]
    fn test_interface_token_round_trip() {
        let interfaces = UsbInterfaces::from_name_token("OTP+FIDO+CCID").unwrap();
        assert_eq!(interfaces.to_string(), "OTP+FIDO+CCID");
        assert!(UsbInterfaces::from_name_token("00").is_none());
        assert!(UsbInterfaces::from_name_token("CCID").is_some());
    }

    #[test]
    fn test_version_from_bytes() {
        let version = Version::from_bytes(&[5, 4, 3, 0xff]).unwrap();
        assert_eq!(version, Version::new(5, 4, 3));
        assert_eq!(version.to_string(), "5.4.3");
        assert!(Version::from_bytes(&[5, 4]).is_err());
    }

    #[test]
    fn test_handle_display_uses_zero_for_missing_pid() {
        let handle = DeviceHandle::new(Some(ProductId(0x0407)), "reader 0");
        assert_eq!(handle.to_string(), "Device(pid=0407, fingerprint=reader 0)");

        let handle = DeviceHandle::new(None, "reader 1");
        assert_eq!(handle.to_string(), "Device(pid=0000, fingerprint=reader 1)");
    }
}
