//! Hardware smoke tests.
//!
//! These need a physical security key attached, so they are ignored by
//! default. Run with: cargo test -- --ignored
//!
//! The key is a shared resource; everything here is serialized.

use serial_test::serial;

use keydiag_transport::{
    HidFidoBackend, HidOtpBackend, ManagementSession, OtpSession, PcscBackend, device_name,
};

#[test]
#[ignore] // Requires an attached security key
#[serial]
fn test_enumerate_all_transports() {
    let readers = PcscBackend::new().list_readers().unwrap();
    println!("PC/SC readers: {readers:?}");

    for handle in HidOtpBackend::new().list_devices().unwrap() {
        println!("OTP: {handle}");
    }
    for handle in HidFidoBackend::new().list_devices().unwrap() {
        println!("FIDO: {handle}");
    }
}

#[test]
#[ignore] // Requires an attached security key
#[serial]
fn test_fido_init_handshake() {
    let backend = HidFidoBackend::new();
    let devices = backend.list_devices().unwrap();
    if devices.is_empty() {
        println!("No FIDO devices found, skipping test");
        return;
    }

    let conn = backend.open(&devices[0]).unwrap();
    println!(
        "device version {}, protocol {}, capabilities {:#04x}",
        conn.device_version(),
        conn.protocol_version(),
        conn.capabilities()
    );
    assert!(conn.protocol_version() >= 1);
}

#[test]
#[ignore] // Requires an attached security key
#[serial]
fn test_smartcard_device_info() {
    let backend = PcscBackend::new();
    let devices = backend.list_devices().unwrap();
    if devices.is_empty() {
        println!("No smartcard devices found, skipping test");
        return;
    }

    let mut conn = backend.open(&devices[0]).unwrap();
    let mut mgmt = ManagementSession::new(&mut conn).unwrap();
    let raw = mgmt.read_raw_config().unwrap();
    assert!(!raw.is_empty());

    let info = mgmt.read_device_info().unwrap();
    println!("{} ({info})", device_name(&info, devices[0].family()));
}

#[test]
#[ignore] // Requires an attached security key
#[serial]
fn test_otp_status() {
    let backend = HidOtpBackend::new();
    let devices = backend.list_devices().unwrap();
    if devices.is_empty() {
        println!("No OTP devices found, skipping test");
        return;
    }

    let mut conn = backend.open(&devices[0]).unwrap();
    let state = OtpSession::new(&mut conn).read_state().unwrap();
    println!("{state}");
}
