//! Report assembly: per-device connection probing, the three transport
//! sections, and the orchestrator.

use tracing::warn;

use keydiag_transport::{HidFidoBackend, HidOtpBackend, PcscBackend};

use crate::backend::{FidoBackend, OtpBackend, SmartCardBackend};
use crate::error::Error;
use crate::probe::{self, ProbeKind};
use crate::report::Report;
use crate::sysinfo;

/// The three device transports, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    SmartCard,
    Otp,
    Fido,
}

impl Transport {
    fn section_header(self) -> &'static str {
        match self {
            Transport::SmartCard => "Detected security keys over PC/SC:",
            Transport::Otp => "Detected security keys over HID OTP:",
            Transport::Fido => "Detected security keys over HID FIDO:",
        }
    }

    fn connection_failure_line(self, err: &Error) -> String {
        match self {
            Transport::SmartCard => format!("\tPC/SC connection failure: {err}"),
            Transport::Otp => format!("\tOTP connection failure: {err}"),
            Transport::Fido => format!("\tFIDO connection failure: {err}"),
        }
    }

    fn enumeration_failure_line(self, err: &Error) -> String {
        match self {
            Transport::SmartCard => format!("PC/SC failure: {err}"),
            Transport::Otp => format!("\tHID OTP backend failure: {err}"),
            Transport::Fido => format!("\tHID FIDO backend failure: {err}"),
        }
    }
}

/// Reader health lines, then one probed block per smartcard device.
///
/// A failure listing readers or enumerating devices collapses the
/// whole section to the failure line; partial reader output is
/// discarded rather than shown without the device half.
fn smartcard_section(backend: &dyn SmartCardBackend) -> Vec<String> {
    let mut lines = Vec::new();

    match backend.list_readers() {
        Ok(readers) => {
            lines.push("Detected PC/SC readers:".to_string());
            for reader in readers {
                let result = match backend.test_reader(&reader) {
                    Ok(()) => "Success".to_string(),
                    Err(err) => err.to_string(),
                };
                lines.push(format!("\t{reader} (connect: {result})"));
            }
            lines.push(String::new());
        }
        Err(err) => {
            warn!(%err, "PC/SC reader listing failed");
            return vec![
                Transport::SmartCard.enumeration_failure_line(&err),
                String::new(),
            ];
        }
    }

    lines.push(Transport::SmartCard.section_header().to_string());
    match backend.list_devices() {
        Ok(devices) => {
            for device in &devices {
                lines.push(format!("\t{device}"));
                match backend.open(device) {
                    Ok(mut conn) => {
                        probe::management_probes(&mut lines, &mut *conn, device.family());
                        probe::render(
                            &mut lines,
                            ProbeKind::Piv,
                            probe::piv_probe(&mut *conn.piv()),
                        );
                        probe::render(
                            &mut lines,
                            ProbeKind::Oath,
                            probe::oath_probe(&mut *conn.oath()),
                        );
                        probe::render(
                            &mut lines,
                            ProbeKind::OpenPgp,
                            probe::openpgp_probe(&mut *conn.openpgp()),
                        );
                    }
                    Err(err) => {
                        warn!(%err, %device, "PC/SC connection failed");
                        lines.push(Transport::SmartCard.connection_failure_line(&err));
                    }
                }
                lines.push(String::new());
            }
        }
        Err(err) => {
            warn!(%err, "PC/SC device enumeration failed");
            return vec![
                Transport::SmartCard.enumeration_failure_line(&err),
                String::new(),
            ];
        }
    }

    lines.push(String::new());
    lines
}

/// One probed block per device on the OTP interface.
fn otp_section(backend: &dyn OtpBackend) -> Vec<String> {
    let mut lines = vec![Transport::Otp.section_header().to_string()];
    match backend.list_devices() {
        Ok(devices) => {
            for device in &devices {
                lines.push(format!("\t{device}"));
                match backend.open(device) {
                    Ok(mut conn) => {
                        probe::management_probes(&mut lines, &mut *conn, device.family());
                        probe::render(
                            &mut lines,
                            ProbeKind::OtpState,
                            probe::otp_state_probe(&mut *conn.otp()),
                        );
                    }
                    Err(err) => {
                        warn!(%err, %device, "OTP connection failed");
                        lines.push(Transport::Otp.connection_failure_line(&err));
                    }
                }
                lines.push(String::new());
            }
        }
        Err(err) => {
            warn!(%err, "HID OTP enumeration failed");
            lines.push(Transport::Otp.enumeration_failure_line(&err));
        }
    }
    lines.push(String::new());
    lines
}

/// One probed block per device on the FIDO interface. The CTAPHID
/// handshake metadata lands right after the device line, before the
/// management pair.
fn fido_section(backend: &dyn FidoBackend) -> Vec<String> {
    let mut lines = vec![Transport::Fido.section_header().to_string()];
    match backend.list_devices() {
        Ok(devices) => {
            for device in &devices {
                lines.push(format!("\t{device}"));
                match backend.open(device) {
                    Ok(mut conn) => {
                        lines.push(format!("CTAP device version: {}", conn.device_version()));
                        lines.push(format!(
                            "CTAPHID protocol version: {}",
                            conn.protocol_version()
                        ));
                        lines.push(format!("Capabilities: {}", conn.capabilities()));
                        probe::management_probes(&mut lines, &mut *conn, device.family());
                        probe::render(
                            &mut lines,
                            ProbeKind::Ctap2,
                            probe::ctap2_probe(&mut *conn.ctap2()),
                        );
                    }
                    Err(err) => {
                        warn!(%err, %device, "FIDO connection failed");
                        lines.push(Transport::Fido.connection_failure_line(&err));
                    }
                }
                lines.push(String::new());
            }
        }
        Err(err) => {
            warn!(%err, "HID FIDO enumeration failed");
            lines.push(Transport::Fido.enumeration_failure_line(&err));
        }
    }
    lines
}

/// Builds the full diagnostics report from the given backends.
///
/// Total: every failure is rendered into the text, never returned.
pub fn diagnostics_report_with(
    smartcard: &dyn SmartCardBackend,
    otp: &dyn OtpBackend,
    fido: &dyn FidoBackend,
) -> String {
    let mut report = Report::new();
    report.push(format!("keydiag: {}", sysinfo::version()));
    report.extend(sysinfo::sys_info_lines());
    report.blank();

    report.extend(smartcard_section(smartcard));
    report.extend(otp_section(otp));
    report.extend(fido_section(fido));
    report.push("End of diagnostics");
    report.into_text()
}

/// Runs the full probe battery against the real hardware backends.
pub fn generate_diagnostics_report() -> String {
    diagnostics_report_with(
        &PcscBackend::new(),
        &HidOtpBackend::new(),
        &HidFidoBackend::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_line_formats_per_transport() {
        let err = Error::Connection("device busy".into());
        assert_eq!(
            Transport::SmartCard.connection_failure_line(&err),
            "\tPC/SC connection failure: device busy"
        );
        assert_eq!(
            Transport::Fido.connection_failure_line(&err),
            "\tFIDO connection failure: device busy"
        );
        assert_eq!(
            Transport::SmartCard.enumeration_failure_line(&err),
            "PC/SC failure: device busy"
        );
        assert_eq!(
            Transport::Otp.enumeration_failure_line(&err),
            "\tHID OTP backend failure: device busy"
        );
    }
}
