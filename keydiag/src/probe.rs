//! The application probe set.
//!
//! Every probe runs against an open connection and returns exactly one
//! [`ProbeOutcome`]; errors never cross a probe boundary. A failed
//! probe costs the report one line and the siblings still run.

use tracing::debug;

use keydiag_transport::{ProductFamily, device_name};

use crate::backend::{
    Ctap2Session, ManagementAccess, OathSession, OpenPgpSession, OtpSession, PivSession,
};
use crate::error::Error;

/// Lines for the report, or the contained failure.
#[derive(Debug)]
pub enum ProbeOutcome {
    Success(Vec<String>),
    Failure(Error),
}

/// The closed probe set, dispatched per transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    RawConfig,
    DeviceInfo,
    Piv,
    Oath,
    OpenPgp,
    OtpState,
    Ctap2,
}

impl ProbeKind {
    /// The single line a failed probe leaves behind.
    pub fn failure_line(self, err: &Error) -> String {
        match self {
            ProbeKind::RawConfig => {
                format!("\tFailed to read device config over management: {err}")
            }
            ProbeKind::DeviceInfo => format!("\tFailed to read device info: {err}"),
            ProbeKind::Piv => format!("\tPIV not accessible: {err}"),
            ProbeKind::Oath => format!("\tOATH not accessible: {err}"),
            ProbeKind::OpenPgp => format!("\tOpenPGP not accessible: {err}"),
            ProbeKind::OtpState => format!("\tCouldn't read OTP state: {err}"),
            ProbeKind::Ctap2 => format!("\tCouldn't get info: {err}"),
        }
    }
}

/// Renders one outcome into the device's report lines.
pub fn render(lines: &mut Vec<String>, kind: ProbeKind, outcome: ProbeOutcome) {
    match outcome {
        ProbeOutcome::Success(probe_lines) => lines.extend(probe_lines),
        ProbeOutcome::Failure(err) => {
            debug!(?kind, %err, "probe failed");
            lines.push(kind.failure_line(&err));
        }
    }
}

/// Runs the management pair: raw config page, then decoded info. The
/// two reads are independent; either may fail without hiding the
/// other's result.
pub fn management_probes<C: ManagementAccess + ?Sized>(
    lines: &mut Vec<String>,
    conn: &mut C,
    family: Option<ProductFamily>,
) {
    render(lines, ProbeKind::RawConfig, raw_config_probe(conn));
    render(lines, ProbeKind::DeviceInfo, device_info_probe(conn, family));
}

pub fn raw_config_probe<C: ManagementAccess + ?Sized>(conn: &mut C) -> ProbeOutcome {
    match conn.management().read_raw_config() {
        Ok(page) => ProbeOutcome::Success(vec![format!("\tRawInfo: {}", hex::encode(page))]),
        Err(err) => ProbeOutcome::Failure(err),
    }
}

pub fn device_info_probe<C: ManagementAccess + ?Sized>(
    conn: &mut C,
    family: Option<ProductFamily>,
) -> ProbeOutcome {
    match conn.management().read_device_info() {
        Ok(info) => ProbeOutcome::Success(vec![
            format!("\t{info}"),
            format!("\tDevice name: {}", device_name(&info, family)),
        ]),
        Err(err) => ProbeOutcome::Failure(err),
    }
}

pub fn piv_probe(session: &mut dyn PivSession) -> ProbeOutcome {
    match session.summary() {
        Ok(summary) => {
            let mut lines = vec!["\tPIV".to_string()];
            lines.extend(summary.lines().into_iter().map(|line| format!("\t\t{line}")));
            ProbeOutcome::Success(lines)
        }
        Err(err) => ProbeOutcome::Failure(err),
    }
}

pub fn oath_probe(session: &mut dyn OathSession) -> ProbeOutcome {
    match session.info() {
        Ok(info) => {
            let mut lines = vec!["\tOATH".to_string()];
            lines.extend(info.lines().into_iter().map(|line| format!("\t\t{line}")));
            ProbeOutcome::Success(lines)
        }
        Err(err) => ProbeOutcome::Failure(err),
    }
}

pub fn openpgp_probe(session: &mut dyn OpenPgpSession) -> ProbeOutcome {
    match session.read_info() {
        Ok(info) => {
            let mut lines = vec!["\tOpenPGP".to_string()];
            lines.extend(info.lines().into_iter().map(|line| format!("\t\t{line}")));
            ProbeOutcome::Success(lines)
        }
        Err(err) => ProbeOutcome::Failure(err),
    }
}

pub fn otp_state_probe(session: &mut dyn OtpSession) -> ProbeOutcome {
    match session.read_state() {
        Ok(state) => ProbeOutcome::Success(vec![format!("\tOTP: {state}")]),
        Err(err) => ProbeOutcome::Failure(err),
    }
}

/// getInfo, then the retry counters the options map announces. The PIN
/// and fingerprint lines carry no indentation. A counter read failing
/// after a successful getInfo keeps the lines already produced and
/// appends the failure line in place; nothing further is attempted.
pub fn ctap2_probe(session: &mut dyn Ctap2Session) -> ProbeOutcome {
    let info = match session.get_info() {
        Ok(info) => info,
        Err(err) => return ProbeOutcome::Failure(err),
    };
    let mut lines = vec![format!("\tCtap2Info: {info}")];

    if info.option("clientPin") == Some(true) {
        match session.pin_retries() {
            Ok(n) => lines.push(format!("PIN retries: {n}")),
            Err(err) => {
                lines.push(ProbeKind::Ctap2.failure_line(&err));
                return ProbeOutcome::Success(lines);
            }
        }
        match info.option("bioEnroll") {
            Some(true) => match session.uv_retries() {
                Ok(n) => lines.push(format!("Fingerprint retries: {n}")),
                Err(err) => lines.push(ProbeKind::Ctap2.failure_line(&err)),
            },
            Some(false) => lines.push("Fingerprints: Not configured".to_string()),
            None => {}
        }
    } else {
        lines.push("PIN: Not configured".to_string());
    }
    ProbeOutcome::Success(lines)
}
