#![warn(unused_extern_crates)]

//! # keydiag
//!
//! Diagnostics aggregator for hardware security keys. Enumerates every
//! reachable device over PC/SC, HID OTP and HID FIDO, probes the
//! applications each transport can reach (management, PIV, OATH,
//! OpenPGP, OTP state, CTAP2) and renders one tab-indented text report.
//!
//! Failures are contained where they happen and show up as report
//! text; [`generate_diagnostics_report`] itself never fails.
//!
//! ## Architecture
//!
//! - **Report**: append-only line buffer, joined with newlines
//! - **Probes**: closed application probe set, one contained outcome each
//! - **Backends**: trait seams per transport; the hardware
//!   implementations live in `keydiag-transport`, tests plug in mocks
//!
//! ## Example
//!
//! ```no_run
//! let report = keydiag::generate_diagnostics_report();
//! print!("{report}");
//! ```

pub mod backend;
pub mod diag;
pub mod error;
pub mod probe;
pub mod report;
pub mod sysinfo;

// Seam implementations on the keydiag-transport types
mod hardware;

// Re-export main types at root level for convenience
pub use diag::{Transport, diagnostics_report_with, generate_diagnostics_report};
pub use error::{Error, Result};
pub use report::Report;

// Device vocabulary from the transport crate, for seam implementors
pub use keydiag_transport::{
    Ctap2Info, DeviceHandle, DeviceInfo, FormFactor, ManagementKeyType, OathInfo, OpenPgpInfo,
    OtpState, PivSummary, ProductFamily, ProductId, UsbInterfaces, Version, device_name,
};
