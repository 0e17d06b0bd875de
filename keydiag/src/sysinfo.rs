//! Host facts for the report header.

/// Version line value for the report header.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Platform, architecture and privilege lines.
pub fn sys_info_lines() -> Vec<String> {
    vec![
        format!("Platform: {}", std::env::consts::OS),
        format!("Arch: {}", std::env::consts::ARCH),
        format!("Running as admin: {}", is_admin()),
    ]
}

#[cfg(unix)]
fn is_admin() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_admin() -> bool {
    false
}
