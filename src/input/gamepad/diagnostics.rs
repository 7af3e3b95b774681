//! Gamepad diagnostics for troubleshooting detection and mapping issues

use tracing::info;

use super::backend::{Backend, DeviceHandle, DeviceInfo};
use super::synth::candidate_mapping;

/// One device as seen by the backend
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub handle: DeviceHandle,
    pub info: DeviceInfo,
    /// Generated mapping suggestion for devices without a layout
    pub suggestion: Option<String>,
}

/// Describe every device the backend can currently see
pub fn collect_device_reports<B: Backend + ?Sized>(backend: &B) -> Vec<DeviceReport> {
    backend
        .enumerate()
        .into_iter()
        .filter_map(|handle| {
            let info = backend.describe(handle)?;
            let suggestion = (!info.is_gamepad).then(|| candidate_mapping(&info));
            Some(DeviceReport {
                handle,
                info,
                suggestion,
            })
        })
        .collect()
}

/// Render one report as display lines
pub fn format_device_report(report: &DeviceReport) -> Vec<String> {
    let info = &report.info;
    let mut lines = vec![
        format!("📋 Device {}", report.handle),
        format!("   Name: \"{}\"", info.name),
        format!("   GUID: {}", info.guid),
        format!(
            "   Axes: {}  Buttons: {}  Hats: {}",
            info.axes, info.buttons, info.hats
        ),
        format!(
            "   Layout: {}",
            if info.is_gamepad { "known gamepad" } else { "none" }
        ),
    ];

    if let Some(suggestion) = &report.suggestion {
        lines.push("   📌 Mapping suggestion (gamecontrollerdb.txt):".to_string());
        lines.extend(suggestion.lines().map(|l| format!("      {}", l)));
    }
    lines
}

/// Print detailed information about all detected devices
pub fn print_device_diagnostics<B: Backend + ?Sized>(backend: &B) {
    info!("=== Gamepad Diagnostics ===");
    info!("Platform: {}", std::env::consts::OS);
    info!("Backend: {}", backend.name());

    let reports = collect_device_reports(backend);
    if reports.is_empty() {
        info!("⚠️  No joysticks detected");
        info!("   Please check the device is connected and readable by this user");
        return;
    }

    info!("✅ Found {} device(s):", reports.len());
    for report in &reports {
        info!("");
        for line in format_device_report(report) {
            info!("{}", line);
        }
    }
    info!("=== End Diagnostics ===");
}
