//! Formatting helpers shared by the studio panels.

use chrono::Local;
use copilot_core::{ActivityEntry, HealthIndicator};
use copilot_viewport::Rgba;
use eframe::egui::Color32;

pub fn color32(rgba: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

pub fn health_color(indicator: HealthIndicator) -> Color32 {
    match indicator {
        HealthIndicator::Checking => Color32::GRAY,
        HealthIndicator::Ok => Color32::from_rgb(0x22, 0xc5, 0x5e),
        HealthIndicator::Warning => Color32::from_rgb(0xea, 0xb3, 0x08),
        HealthIndicator::Error => Color32::from_rgb(0xef, 0x44, 0x44),
    }
}

/// Local wall-clock `HH:MM` of an entry, or `--:--` if the stored timestamp is unreadable.
pub fn history_time_label(entry: &ActivityEntry) -> String {
    entry
        .timestamp_utc()
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Script text with right-aligned line numbers.
pub fn numbered_lines(script: &str) -> String {
    let total = script.lines().count().max(1);
    let width = total.to_string().len();
    script
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}  {}", i + 1, line, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}
