//! Display models for CLI output
//!
//! Converts settings and schedule state into CLI-friendly display rows.

pub mod display;

pub use display::{ScheduleDisplay, SettingRow, setting_rows};
