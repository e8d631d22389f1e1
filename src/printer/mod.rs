//! # Printer Module
//!
//! This module provides printer-specific configurations.
//!
//! ## Modules
//!
//! - [`config`]: Print-head resolution presets

pub mod config;

pub use config::PrinterConfig;
