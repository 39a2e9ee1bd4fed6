//! # openmeters-windows
//!
//! Windows WASAPI loopback backend for openmeters.
//!
//! Provides:
//! - `WasapiLoopback` — `LoopbackBackend` over the default render endpoint
//! - `MtaUsage` — process MTA reference held by every client and reader
//! - `PriorityGuard` — MMCSS "Pro Audio" registration with a time-critical fallback
//!
//! ## Platform Requirements
//! - Windows 8+ (`CoIncrementMTAUsage`)
//! - Visual Studio Build Tools 2022 + Windows SDK for linking
//!
//! ## Usage
//! ```ignore
//! use openmeters_core::AudioEngine;
//! use openmeters_windows::WasapiLoopback;
//!
//! let engine = AudioEngine::new(WasapiLoopback::new());
//! engine.initialize()?;
//! engine.start()?;
//! ```

#[cfg(target_os = "windows")]
pub mod com;
#[cfg(target_os = "windows")]
pub mod endpoint;
#[cfg(target_os = "windows")]
pub mod mix_format;
#[cfg(target_os = "windows")]
pub mod priority;
#[cfg(target_os = "windows")]
pub mod wasapi_loopback;

#[cfg(target_os = "windows")]
pub use com::MtaUsage;
#[cfg(target_os = "windows")]
pub use priority::PriorityGuard;
#[cfg(target_os = "windows")]
pub use wasapi_loopback::{WasapiClient, WasapiLoopback, WasapiReader};
