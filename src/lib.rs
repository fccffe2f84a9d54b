//! # espeasy
//!
//! A Rust client library for `ESPEasy` firmware devices.
//!
//! This library talks to the web server every `ESPEasy` unit exposes:
//! the `/control` command endpoint and the `/json` status document.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Typed device wrappers (GPIO, switch, sensor, display, rotary, MQTT import)
//! - Multi-unit registry with subnet scanning
//! - Saved settings that survive restarts
//! - Comprehensive error handling
//!
//! ## Quick Start
//!
//! ```no_run
//! use espeasy::Esp;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), espeasy::Error> {
//!     // Connect to a unit by address
//!     let esp = Esp::http("192.168.0.12")?;
//!     let info = esp.connect().await?;
//!
//!     println!("Connected to: {}", info.unit_name.as_deref().unwrap_or("?"));
//!
//!     // Drive a GPIO pin
//!     esp.gpio_on(12).await?;
//!     let level = esp.gpio_state(12).await?;
//!     println!("GPIO 12 is {level:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Control command URLs and status-document parsing
//! - [`transport`] - HTTP transport to a unit's web server
//! - [`commands`] - Command handler with the cached status document
//! - [`device`] - Typed wrappers over the tasks a unit reports
//! - [`client`] - High-level [`Esp`] client
//! - [`registry`] - Multi-unit [`Registry`] and subnet scanning
//! - [`config`] - Package configuration and saved settings

pub mod client;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use client::Esp;
pub use commands::CommandHandler;
pub use config::{NetworkSettings, PackageConfig, SavedEsp};
pub use device::{
    DeviceEntry, DeviceHandle, DeviceKind, DeviceSpec, Display, Gpio, MqttImport, Rotary, Sensor,
    SensorSnapshot, Switch,
};
pub use error::{Error, Result};
pub use protocol::{
    Command, ControlReply, DisplayAction, DisplayDriver, PinLevel, PinMode, PinReply,
    StatusDocument, SystemInfo, Task, TaskValue, WifiInfo,
};
pub use registry::{Ipv4Network, Registry, ScanOptions};
pub use transport::{HttpConfig, HttpTransport, Transport};
