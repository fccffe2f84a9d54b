//! Protocol definitions for the ESPEasy HTTP interface.
//!
//! This module contains the wire-level types:
//! - Control commands and their URL encoding
//! - The `/json` status document model
//! - Control acknowledgement parsing

pub mod command;
pub mod status;

pub use command::{Command, DisplayAction, DisplayDriver, PinLevel};
pub use status::{
    ControlReply, PinMode, PinReply, StatusDocument, SystemInfo, Task, TaskValue, WifiInfo,
};
