//! Control commands for the ESPEasy `/control` endpoint.
//!
//! Commands are sent as HTTP GETs of the form `/control?cmd=<payload>`.
//! The payload is a comma-separated list starting with the command name,
//! e.g. `GPIO,12,1`. Free-text segments (event names, display text) are
//! percent-encoded; the structural commas are not.

use serde::{Deserialize, Serialize};

/// Logic level of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinLevel {
    /// Logic low (0).
    Low,
    /// Logic high (1).
    High,
}

impl PinLevel {
    /// Returns true for `High`.
    #[must_use]
    pub const fn is_high(&self) -> bool {
        matches!(self, Self::High)
    }

    /// Maps a numeric state to a level. Zero is `Low`, anything else
    /// (including PWM duty values) is `High`.
    #[must_use]
    pub fn from_state(state: f64) -> Self {
        if state == 0.0 { Self::Low } else { Self::High }
    }

    /// The opposite level.
    #[must_use]
    pub const fn toggled(&self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl From<PinLevel> for u8 {
    fn from(level: PinLevel) -> Self {
        match level {
            PinLevel::Low => 0,
            PinLevel::High => 1,
        }
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Display driver family, selecting the command names to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayDriver {
    /// Character LCDs (`LCD` / `LCDCMD`).
    Lcd,
    /// OLED modules (`OLED` / `OLEDCMD`).
    Oled,
}

impl DisplayDriver {
    /// Command name for writing text.
    #[must_use]
    pub const fn write_command(&self) -> &'static str {
        match self {
            Self::Lcd => "LCD",
            Self::Oled => "OLED",
        }
    }

    /// Command name for display control actions.
    #[must_use]
    pub const fn control_command(&self) -> &'static str {
        match self {
            Self::Lcd => "LCDCMD",
            Self::Oled => "OLEDCMD",
        }
    }

    /// Picks the driver for an ESPEasy display task type string.
    #[must_use]
    pub fn for_task_type(task_type: &str) -> Self {
        if task_type.to_ascii_lowercase().contains("oled") {
            Self::Oled
        } else {
            Self::Lcd
        }
    }
}

/// Display control actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayAction {
    /// Switch the display on.
    On,
    /// Switch the display off.
    Off,
    /// Clear all rows.
    Clear,
}

impl DisplayAction {
    /// The wire form of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Clear => "clear",
        }
    }
}

/// Commands understood by the ESPEasy `/control` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set a GPIO pin: `GPIO,<pin>,<0|1>`.
    GpioWrite { pin: u8, level: PinLevel },
    /// Toggle a GPIO pin: `gpiotoggle,<pin>`.
    GpioToggle { pin: u8 },
    /// Query a GPIO pin: `status,gpio,<pin>`.
    GpioStatus { pin: u8 },
    /// Fire a rules event: `event,<name>`.
    Event { name: String },
    /// Write text at a row/column: `LCD,<row>,<col>,<text>` (or `OLED,...`).
    DisplayWrite {
        driver: DisplayDriver,
        row: u8,
        column: u8,
        text: String,
    },
    /// Display on/off/clear: `LCDCMD,<action>` (or `OLEDCMD,...`).
    DisplayControl {
        driver: DisplayDriver,
        action: DisplayAction,
    },
    /// Pre-formatted command payload, passed through unchanged.
    Raw(String),
}

impl Command {
    /// Builds the `cmd=` payload for this command.
    #[must_use]
    pub fn query(&self) -> String {
        match self {
            Self::GpioWrite { pin, level } => format!("GPIO,{pin},{}", u8::from(*level)),
            Self::GpioToggle { pin } => format!("gpiotoggle,{pin}"),
            Self::GpioStatus { pin } => format!("status,gpio,{pin}"),
            Self::Event { name } => format!("event,{}", urlencoding::encode(name)),
            Self::DisplayWrite {
                driver,
                row,
                column,
                text,
            } => format!(
                "{},{row},{column},{}",
                driver.write_command(),
                urlencoding::encode(text)
            ),
            Self::DisplayControl { driver, action } => {
                format!("{},{}", driver.control_command(), action.as_str())
            }
            Self::Raw(payload) => payload.clone(),
        }
    }

    /// Builds the full request path, e.g. `/control?cmd=GPIO,12,1`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/control?cmd={}", self.query())
    }
}
