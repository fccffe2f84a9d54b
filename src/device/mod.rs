//! Typed device wrappers over ESPEasy tasks.
//!
//! A wrapper is a device name plus the knowledge of which control
//! commands and task values apply to that kind of device. Wrappers are
//! created through the factory on [`Esp`](crate::Esp), which dispatches
//! on the ESPEasy task type string into the closed [`DeviceKind`] set.

pub mod display;
pub mod gpio;
pub mod mqtt;
pub mod rotary;
pub mod sensor;
pub mod switch;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::commands::CommandHandler;
use crate::error::{Error, Result};
use crate::protocol::command::DisplayDriver;
use crate::protocol::status::Task;
use crate::transport::{HttpTransport, Transport};

pub use display::Display;
pub use gpio::Gpio;
pub use mqtt::MqttImport;
pub use rotary::Rotary;
pub use sensor::{Sensor, SensorSnapshot};
pub use switch::Switch;

/// Plugin name fragments that identify environment sensor tasks.
const SENSOR_TYPES: &[&str] = &[
    "environment",
    "dht",
    "ds18b20",
    "bmp085",
    "bmx280",
    "ms5611",
    "mlx90614",
];

/// The closed set of device kinds this crate can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    /// Bare GPIO pin driven with `GPIO`/`gpiotoggle` commands.
    Gpio,
    /// Switch input task.
    Switch,
    /// Environment sensor task (temperature, humidity, pressure).
    Sensor,
    /// Character LCD or OLED display.
    Display,
    /// Rotary encoder task.
    Rotary,
    /// MQTT import task.
    MqttImport,
}

impl DeviceKind {
    /// Maps an ESPEasy task type string to a kind.
    ///
    /// Accepts both the full plugin names current firmware reports
    /// (`"Switch input - Switch"`, `"Environment - DHT11/12/22
    /// SONOFF2301/7021"`, `"Display - LCD2004"`) and the short
    /// lowercase forms of older builds (`"switch"`, `"environment"`).
    #[must_use]
    pub fn for_task_type(task_type: &str) -> Option<Self> {
        let t = task_type.to_ascii_lowercase();
        // Rotary must match before switch: its plugin name is
        // "Switch Input - Rotary Encoder".
        if t.contains("rotary") {
            Some(Self::Rotary)
        } else if t.contains("mqtt") {
            Some(Self::MqttImport)
        } else if t.contains("display") || t.contains("lcd") || t.contains("oled") {
            Some(Self::Display)
        } else if t.contains("switch") {
            Some(Self::Switch)
        } else if SENSOR_TYPES.iter().any(|needle| t.contains(needle)) {
            Some(Self::Sensor)
        } else if t == "gpio" {
            Some(Self::Gpio)
        } else {
            None
        }
    }

    /// Stable lowercase label, as used in saved settings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gpio => "gpio",
            Self::Switch => "switch",
            Self::Sensor => "sensor",
            Self::Display => "display",
            Self::Rotary => "rotary",
            Self::MqttImport => "mqtt-import",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied settings for creating a device wrapper.
///
/// Most kinds need nothing beyond the task name; GPIO devices have no
/// backing task and must carry their pin number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSpec {
    /// Forces the kind instead of dispatching on the task type.
    pub kind: Option<DeviceKind>,
    /// GPIO pin; required for [`DeviceKind::Gpio`].
    pub pin: Option<u8>,
    /// Display driver override.
    pub driver: Option<DisplayDriver>,
}

impl DeviceSpec {
    /// An empty spec; the factory dispatches on the task type.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec for a bare GPIO device on the given pin.
    #[must_use]
    pub const fn gpio(pin: u8) -> Self {
        Self {
            kind: Some(DeviceKind::Gpio),
            pin: Some(pin),
            driver: None,
        }
    }

    /// Forces the wrapper kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the GPIO pin.
    #[must_use]
    pub const fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Sets the display driver.
    #[must_use]
    pub const fn with_driver(mut self, driver: DisplayDriver) -> Self {
        self.driver = Some(driver);
        self
    }
}

/// A remembered device: name, kind, and the settings it was created
/// with. Entries are kept per unit and serialized into saved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Device name (the task name, except for bare GPIO devices).
    pub name: String,
    /// Wrapper kind.
    pub kind: DeviceKind,
    /// GPIO pin for [`DeviceKind::Gpio`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<u8>,
    /// Display driver for [`DeviceKind::Display`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DisplayDriver>,
}

impl DeviceEntry {
    /// Creates an entry with no extra settings.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            pin: None,
            driver: None,
        }
    }
}

/// Shared plumbing of all wrappers: the unit's command handler plus the
/// device name.
pub(crate) struct DeviceCore<T> {
    handler: CommandHandler<T>,
    name: String,
}

impl<T: Transport> DeviceCore<T> {
    pub(crate) fn new(handler: CommandHandler<T>, name: String) -> Self {
        Self { handler, name }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn handler(&self) -> &CommandHandler<T> {
        &self.handler
    }

    /// This device's task from the cached status document.
    pub(crate) async fn task(&self) -> Result<Task> {
        self.handler.task(&self.name).await
    }

    /// Re-fetches the unit's status document.
    pub(crate) async fn refresh(&self) -> Result<()> {
        self.handler.fetch_status().await.map(|_| ())
    }
}

/// A created device wrapper of any kind.
pub enum DeviceHandle<T = HttpTransport> {
    /// Bare GPIO pin.
    Gpio(Gpio<T>),
    /// Switch input.
    Switch(Switch<T>),
    /// Environment sensor.
    Sensor(Sensor<T>),
    /// LCD/OLED display.
    Display(Display<T>),
    /// Rotary encoder.
    Rotary(Rotary<T>),
    /// MQTT import.
    MqttImport(MqttImport<T>),
}

impl<T: Transport> DeviceHandle<T> {
    /// The wrapper kind.
    #[must_use]
    pub const fn kind(&self) -> DeviceKind {
        match self {
            Self::Gpio(_) => DeviceKind::Gpio,
            Self::Switch(_) => DeviceKind::Switch,
            Self::Sensor(_) => DeviceKind::Sensor,
            Self::Display(_) => DeviceKind::Display,
            Self::Rotary(_) => DeviceKind::Rotary,
            Self::MqttImport(_) => DeviceKind::MqttImport,
        }
    }

    /// The device name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Gpio(device) => device.name(),
            Self::Switch(device) => device.name(),
            Self::Sensor(device) => device.name(),
            Self::Display(device) => device.name(),
            Self::Rotary(device) => device.name(),
            Self::MqttImport(device) => device.name(),
        }
    }

    /// Unwraps a GPIO device.
    #[must_use]
    pub fn into_gpio(self) -> Option<Gpio<T>> {
        match self {
            Self::Gpio(device) => Some(device),
            _ => None,
        }
    }

    /// Unwraps a switch device.
    #[must_use]
    pub fn into_switch(self) -> Option<Switch<T>> {
        match self {
            Self::Switch(device) => Some(device),
            _ => None,
        }
    }

    /// Unwraps a sensor device.
    #[must_use]
    pub fn into_sensor(self) -> Option<Sensor<T>> {
        match self {
            Self::Sensor(device) => Some(device),
            _ => None,
        }
    }

    /// Unwraps a display device.
    #[must_use]
    pub fn into_display(self) -> Option<Display<T>> {
        match self {
            Self::Display(device) => Some(device),
            _ => None,
        }
    }

    /// Unwraps a rotary encoder device.
    #[must_use]
    pub fn into_rotary(self) -> Option<Rotary<T>> {
        match self {
            Self::Rotary(device) => Some(device),
            _ => None,
        }
    }

    /// Unwraps an MQTT import device.
    #[must_use]
    pub fn into_mqtt_import(self) -> Option<MqttImport<T>> {
        match self {
            Self::MqttImport(device) => Some(device),
            _ => None,
        }
    }
}

/// Builds the wrapper for a device entry.
pub(crate) fn build<T: Transport>(
    handler: CommandHandler<T>,
    entry: &DeviceEntry,
) -> Result<DeviceHandle<T>> {
    let core = DeviceCore::new(handler, entry.name.clone());
    Ok(match entry.kind {
        DeviceKind::Gpio => {
            let pin = entry.pin.ok_or_else(|| Error::MissingPin {
                name: entry.name.clone(),
            })?;
            DeviceHandle::Gpio(Gpio::new(core, pin))
        }
        DeviceKind::Switch => DeviceHandle::Switch(Switch::new(core)),
        DeviceKind::Sensor => DeviceHandle::Sensor(Sensor::new(core)),
        DeviceKind::Display => DeviceHandle::Display(Display::new(
            core,
            entry.driver.unwrap_or(DisplayDriver::Lcd),
        )),
        DeviceKind::Rotary => DeviceHandle::Rotary(Rotary::new(core)),
        DeviceKind::MqttImport => DeviceHandle::MqttImport(MqttImport::new(core)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_full_plugin_names() {
        assert_eq!(
            DeviceKind::for_task_type("Switch input - Switch"),
            Some(DeviceKind::Switch)
        );
        assert_eq!(
            DeviceKind::for_task_type("Environment - DHT11/12/22  SONOFF2301/7021"),
            Some(DeviceKind::Sensor)
        );
        assert_eq!(
            DeviceKind::for_task_type("Environment - DHT12 (I2C)"),
            Some(DeviceKind::Sensor)
        );
        assert_eq!(
            DeviceKind::for_task_type("Environment - DS18b20"),
            Some(DeviceKind::Sensor)
        );
        assert_eq!(
            DeviceKind::for_task_type("Display - LCD2004"),
            Some(DeviceKind::Display)
        );
        assert_eq!(
            DeviceKind::for_task_type("Display - OLED SSD1306/SH1106 Framed"),
            Some(DeviceKind::Display)
        );
        assert_eq!(
            DeviceKind::for_task_type("Switch Input - Rotary Encoder"),
            Some(DeviceKind::Rotary)
        );
        assert_eq!(
            DeviceKind::for_task_type("Generic - MQTT Import"),
            Some(DeviceKind::MqttImport)
        );
    }

    #[test]
    fn test_dispatch_short_forms() {
        assert_eq!(
            DeviceKind::for_task_type("switch"),
            Some(DeviceKind::Switch)
        );
        assert_eq!(
            DeviceKind::for_task_type("environment"),
            Some(DeviceKind::Sensor)
        );
        assert_eq!(DeviceKind::for_task_type("gpio"), Some(DeviceKind::Gpio));
    }

    #[test]
    fn test_rotary_wins_over_switch() {
        // The rotary plugin name contains "Switch Input" as a prefix.
        assert_eq!(
            DeviceKind::for_task_type("Switch Input - Rotary Encoder"),
            Some(DeviceKind::Rotary)
        );
    }

    #[test]
    fn test_unknown_type_is_none() {
        assert_eq!(DeviceKind::for_task_type("Regulator - Level Control"), None);
        assert_eq!(DeviceKind::for_task_type(""), None);
    }

    #[test]
    fn test_device_entry_serde_round_trip() {
        let entry = DeviceEntry {
            name: "led".into(),
            kind: DeviceKind::Gpio,
            pin: Some(2),
            driver: None,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"gpio\""));
        assert!(!json.contains("driver"));

        let back: DeviceEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(DeviceKind::MqttImport.as_str(), "mqtt-import");
        assert_eq!(DeviceKind::Gpio.to_string(), "gpio");
    }

    #[test]
    fn test_spec_builders() {
        let spec = DeviceSpec::gpio(12);
        assert_eq!(spec.kind, Some(DeviceKind::Gpio));
        assert_eq!(spec.pin, Some(12));

        let spec = DeviceSpec::new()
            .with_kind(DeviceKind::Display)
            .with_driver(DisplayDriver::Oled);
        assert_eq!(spec.kind, Some(DeviceKind::Display));
        assert_eq!(spec.driver, Some(DisplayDriver::Oled));
    }
}
