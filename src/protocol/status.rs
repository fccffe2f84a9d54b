//! Serde model of the ESPEasy `/json` status document and the
//! `/control` acknowledgements.
//!
//! ESPEasy's JSON uses spaced title-case keys (`"Unit Name"`,
//! `"IP Address"`) and, on many builds, *string* booleans (`"true"`).
//! The model renames fields accordingly and deserializes leniently;
//! unknown keys are ignored so firmware variations do not break parsing.

use serde::{Deserialize, Deserializer};

use crate::protocol::command::PinLevel;

/// The full `/json` status document of one unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusDocument {
    /// System block: identity, build, uptime.
    #[serde(rename = "System")]
    pub system: SystemInfo,
    /// WiFi block; absent on some builds.
    #[serde(rename = "WiFi", default)]
    pub wifi: Option<WifiInfo>,
    /// Configured tasks, in slot order.
    #[serde(rename = "Sensors", default)]
    pub sensors: Vec<Task>,
    /// Suggested cache lifetime in milliseconds.
    #[serde(rename = "TTL", default)]
    pub ttl: Option<u64>,
}

impl StatusDocument {
    /// Looks up a task by name, case-insensitively.
    #[must_use]
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.sensors
            .iter()
            .find(|task| task.name.eq_ignore_ascii_case(name))
    }

    /// The unit name reported under `System`.
    #[must_use]
    pub fn unit_name(&self) -> Option<&str> {
        self.system.unit_name.as_deref()
    }
}

/// The `System` block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemInfo {
    /// User-assigned unit name.
    #[serde(rename = "Unit Name", default)]
    pub unit_name: Option<String>,
    /// Unit number.
    #[serde(rename = "Unit Number", default)]
    pub unit_number: Option<u32>,
    /// Numeric firmware build.
    #[serde(rename = "Build", default)]
    pub build: Option<u64>,
    /// Git build tag, e.g. `mega-20190830`.
    #[serde(rename = "Git Build", default)]
    pub git_build: Option<String>,
    /// Local time as reported by the unit.
    #[serde(rename = "Local Time", default)]
    pub local_time: Option<String>,
    /// Uptime in minutes.
    #[serde(rename = "Uptime", default)]
    pub uptime: Option<u64>,
    /// Load average percentage.
    #[serde(rename = "Load", default)]
    pub load: Option<f64>,
    /// Free heap in bytes.
    #[serde(rename = "Free RAM", default)]
    pub free_ram: Option<u64>,
}

/// The `WiFi` block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WifiInfo {
    /// Network hostname.
    #[serde(rename = "Hostname", default)]
    pub hostname: Option<String>,
    /// IPv4 address of the unit.
    #[serde(rename = "IP Address", default)]
    pub ip_address: Option<String>,
    /// Subnet mask.
    #[serde(rename = "IP Subnet", default)]
    pub ip_subnet: Option<String>,
    /// Default gateway.
    #[serde(rename = "Gateway", default)]
    pub gateway: Option<String>,
    /// Connected SSID.
    #[serde(rename = "SSID", default)]
    pub ssid: Option<String>,
    /// Signal strength in dBm.
    #[serde(rename = "RSSI", default)]
    pub rssi: Option<i32>,
    /// WiFi channel.
    #[serde(rename = "Channel", default)]
    pub channel: Option<u32>,
}

/// One configured ESPEasy task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    /// Current values, ordered by value number.
    #[serde(rename = "TaskValues", default)]
    pub values: Vec<TaskValue>,
    /// Controller bindings for this task.
    #[serde(rename = "DataAcquisition", default)]
    pub data_acquisition: Vec<DataAcquisition>,
    /// Reporting interval in seconds.
    #[serde(rename = "TaskInterval", default)]
    pub interval: Option<u64>,
    /// Plugin type string, e.g. `Switch input - Switch`.
    #[serde(rename = "Type", default)]
    pub task_type: Option<String>,
    /// User-assigned task name.
    #[serde(rename = "TaskName", default)]
    pub name: String,
    /// Plugin number.
    #[serde(rename = "TaskDeviceNumber", default)]
    pub device_number: Option<u32>,
    /// Whether the task is enabled. Arrives as `"true"`/`"false"` strings
    /// on common builds and as real booleans on others.
    #[serde(rename = "TaskEnabled", default = "enabled_default", deserialize_with = "lenient_bool")]
    pub enabled: bool,
    /// Task slot number, 1-based.
    #[serde(rename = "TaskNumber", default)]
    pub number: Option<u32>,
}

impl Task {
    /// Looks up a value by name, case-insensitively.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&TaskValue> {
        self.values
            .iter()
            .find(|value| value.name.eq_ignore_ascii_case(name))
    }
}

const fn enabled_default() -> bool {
    true
}

/// One reading within a task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskValue {
    /// 1-based position within the task.
    #[serde(rename = "ValueNumber", default)]
    pub value_number: u32,
    /// Value name, e.g. `Temperature`.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Number of decimals the unit reports for this value.
    #[serde(rename = "NrDecimals", default)]
    pub decimals: u8,
    /// Current value. Some builds quote numbers, so strings are accepted.
    #[serde(rename = "Value", default, deserialize_with = "lenient_f64")]
    pub value: f64,
}

/// One controller binding of a task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataAcquisition {
    /// Controller slot, 1-based.
    #[serde(rename = "Controller", default)]
    pub controller: u32,
    /// IDX reported to the controller.
    #[serde(rename = "IDX", default)]
    pub idx: u32,
    /// Whether this binding is enabled.
    #[serde(rename = "Enabled", default, deserialize_with = "lenient_bool")]
    pub enabled: bool,
}

/// Pin mode as reported by `status,gpio` and control acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinMode {
    /// Digital output.
    Output,
    /// Digital input.
    Input,
    /// Input with internal pull-up.
    InputPullup,
    /// PWM output.
    Pwm,
    /// Servo output.
    Servo,
    /// Anything this model does not know.
    Unknown(String),
}

impl PinMode {
    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "output" => Self::Output,
            "input" => Self::Input,
            "input pullup" => Self::InputPullup,
            "pwm" => Self::Pwm,
            "servo" => Self::Servo,
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for PinMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// JSON acknowledgement for GPIO commands, e.g.
/// `{"log":"", "plugin":1, "pin":2, "mode":"output", "state":1}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PinReply {
    /// Log line the unit printed for the command.
    #[serde(default)]
    pub log: String,
    /// Plugin number that handled the command.
    #[serde(default)]
    pub plugin: Option<i64>,
    /// Pin the command applied to.
    pub pin: u8,
    /// Pin mode after the command.
    #[serde(default)]
    pub mode: Option<PinMode>,
    /// Pin state after the command; fractional for PWM duty.
    #[serde(deserialize_with = "lenient_f64")]
    pub state: f64,
}

impl PinReply {
    /// The state as a logic level.
    #[must_use]
    pub fn level(&self) -> PinLevel {
        PinLevel::from_state(self.state)
    }
}

/// A `/control` acknowledgement body.
///
/// Current firmware answers JSON; older builds answer plain text
/// (usually `OK`). Both are success.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlReply {
    /// Parsed JSON acknowledgement.
    Json(serde_json::Value),
    /// Plain-text acknowledgement.
    Text(String),
}

impl ControlReply {
    /// Classifies a response body.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(body.trim().to_string()),
        }
    }

    /// Interprets the acknowledgement as a [`PinReply`], if it is one.
    #[must_use]
    pub fn pin_reply(&self) -> Option<PinReply> {
        match self {
            Self::Json(value) => serde_json::from_value(value.clone()).ok(),
            Self::Text(_) => None,
        }
    }

    /// The text form, if this was a plain-text acknowledgement.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Recovers the `state` number from a status body that is not valid
/// JSON. Some builds answer `status,gpio` with malformed JSON, but the
/// field is still present in the text.
pub(crate) fn scrape_state(body: &str) -> Option<f64> {
    let at = body.find("\"state\"")?;
    let rest = body[at + "\"state\"".len()..].trim_start_matches(|c| c == ':' || c == ' ');
    let end = rest
        .find(|c: char| c == ',' || c == '}' || c == '\n' || c == '\r')
        .unwrap_or(rest.len());
    rest[..end].trim().parse().ok()
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Text(s) => s.eq_ignore_ascii_case("true") || s == "1",
        Raw::Number(n) => n != 0,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
