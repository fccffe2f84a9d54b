//! Environment sensor device and detached snapshots.

use crate::device::DeviceCore;
use crate::error::{Error, Result};
use crate::protocol::status::{Task, TaskValue};
use crate::transport::{HttpTransport, Transport};

/// An environment sensor task (DHT, DS18b20, BMx280, ...).
///
/// Readings come from the cached status document. Refreshing re-reads
/// the whole unit, so all sibling devices see new values too.
pub struct Sensor<T = HttpTransport> {
    core: DeviceCore<T>,
}

impl<T: Transport> Sensor<T> {
    pub(crate) fn new(core: DeviceCore<T>) -> Self {
        Self { core }
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// All current readings of this sensor's task, in value order.
    pub async fn readings(&self) -> Result<Vec<TaskValue>> {
        Ok(self.core.task().await?.values)
    }

    /// A reading by value name. Matching is case-insensitive and
    /// partial, so `"temp"` finds `Temperature`.
    pub async fn value(&self, name: &str) -> Result<f64> {
        let task = self.core.task().await?;
        find_value(&task.values, name)
            .map(|value| value.value)
            .ok_or_else(|| Error::ValueNotFound {
                task: self.core.name().to_string(),
                value: name.to_string(),
            })
    }

    /// Temperature reading, if the task reports one.
    pub async fn temperature(&self) -> Result<f64> {
        self.value("Temperature").await
    }

    /// Humidity reading, if the task reports one.
    pub async fn humidity(&self) -> Result<f64> {
        self.value("Humidity").await
    }

    /// Pressure reading, if the task reports one.
    pub async fn pressure(&self) -> Result<f64> {
        self.value("Pressure").await
    }

    /// Detached snapshot of the current readings.
    pub async fn snapshot(&self) -> Result<SensorSnapshot> {
        let task = self.core.task().await?;
        Ok(SensorSnapshot::from_task(&task))
    }

    /// Re-fetches the unit's status document.
    pub async fn refresh(&self) -> Result<()> {
        self.core.refresh().await
    }
}

/// Point-in-time readings of one task, detached from any client.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    /// Task name.
    pub name: String,
    /// Readings at snapshot time, in value order.
    pub readings: Vec<TaskValue>,
}

impl SensorSnapshot {
    /// Captures the readings of a task.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            readings: task.values.clone(),
        }
    }

    /// A reading by (partial, case-insensitive) value name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        find_value(&self.readings, name).map(|value| value.value)
    }

    /// Temperature reading, if present.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.value("Temperature")
    }

    /// Humidity reading, if present.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.value("Humidity")
    }

    /// Pressure reading, if present.
    #[must_use]
    pub fn pressure(&self) -> Option<f64> {
        self.value("Pressure")
    }
}

/// Loose value-name lookup: case-insensitive containment.
pub(crate) fn find_value<'a>(values: &'a [TaskValue], name: &str) -> Option<&'a TaskValue> {
    let needle = name.to_ascii_lowercase();
    values
        .iter()
        .find(|value| value.name.to_ascii_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dht_task() -> Task {
        serde_json::from_str(
            r#"{
                "TaskValues": [
                    {"ValueNumber": 1, "Name": "Temperature", "NrDecimals": 2, "Value": 20.60},
                    {"ValueNumber": 2, "Name": "Humidity", "NrDecimals": 2, "Value": 62.10}
                ],
                "TaskInterval": 600,
                "Type": "environment",
                "TaskName": "DHT",
                "TaskEnabled": "true",
                "TaskNumber": 2
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_snapshot_captures_readings_in_order() {
        let snapshot = SensorSnapshot::from_task(&dht_task());

        assert_eq!(snapshot.name, "DHT");
        assert_eq!(snapshot.readings.len(), 2);
        assert_eq!(snapshot.readings[0].value_number, 1);
        assert_eq!(snapshot.readings[1].value_number, 2);
        assert_eq!(snapshot.temperature(), Some(20.60));
        assert_eq!(snapshot.humidity(), Some(62.10));
        assert_eq!(snapshot.pressure(), None);
    }

    #[test]
    fn test_value_lookup_is_loose() {
        let snapshot = SensorSnapshot::from_task(&dht_task());

        assert_eq!(snapshot.value("temperature"), Some(20.60));
        assert_eq!(snapshot.value("temp"), Some(20.60));
        assert_eq!(snapshot.value("HUMID"), Some(62.10));
        assert_eq!(snapshot.value("counter"), None);
    }
}
