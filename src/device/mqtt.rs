//! MQTT import device.

use crate::device::DeviceCore;
use crate::device::sensor::find_value;
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, Transport};

/// A `Generic - MQTT Import` task.
///
/// Each task value mirrors one subscribed topic; the wrapper exposes
/// them as (name, value) pairs from the cached document.
pub struct MqttImport<T = HttpTransport> {
    core: DeviceCore<T>,
}

impl<T: Transport> MqttImport<T> {
    pub(crate) fn new(core: DeviceCore<T>) -> Self {
        Self { core }
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// All imported (name, value) pairs, in value order.
    pub async fn values(&self) -> Result<Vec<(String, f64)>> {
        Ok(self
            .core
            .task()
            .await?
            .values
            .into_iter()
            .map(|value| (value.name, value.value))
            .collect())
    }

    /// One imported value by (partial, case-insensitive) name.
    pub async fn value(&self, name: &str) -> Result<f64> {
        let task = self.core.task().await?;
        find_value(&task.values, name)
            .map(|value| value.value)
            .ok_or_else(|| Error::ValueNotFound {
                task: self.core.name().to_string(),
                value: name.to_string(),
            })
    }

    /// Re-fetches the unit's status document.
    pub async fn refresh(&self) -> Result<()> {
        self.core.refresh().await
    }
}
