//! Rotary encoder device.

use crate::device::DeviceCore;
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, Transport};

/// A rotary encoder task exposing its counter value.
pub struct Rotary<T = HttpTransport> {
    core: DeviceCore<T>,
}

impl<T: Transport> Rotary<T> {
    pub(crate) fn new(core: DeviceCore<T>) -> Self {
        Self { core }
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Current counter value from the cached document.
    pub async fn counter(&self) -> Result<f64> {
        let task = self.core.task().await?;
        task.value("Counter")
            .map(|value| value.value)
            .ok_or_else(|| Error::ValueNotFound {
                task: self.core.name().to_string(),
                value: "Counter".to_string(),
            })
    }

    /// Re-fetches the unit's status document.
    pub async fn refresh(&self) -> Result<()> {
        self.core.refresh().await
    }
}
