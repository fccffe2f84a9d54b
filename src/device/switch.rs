//! Switch input device.

use crate::device::DeviceCore;
use crate::error::{Error, Result};
use crate::protocol::command::PinLevel;
use crate::transport::{HttpTransport, Transport};

/// A switch input task.
///
/// The state is the first task value of the cached status document;
/// call [`refresh`](Self::refresh) first to re-read the unit.
pub struct Switch<T = HttpTransport> {
    core: DeviceCore<T>,
}

impl<T: Transport> Switch<T> {
    pub(crate) fn new(core: DeviceCore<T>) -> Self {
        Self { core }
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Current switch state from the cached document.
    pub async fn state(&self) -> Result<PinLevel> {
        let task = self.core.task().await?;
        let value = task.values.first().ok_or_else(|| Error::ValueNotFound {
            task: self.core.name().to_string(),
            value: "State".to_string(),
        })?;
        Ok(PinLevel::from_state(value.value))
    }

    /// True when the switch reads high.
    pub async fn is_on(&self) -> Result<bool> {
        Ok(self.state().await?.is_high())
    }

    /// Re-fetches the unit's status document.
    pub async fn refresh(&self) -> Result<()> {
        self.core.refresh().await
    }
}
