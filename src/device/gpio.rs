//! Bare GPIO pin device.

use crate::device::DeviceCore;
use crate::error::Result;
use crate::protocol::command::PinLevel;
use crate::protocol::status::ControlReply;
use crate::transport::{HttpTransport, Transport};

/// A GPIO pin driven directly with `GPIO`/`gpiotoggle` commands.
///
/// GPIO devices have no backing task; the pin number comes from the
/// caller's settings, and state queries go to the unit each time.
pub struct Gpio<T = HttpTransport> {
    core: DeviceCore<T>,
    pin: u8,
}

impl<T: Transport> Gpio<T> {
    pub(crate) fn new(core: DeviceCore<T>, pin: u8) -> Self {
        Self { core, pin }
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Configured pin number.
    #[must_use]
    pub const fn pin(&self) -> u8 {
        self.pin
    }

    /// Drives the pin high.
    pub async fn on(&self) -> Result<ControlReply> {
        self.core.handler().gpio_write(self.pin, PinLevel::High).await
    }

    /// Drives the pin low.
    pub async fn off(&self) -> Result<ControlReply> {
        self.core.handler().gpio_write(self.pin, PinLevel::Low).await
    }

    /// Sets the pin to an explicit level.
    pub async fn write(&self, level: PinLevel) -> Result<ControlReply> {
        self.core.handler().gpio_write(self.pin, level).await
    }

    /// Toggles the pin.
    pub async fn toggle(&self) -> Result<ControlReply> {
        self.core.handler().gpio_toggle(self.pin).await
    }

    /// Queries the current level.
    pub async fn state(&self) -> Result<PinLevel> {
        self.core.handler().gpio_state(self.pin).await
    }
}
