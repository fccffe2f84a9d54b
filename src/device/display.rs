//! Character LCD / OLED display device.

use crate::device::DeviceCore;
use crate::error::Result;
use crate::protocol::command::{Command, DisplayAction, DisplayDriver};
use crate::protocol::status::ControlReply;
use crate::transport::{HttpTransport, Transport};

/// An LCD or OLED display task.
///
/// Rows and columns are 1-based, as ESPEasy counts them.
pub struct Display<T = HttpTransport> {
    core: DeviceCore<T>,
    driver: DisplayDriver,
}

impl<T: Transport> Display<T> {
    pub(crate) fn new(core: DeviceCore<T>, driver: DisplayDriver) -> Self {
        Self { core, driver }
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Driver family this display is driven with.
    #[must_use]
    pub const fn driver(&self) -> DisplayDriver {
        self.driver
    }

    /// Writes text at a row and column.
    pub async fn write(&self, row: u8, column: u8, text: &str) -> Result<ControlReply> {
        self.core
            .handler()
            .control(&Command::DisplayWrite {
                driver: self.driver,
                row,
                column,
                text: text.to_string(),
            })
            .await
    }

    /// Clears all rows.
    pub async fn clear(&self) -> Result<ControlReply> {
        self.action(DisplayAction::Clear).await
    }

    /// Switches the display on.
    pub async fn on(&self) -> Result<ControlReply> {
        self.action(DisplayAction::On).await
    }

    /// Switches the display off.
    pub async fn off(&self) -> Result<ControlReply> {
        self.action(DisplayAction::Off).await
    }

    async fn action(&self, action: DisplayAction) -> Result<ControlReply> {
        self.core
            .handler()
            .control(&Command::DisplayControl {
                driver: self.driver,
                action,
            })
            .await
    }
}
