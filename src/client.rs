//! Main [`Esp`] client implementation.
//!
//! This module provides the high-level [`Esp`] client that combines the
//! transport, command handling, and device wrappers into a unified
//! interface for one ESPEasy unit.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::commands::CommandHandler;
use crate::config::{NetworkSettings, SavedEsp};
use crate::device::{self, DeviceEntry, DeviceHandle, DeviceKind, DeviceSpec, SensorSnapshot};
use crate::error::{Error, Result};
use crate::protocol::command::{Command, DisplayDriver, PinLevel};
use crate::protocol::status::{ControlReply, StatusDocument, SystemInfo, Task};
use crate::transport::{HttpConfig, HttpTransport, Transport};

/// Client for one ESPEasy unit.
///
/// The client caches the unit's last `/json` status document; reading
/// accessors work from the cache, control operations always go to the
/// unit. `connect` or `refresh` re-reads the unit in bulk, so one
/// round-trip updates every task at once.
pub struct Esp<T = HttpTransport> {
    handler: CommandHandler<T>,
    host: String,
    devices: RwLock<Vec<DeviceEntry>>,
}

impl Esp<HttpTransport> {
    /// Creates a new client for a host over plain HTTP.
    ///
    /// # Arguments
    ///
    /// * `host` - IP address or host name of the unit
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn http(host: impl Into<String>) -> Result<Self> {
        Self::with_http_config(HttpConfig::new(host))
    }

    /// Creates a new client with custom HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_http_config(config: HttpConfig) -> Result<Self> {
        let host = config.host.clone();
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(transport, host))
    }
}

impl<T: Transport> Esp<T> {
    /// Creates a new client with the given transport.
    ///
    /// `host` is the label the unit is known by (IP address for
    /// registry use).
    pub fn with_transport(transport: T, host: impl Into<String>) -> Self {
        Self {
            handler: CommandHandler::new(Arc::new(transport)),
            host: host.into(),
            devices: RwLock::new(Vec::new()),
        }
    }

    /// Host this client talks to, as given at construction.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Endpoint label of the underlying transport.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.handler.endpoint()
    }

    // ==================== Status ====================

    /// Fetches the unit's status for the first time.
    ///
    /// One round-trip to `/json` caches the full document and returns
    /// the system block with the unit's identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit is unreachable or the document
    /// cannot be parsed.
    pub async fn connect(&self) -> Result<SystemInfo> {
        let document = self.handler.fetch_status().await?;
        tracing::info!(
            "connected to unit {:?} at {}",
            document.unit_name().unwrap_or("<unnamed>"),
            self.endpoint()
        );
        Ok(document.system)
    }

    /// Re-fetches the `/json` document, updating every cached task.
    pub async fn refresh(&self) -> Result<()> {
        self.handler.fetch_status().await.map(|_| ())
    }

    /// The cached status document, if any.
    pub async fn status(&self) -> Option<StatusDocument> {
        self.handler.cached_status().await
    }

    /// The cached system block, if any.
    pub async fn system(&self) -> Option<SystemInfo> {
        self.status().await.map(|document| document.system)
    }

    /// The unit name from the cached document.
    pub async fn name(&self) -> Option<String> {
        self.status()
            .await
            .and_then(|document| document.system.unit_name)
    }

    /// The cached tasks, in slot order. Empty before `connect`.
    pub async fn tasks(&self) -> Vec<Task> {
        self.status()
            .await
            .map(|document| document.sensors)
            .unwrap_or_default()
    }

    /// A cached task by name.
    pub async fn task(&self, name: &str) -> Result<Task> {
        self.handler.task(name).await
    }

    /// Seeds the status cache with a document fetched elsewhere.
    pub(crate) async fn prime(&self, document: StatusDocument) {
        self.handler.prime_status(document).await;
    }

    // ==================== GPIO ====================

    /// Drives a GPIO pin high.
    pub async fn gpio_on(&self, pin: u8) -> Result<ControlReply> {
        self.handler.gpio_write(pin, PinLevel::High).await
    }

    /// Drives a GPIO pin low.
    pub async fn gpio_off(&self, pin: u8) -> Result<ControlReply> {
        self.handler.gpio_write(pin, PinLevel::Low).await
    }

    /// Sets a GPIO pin to an explicit level.
    pub async fn gpio_write(&self, pin: u8, level: PinLevel) -> Result<ControlReply> {
        self.handler.gpio_write(pin, level).await
    }

    /// Toggles a GPIO pin.
    pub async fn gpio_toggle(&self, pin: u8) -> Result<ControlReply> {
        self.handler.gpio_toggle(pin).await
    }

    /// Queries the current level of a GPIO pin.
    pub async fn gpio_state(&self, pin: u8) -> Result<PinLevel> {
        self.handler.gpio_state(pin).await
    }

    // ==================== Control ====================

    /// Sends a control command and returns the acknowledgement.
    pub async fn control(&self, command: &Command) -> Result<ControlReply> {
        self.handler.control(command).await
    }

    /// Fires a rules event on the unit.
    pub async fn event(&self, name: &str) -> Result<ControlReply> {
        self.handler
            .control(&Command::Event {
                name: name.to_string(),
            })
            .await
    }

    /// Raw GET of an arbitrary path, returning the body unparsed.
    ///
    /// Escape hatch for endpoints this crate has no typed wrapper for.
    /// A missing leading slash is added.
    pub async fn request(&self, path: &str) -> Result<String> {
        if path.starts_with('/') {
            self.handler.request(path).await
        } else {
            self.handler.request(&format!("/{path}")).await
        }
    }

    // ==================== Devices ====================

    /// Creates (or re-creates) a device wrapper by task name,
    /// dispatching on the task's type string.
    ///
    /// The resulting entry is remembered, so later calls with the same
    /// name reuse the stored kind and settings without consulting the
    /// status document again.
    ///
    /// # Errors
    ///
    /// Returns an error if no status document is cached yet, the task
    /// does not exist, or its type has no wrapper.
    pub async fn device(&self, name: &str) -> Result<DeviceHandle<T>> {
        self.device_with(name, DeviceSpec::new()).await
    }

    /// Creates a device wrapper with explicit settings.
    ///
    /// Required for bare GPIO devices, which have no backing task:
    /// `device_with("led", DeviceSpec::gpio(2))`.
    pub async fn device_with(&self, name: &str, spec: DeviceSpec) -> Result<DeviceHandle<T>> {
        let entry = self.resolve_entry(name, spec).await?;

        {
            let mut devices = self.devices.write().await;
            match devices
                .iter_mut()
                .find(|stored| stored.name.eq_ignore_ascii_case(name))
            {
                Some(stored) => *stored = entry.clone(),
                None => devices.push(entry.clone()),
            }
        }
        tracing::debug!("{} device {:?} ready on {}", entry.kind, entry.name, self.host);

        device::build(self.handler.clone(), &entry)
    }

    /// The remembered device entries of this unit.
    pub async fn devices(&self) -> Vec<DeviceEntry> {
        self.devices.read().await.clone()
    }

    /// Detached snapshot of one task's readings.
    pub async fn sensor(&self, name: &str) -> Result<SensorSnapshot> {
        let task = self.handler.task(name).await?;
        Ok(SensorSnapshot::from_task(&task))
    }

    async fn resolve_entry(&self, name: &str, spec: DeviceSpec) -> Result<DeviceEntry> {
        let stored = self
            .devices
            .read()
            .await
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .cloned();

        let kind = match spec.kind.or(stored.as_ref().map(|entry| entry.kind)) {
            Some(kind) => kind,
            None => {
                let task = self.handler.task(name).await?;
                let task_type = task.task_type.unwrap_or_default();
                DeviceKind::for_task_type(&task_type)
                    .ok_or(Error::UnknownTaskType { task_type })?
            }
        };

        let pin = spec.pin.or(stored.as_ref().and_then(|entry| entry.pin));
        if kind == DeviceKind::Gpio && pin.is_none() {
            return Err(Error::MissingPin {
                name: name.to_string(),
            });
        }

        let mut driver = spec.driver.or(stored.as_ref().and_then(|entry| entry.driver));
        if driver.is_none() && kind == DeviceKind::Display {
            // Pick LCD vs OLED from the task type when it is available.
            driver = self
                .handler
                .task(name)
                .await
                .ok()
                .and_then(|task| task.task_type)
                .map(|task_type| DisplayDriver::for_task_type(&task_type));
        }

        Ok(DeviceEntry {
            name: name.to_string(),
            kind,
            pin,
            driver,
        })
    }

    // ==================== Settings ====================

    /// Writes this unit's device entries into saved settings.
    pub async fn save_settings(&self, settings: &mut NetworkSettings) {
        let devices = self.devices.read().await.clone();
        settings.upsert_esp(SavedEsp {
            ip: self.host.clone(),
            devices,
        });
    }

    /// Applies saved device entries for this unit's host.
    ///
    /// Entries whose name is already present are left untouched.
    /// Returns the number of entries applied.
    pub async fn load_settings(&self, settings: &NetworkSettings) -> usize {
        let Some(saved) = settings.esp(&self.host) else {
            return 0;
        };

        let mut devices = self.devices.write().await;
        let mut applied = 0;
        for entry in &saved.devices {
            let known = devices
                .iter()
                .any(|stored| stored.name.eq_ignore_ascii_case(&entry.name));
            if !known {
                devices.push(entry.clone());
                applied += 1;
            }
        }
        if applied > 0 {
            tracing::debug!("applied {} saved device entries to {}", applied, self.host);
        }
        applied
    }
}
