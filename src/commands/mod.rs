//! Command handling for ESPEasy operations.
//!
//! This module implements the request/parse protocol shared by the
//! [`Esp`](crate::Esp) client and the device wrappers: fetching and
//! caching the `/json` status document and issuing `/control` commands.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::protocol::command::{Command, PinLevel};
use crate::protocol::status::{self, ControlReply, PinReply, StatusDocument, Task};
use crate::transport::Transport;

/// Path of the full status document.
pub const STATUS_PATH: &str = "/json";

/// Command handler for one ESPEasy unit.
///
/// Cheap to clone; clones share the transport and the cached status
/// document, so a refresh through any clone is visible to all of them.
pub struct CommandHandler<T> {
    transport: Arc<T>,
    status: Arc<RwLock<Option<StatusDocument>>>,
}

impl<T> Clone for CommandHandler<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            status: Arc::clone(&self.status),
        }
    }
}

impl<T: Transport> CommandHandler<T> {
    /// Creates a new command handler over a transport.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            status: Arc::new(RwLock::new(None)),
        }
    }

    /// Endpoint label of the underlying transport.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    // ==================== Status ====================

    /// Fetches `/json`, replaces the cached document, and returns it.
    pub async fn fetch_status(&self) -> Result<StatusDocument> {
        let body = self.transport.get(STATUS_PATH).await?;
        let document: StatusDocument = serde_json::from_str(&body)?;
        *self.status.write().await = Some(document.clone());
        tracing::debug!(
            "{} reports unit {:?} with {} tasks",
            self.endpoint(),
            document.unit_name().unwrap_or("<unnamed>"),
            document.sensors.len()
        );
        Ok(document)
    }

    /// The cached status document, if one was fetched.
    pub async fn cached_status(&self) -> Option<StatusDocument> {
        self.status.read().await.clone()
    }

    /// The cached status document, or [`Error::NotConnected`].
    pub async fn require_status(&self) -> Result<StatusDocument> {
        self.cached_status().await.ok_or(Error::NotConnected)
    }

    /// Seeds the cache with a document fetched elsewhere (scan probes).
    pub(crate) async fn prime_status(&self, document: StatusDocument) {
        *self.status.write().await = Some(document);
    }

    /// Looks up a task by name in the cached document.
    pub async fn task(&self, name: &str) -> Result<Task> {
        let document = self.require_status().await?;
        document
            .task(name)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound {
                name: name.to_string(),
                host: self.endpoint(),
            })
    }

    // ==================== Control ====================

    /// Sends a control command and classifies the acknowledgement.
    pub async fn control(&self, command: &Command) -> Result<ControlReply> {
        let body = self.transport.get(&command.path()).await?;
        Ok(ControlReply::parse(&body))
    }

    /// Sets a GPIO pin to a level.
    pub async fn gpio_write(&self, pin: u8, level: PinLevel) -> Result<ControlReply> {
        self.control(&Command::GpioWrite { pin, level }).await
    }

    /// Toggles a GPIO pin.
    pub async fn gpio_toggle(&self, pin: u8) -> Result<ControlReply> {
        self.control(&Command::GpioToggle { pin }).await
    }

    /// Queries the level of a GPIO pin.
    ///
    /// Some builds answer `status,gpio` with malformed JSON; the state
    /// field is recovered from the raw text in that case.
    pub async fn gpio_state(&self, pin: u8) -> Result<PinLevel> {
        let body = self.transport.get(&Command::GpioStatus { pin }.path()).await?;
        match serde_json::from_str::<PinReply>(&body) {
            Ok(reply) => Ok(reply.level()),
            Err(err) => {
                if let Some(state) = status::scrape_state(&body) {
                    tracing::warn!(
                        "{} sent a malformed status body, scraped state {}",
                        self.endpoint(),
                        state
                    );
                    Ok(PinLevel::from_state(state))
                } else {
                    Err(Error::UnexpectedResponse {
                        message: format!("status,gpio,{pin} answered neither JSON nor a state field ({err})"),
                    })
                }
            }
        }
    }

    /// Raw GET of an arbitrary path, returning the body unparsed.
    pub async fn request(&self, path: &str) -> Result<String> {
        self.transport.get(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    const SMALL_STATUS: &str = r#"{
        "System": {"Unit Name": "bench", "Unit Number": 1},
        "Sensors": [
            {
                "TaskValues": [{"ValueNumber": 1, "Name": "State", "NrDecimals": 0, "Value": 1}],
                "Type": "switch",
                "TaskName": "door",
                "TaskEnabled": "true",
                "TaskNumber": 1
            }
        ],
        "TTL": 60000
    }"#;

    #[tokio::test]
    async fn test_fetch_status_caches_document() {
        let transport = MockTransport::new(&[("/json", SMALL_STATUS)]);
        let handler = CommandHandler::new(Arc::clone(&transport));

        assert!(handler.cached_status().await.is_none());
        assert!(matches!(
            handler.require_status().await,
            Err(Error::NotConnected)
        ));

        let document = handler.fetch_status().await.unwrap();
        assert_eq!(document.unit_name(), Some("bench"));

        let cached = handler.cached_status().await.unwrap();
        assert_eq!(cached, document);

        let task = handler.task("door").await.unwrap();
        assert_eq!(task.number, Some(1));
        assert!(matches!(
            handler.task("missing").await,
            Err(Error::TaskNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_clones_share_the_cache() {
        let transport = MockTransport::new(&[("/json", SMALL_STATUS)]);
        let handler = CommandHandler::new(Arc::clone(&transport));
        let clone = handler.clone();

        handler.fetch_status().await.unwrap();
        assert!(clone.cached_status().await.is_some());
    }

    #[tokio::test]
    async fn test_gpio_write_requests_expected_path() {
        let transport = MockTransport::new(&[(
            "/control?cmd=GPIO,2,1",
            r#"{"log": "", "plugin": 1, "pin": 2, "mode": "output", "state": 1}"#,
        )]);
        let handler = CommandHandler::new(Arc::clone(&transport));

        let reply = handler.gpio_write(2, PinLevel::High).await.unwrap();
        let pin_reply = reply.pin_reply().unwrap();
        assert_eq!(pin_reply.pin, 2);
        assert_eq!(pin_reply.level(), PinLevel::High);

        assert_eq!(transport.requests(), vec!["/control?cmd=GPIO,2,1"]);
    }

    #[tokio::test]
    async fn test_text_acknowledgement_is_accepted() {
        let transport = MockTransport::new(&[("/control?cmd=gpiotoggle,2", "OK")]);
        let handler = CommandHandler::new(Arc::clone(&transport));

        let reply = handler.gpio_toggle(2).await.unwrap();
        assert_eq!(reply.as_text(), Some("OK"));
    }

    #[tokio::test]
    async fn test_gpio_state_with_broken_json_body() {
        let transport = MockTransport::new(&[(
            "/control?cmd=status,gpio,2",
            "{\"log\": \"\",\"plugin\": 1,\"pin\": 2,\"mode\": \"output\",\"state\": 1\n",
        )]);
        let handler = CommandHandler::new(Arc::clone(&transport));

        let level = handler.gpio_state(2).await.unwrap();
        assert_eq!(level, PinLevel::High);
    }

    #[tokio::test]
    async fn test_gpio_state_rejects_garbage() {
        let transport = MockTransport::new(&[("/control?cmd=status,gpio,2", "<html>busy</html>")]);
        let handler = CommandHandler::new(Arc::clone(&transport));

        assert!(matches!(
            handler.gpio_state(2).await,
            Err(Error::UnexpectedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let transport = MockTransport::new(&[]);
        let handler = CommandHandler::new(Arc::clone(&transport));

        assert!(matches!(
            handler.fetch_status().await,
            Err(Error::Status { status: 404 })
        ));
    }
}
