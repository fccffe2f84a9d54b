//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Transport double answering from a canned path->body table and
/// recording every requested path. Unmapped paths answer 404.
pub(crate) struct MockTransport {
    replies: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub(crate) fn new(replies: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .iter()
                    .map(|(path, body)| ((*path).to_string(), (*body).to_string()))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every path requested so far, in order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Replaces the canned body for a path.
    pub(crate) fn set_reply(&self, path: &str, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), body.to_string());
    }
}

impl Transport for MockTransport {
    fn get(&self, path: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        self.requests.lock().unwrap().push(path.to_string());
        let reply = self.replies.lock().unwrap().get(path).cloned();
        Box::pin(async move { reply.ok_or(Error::Status { status: 404 }) })
    }

    fn endpoint(&self) -> String {
        "mock".to_string()
    }
}
