//! Transport layer for ESPEasy communication.
//!
//! This module provides the abstraction over how requests reach a unit.
//! The stock implementation is plain HTTP; tests substitute their own.

pub mod http;

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Trait for transport implementations.
///
/// ESPEasy's interface is request/response only, so a transport is a
/// single bounded GET returning the response body.
pub trait Transport: Send + Sync {
    /// Issues a GET for `path` (absolute, e.g. `/json`) and returns the
    /// response body.
    fn get(&self, path: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;

    /// Label for the remote end, used in log messages.
    fn endpoint(&self) -> String;
}

pub use http::{HttpConfig, HttpTransport};
