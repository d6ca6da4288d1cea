//! HTTP route handlers.

use serde::Serialize;

pub mod confirmations;
pub mod guests;
pub mod health;

/// Envelope used by the v1 endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
