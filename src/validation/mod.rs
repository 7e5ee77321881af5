//! Keeps a [`ValidationState`] eventually consistent with the edited fable.
//!
//! The [`ValidationBridge`] does the bookkeeping: it hands out one ticket per
//! document version and only lets the result for the current version in. The
//! [`ValidationWorker`] drives it from the store's snapshot channel, debouncing
//! bursts of edits so only the latest document is sent.

use crate::error::ApiError;
use crate::fable::{FableDocument, ValidationState};
use async_trait::async_trait;

mod bridge;
mod report;
mod worker;

pub use bridge::*;
pub use report::*;
pub use worker::*;

/// Anything that can validate a fable, typically the backend's expand endpoint.
#[async_trait]
pub trait FableValidator: Send + Sync {
    async fn expand(&self, fable: &FableDocument) -> Result<ValidationState, ApiError>;
}
