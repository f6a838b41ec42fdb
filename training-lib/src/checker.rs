//! Existence check seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CheckError;

/// Server verdict on whether a value is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// `{"exists": true}`
    Taken,
    /// `{"exists": false}`
    Available,
    /// The body had no boolean `exists` field.
    Unknown,
}

impl CheckOutcome {
    /// Reads the `exists` field of a check response.
    ///
    /// ```
    /// use serde_json::json;
    /// use training_lib::checker::CheckOutcome;
    ///
    /// assert_eq!(CheckOutcome::from_json(&json!({"exists": true})), CheckOutcome::Taken);
    /// assert_eq!(CheckOutcome::from_json(&json!({"exists": "yes"})), CheckOutcome::Unknown);
    /// assert_eq!(CheckOutcome::from_json(&json!({})), CheckOutcome::Unknown);
    /// ```
    pub fn from_json(body: &Value) -> Self {
        match body.get("exists").and_then(Value::as_bool) {
            Some(true) => Self::Taken,
            Some(false) => Self::Available,
            None => Self::Unknown,
        }
    }
}

/// Asks a server whether a value is already in use.
///
/// `params` are the query parameters in the order they should be sent.
#[async_trait]
pub trait ExistenceChecker: Send + Sync {
    /// Runs one check against `endpoint`.
    async fn check(&self, endpoint: &str, params: &[(String, String)]) -> Result<CheckOutcome, CheckError>;
}
