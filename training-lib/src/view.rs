//! Where validation outcomes are displayed.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// Prefix of the id given to the inline "already in use" annotation.
pub const ANNOTATION_ID_PREFIX: &str = "error_exists_";

/// Id of the inline annotation that belongs to an element.
///
/// ```
/// assert_eq!(training_lib::view::annotation_id("id_username"), "error_exists_id_username");
/// ```
pub fn annotation_id(element_id: &str) -> String {
    format!("{}{}", ANNOTATION_ID_PREFIX, element_id)
}

/// Display surface for validation outcomes.
///
/// `key` is the id of the bound element. Every method must be idempotent: a
/// view holds at most one annotation per key and each call replaces it.
pub trait ConflictView: Send + Sync {
    /// Mark the element as conflicting and show `message` next to it.
    fn show_conflict(&self, key: &str, message: &str);

    /// Remove any annotation and the conflict mark.
    fn clear_conflict(&self, key: &str);

    /// The check could not be answered; show `reason` instead of a verdict.
    fn show_unavailable(&self, key: &str, reason: &str);
}

/// What a view currently shows for one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldStatus {
    /// No annotation.
    #[default]
    Clear,
    /// The value is already in use.
    Conflict {
        /// Id of the annotation node.
        annotation_id: String,
        /// Conflict message shown to the user.
        message: String,
    },
    /// The last check failed.
    Unavailable {
        /// Why no verdict is shown.
        reason: String,
    },
}

impl FieldStatus {
    /// Check if the element is marked as conflicting.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// In-memory view that records the status of every element.
#[derive(Debug, Clone, Default)]
pub struct MemoryView {
    statuses: Arc<RwLock<HashMap<String, FieldStatus>>>,
}

impl MemoryView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of an element.
    pub fn status(&self, key: &str) -> FieldStatus {
        self.statuses
            .read()
            .ok()
            .and_then(|guard| guard.get(key).cloned())
            .unwrap_or_default()
    }

    /// Conflict message currently shown for an element, if any.
    pub fn conflict_message(&self, key: &str) -> Option<String> {
        match self.status(key) {
            FieldStatus::Conflict { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Ids of every annotation node currently shown.
    pub fn annotation_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .statuses
            .read()
            .map(|guard| {
                guard
                    .iter()
                    .filter(|(_, status)| status.is_conflict())
                    .map(|(key, _)| annotation_id(key))
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids
    }

    fn set(&self, key: &str, status: FieldStatus) {
        if let Ok(mut guard) = self.statuses.write() {
            if status == FieldStatus::Clear {
                guard.remove(key);
            } else {
                guard.insert(key.to_string(), status);
            }
        }
    }
}

impl ConflictView for MemoryView {
    fn show_conflict(&self, key: &str, message: &str) {
        self.set(
            key,
            FieldStatus::Conflict {
                annotation_id: annotation_id(key),
                message: message.to_string(),
            },
        );
    }

    fn clear_conflict(&self, key: &str) {
        self.set(key, FieldStatus::Clear);
    }

    fn show_unavailable(&self, key: &str, reason: &str) {
        self.set(
            key,
            FieldStatus::Unavailable {
                reason: reason.to_string(),
            },
        );
    }
}
