//! Prints validation state changes to the terminal.

use training_lib::view::ConflictView;
use training_lib::view::annotation_id;

/// A view that writes every state change to stdout.
#[derive(Debug, Default)]
pub struct TerminalView;

impl ConflictView for TerminalView {
    fn show_conflict(&self, key: &str, message: &str) {
        println!("{} [{}] {}", key, annotation_id(key), message);
    }

    fn clear_conflict(&self, key: &str) {
        println!("{} ok", key);
    }

    fn show_unavailable(&self, key: &str, reason: &str) {
        println!("{} unavailable: {}", key, reason);
    }
}
