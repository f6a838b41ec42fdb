//! Practice results of the verb tables and their status filters.
//!
//! The results table offers two filters over the same status column. The
//! buttons filter on one status at a time, and the search pane selects any
//! set of statuses. A row is shown when it passes both.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Outcome of the last practice of a verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerbStatus {
    Successful,
    Failed,
    NotDone,
}

impl VerbStatus {
    /// Every status, in display order.
    pub const ALL: [VerbStatus; 3] = [Self::Successful, Self::Failed, Self::NotDone];

    /// Parses the `is success` column: `"True"`, `"False"` or `"None"`.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "True" => Some(Self::Successful),
            "False" => Some(Self::Failed),
            "None" => Some(Self::NotDone),
            _ => None,
        }
    }

    /// Row class, also the id of the matching filter button.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Successful => "success",
            Self::Failed => "unsuccess",
            Self::NotDone => "not-tested",
        }
    }

    /// Option label in the search pane.
    pub fn pane_label(self) -> &'static str {
        match self {
            Self::Successful => "Successful",
            Self::Failed => "Failed",
            Self::NotDone => "Not done",
        }
    }
}

impl fmt::Display for VerbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Error returned when an `is success` value is not a known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verb status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for VerbStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbRow {
    pub infinitive: String,
    #[serde(rename = "simple past")]
    pub simple_past: String,
    #[serde(rename = "past participle")]
    pub past_participle: String,
    pub translation: String,
    #[serde(rename = "is success")]
    pub is_success: String,
}

impl VerbRow {
    /// Status of the row, `None` if the column holds something unexpected.
    pub fn status(&self) -> Option<VerbStatus> {
        VerbStatus::parse(&self.is_success)
    }

    /// Alternative forms of a `/`-separated column, one per line when displayed.
    pub fn forms(column: &str) -> Vec<&str> {
        column.split('/').collect()
    }
}

/// Number of rows per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub successful: usize,
    pub failed: usize,
    pub not_done: usize,
    /// Rows whose status could not be parsed.
    pub unknown: usize,
}

impl StatusCounts {
    /// Counts the statuses of `rows`.
    pub fn of(rows: &[VerbRow]) -> Self {
        let mut counts = Self::default();
        for row in rows {
            match row.status() {
                Some(VerbStatus::Successful) => counts.successful += 1,
                Some(VerbStatus::Failed) => counts.failed += 1,
                Some(VerbStatus::NotDone) => counts.not_done += 1,
                None => counts.unknown += 1,
            }
        }
        counts
    }

    /// Rows with the given status.
    pub fn get(&self, status: VerbStatus) -> usize {
        match status {
            VerbStatus::Successful => self.successful,
            VerbStatus::Failed => self.failed,
            VerbStatus::NotDone => self.not_done,
        }
    }
}

/// Button and search pane state of the results table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    active: Option<VerbStatus>,
    panes: BTreeSet<VerbStatus>,
}

impl StatusFilter {
    /// Creates a filter showing every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// The status whose button is active.
    pub fn active(&self) -> Option<VerbStatus> {
        self.active
    }

    /// Handles a click on the button of `status`.
    ///
    /// Clicking the active button switches it off; clicking another one
    /// replaces the active filter. Returns the new active status.
    pub fn toggle(&mut self, status: VerbStatus) -> Option<VerbStatus> {
        self.active = if self.active == Some(status) { None } else { Some(status) };
        self.active
    }

    /// Statuses selected in the search pane.
    pub fn pane_selection(&self) -> &BTreeSet<VerbStatus> {
        &self.panes
    }

    /// Selects or deselects a search pane option.
    pub fn select_pane(&mut self, status: VerbStatus, selected: bool) {
        if selected {
            self.panes.insert(status);
        } else {
            self.panes.remove(&status);
        }
    }

    /// Switches off the button and empties the pane selection.
    pub fn clear(&mut self) {
        self.active = None;
        self.panes.clear();
    }

    /// Check if no filter is applied.
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.panes.is_empty()
    }

    /// Whether a row with `status` is shown.
    ///
    /// Rows with an unknown status match no status, so they are only shown
    /// while no filter is applied.
    pub fn matches(&self, status: Option<VerbStatus>) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(status) = status else {
            return false;
        };
        self.active.is_none_or(|active| active == status) && (self.panes.is_empty() || self.panes.contains(&status))
    }

    /// The rows shown under this filter, in table order.
    pub fn apply<'a>(&self, rows: &'a [VerbRow]) -> Vec<&'a VerbRow> {
        rows.iter().filter(|row| self.matches(row.status())).collect()
    }
}

/// Text of the filter button of `status`, e.g. `"success (3)"`.
///
/// Counts cover every row, not only the ones currently shown.
pub fn button_label(status: VerbStatus, counts: &StatusCounts) -> String {
    format!("{} ({})", status.class_name(), counts.get(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(infinitive: &str, is_success: &str) -> VerbRow {
        VerbRow {
            infinitive: infinitive.to_string(),
            simple_past: String::new(),
            past_participle: String::new(),
            translation: String::new(),
            is_success: is_success.to_string(),
        }
    }

    fn rows() -> Vec<VerbRow> {
        vec![
            row("be", "True"),
            row("go", "False"),
            row("see", "None"),
            row("take", "True"),
            row("draw", "maybe"),
        ]
    }

    fn shown(filter: &StatusFilter, rows: &[VerbRow]) -> Vec<String> {
        filter.apply(rows).iter().map(|r| r.infinitive.clone()).collect()
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(VerbStatus::parse("True"), Some(VerbStatus::Successful));
        assert_eq!(VerbStatus::parse("False"), Some(VerbStatus::Failed));
        assert_eq!(VerbStatus::parse("None"), Some(VerbStatus::NotDone));
        assert_eq!(VerbStatus::parse("true"), None);
        assert_eq!("".parse::<VerbStatus>(), Err(UnknownStatus(String::new())));
    }

    #[test]
    fn test_toggle_off_and_replace() {
        let mut filter = StatusFilter::new();
        assert_eq!(filter.toggle(VerbStatus::Failed), Some(VerbStatus::Failed));
        assert_eq!(filter.toggle(VerbStatus::Successful), Some(VerbStatus::Successful));
        assert_eq!(filter.toggle(VerbStatus::Successful), None);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_button_filter() {
        let rows = rows();
        let mut filter = StatusFilter::new();
        assert_eq!(shown(&filter, &rows), vec!["be", "go", "see", "take", "draw"]);

        filter.toggle(VerbStatus::Successful);
        assert_eq!(shown(&filter, &rows), vec!["be", "take"]);

        filter.toggle(VerbStatus::NotDone);
        assert_eq!(shown(&filter, &rows), vec!["see"]);
    }

    #[test]
    fn test_pane_multi_select_combines_with_button() {
        let rows = rows();
        let mut filter = StatusFilter::new();
        filter.select_pane(VerbStatus::Failed, true);
        filter.select_pane(VerbStatus::NotDone, true);
        assert_eq!(shown(&filter, &rows), vec!["go", "see"]);

        filter.toggle(VerbStatus::Failed);
        assert_eq!(shown(&filter, &rows), vec!["go"]);

        filter.toggle(VerbStatus::Successful);
        assert!(shown(&filter, &rows).is_empty());

        filter.clear();
        assert_eq!(shown(&filter, &rows).len(), 5);
    }

    #[test]
    fn test_unknown_status_only_shown_unfiltered() {
        let mut filter = StatusFilter::new();
        assert!(filter.matches(None));
        filter.select_pane(VerbStatus::Successful, true);
        assert!(!filter.matches(None));
        filter.select_pane(VerbStatus::Successful, false);
        assert!(filter.matches(None));
    }

    #[test]
    fn test_counts_and_labels() {
        let counts = StatusCounts::of(&rows());
        assert_eq!(
            counts,
            StatusCounts {
                successful: 2,
                failed: 1,
                not_done: 1,
                unknown: 1,
            }
        );
        assert_eq!(button_label(VerbStatus::Successful, &counts), "success (2)");
        assert_eq!(button_label(VerbStatus::Failed, &counts), "unsuccess (1)");
        assert_eq!(button_label(VerbStatus::NotDone, &counts), "not-tested (1)");
    }

    #[test]
    fn test_row_from_json() {
        let row: VerbRow = serde_json::from_str(
            r#"{ "infinitive": "get", "simple past": "got", "past participle": "got/gotten",
                 "translation": "obtenir", "is success": "None" }"#,
        )
        .unwrap();
        assert_eq!(row.status(), Some(VerbStatus::NotDone));
        assert_eq!(VerbRow::forms(&row.past_participle), vec!["got", "gotten"]);
    }
}
