//! Dependent selects of the admin forms.
//!
//! A chain is ordered: the choices offered by each select are filtered by the
//! values of the selects before it. Changing a select empties every select
//! after it, since their values may no longer belong to the new parent.

use serde::Deserialize;
use serde::Serialize;

/// Number of choices from which the search box is shown.
pub const MINIMUM_RESULTS_FOR_SEARCH: usize = 10;

/// Table type whose tables never have an owner.
pub const DEFAULT_TABLE_TYPE: &str = "defaulttable";

/// Placeholder shown on the owner select of a default table.
pub const DEFAULT_TABLE_OWNER_PLACEHOLDER: &str = "Disabled for Default Table.";

/// One select of a chain, with the model field it autocompletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentSelect {
    /// Element id, also the query key under which later selects send its value.
    pub id: String,
    /// Human name used in placeholders.
    pub name: String,
    pub app_label: String,
    pub model_name: String,
    pub field_name: String,
    /// Selected choice id.
    pub value: Option<String>,
    /// Disabled selects keep no value.
    pub disabled: bool,
    /// Overrides the computed placeholder when set.
    pub placeholder_override: Option<String>,
}

impl DependentSelect {
    /// Creates an empty select.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        app_label: impl Into<String>,
        model_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            app_label: app_label.into(),
            model_name: model_name.into(),
            field_name: field_name.into(),
            value: None,
            disabled: false,
            placeholder_override: None,
        }
    }

    fn has_value(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// An ordered chain of dependent selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectChain {
    selects: Vec<DependentSelect>,
}

impl SelectChain {
    /// Creates a chain; `selects[i]` depends on `selects[i - 1]`.
    pub fn new(selects: Vec<DependentSelect>) -> Self {
        Self { selects }
    }

    /// Returns the selects in order.
    pub fn selects(&self) -> &[DependentSelect] {
        &self.selects
    }

    /// Returns the select at `index`.
    pub fn get(&self, index: usize) -> Option<&DependentSelect> {
        self.selects.get(index)
    }

    /// Position of the select with the given element id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.selects.iter().position(|s| s.id == id)
    }

    /// Selects a value and empties every select after it.
    ///
    /// Returns `false` if there is no select at `index` or it is disabled.
    pub fn set_value(&mut self, index: usize, value: Option<String>) -> bool {
        match self.selects.get_mut(index) {
            Some(select) if !select.disabled => select.value = value,
            _ => return false,
        }
        for later in self.selects.iter_mut().skip(index + 1) {
            later.value = None;
        }
        true
    }

    /// Autocomplete query parameters for the select at `index`.
    ///
    /// Predecessor values are added walking back from the closest one and
    /// stop at the first predecessor without a value.
    pub fn query(&self, index: usize, term: &str, page: u32) -> Vec<(String, String)> {
        let Some(select) = self.selects.get(index) else {
            return Vec::new();
        };

        let mut params = vec![
            ("term".to_string(), term.to_string()),
            ("page".to_string(), page.to_string()),
            ("app_label".to_string(), select.app_label.clone()),
            ("model_name".to_string(), select.model_name.clone()),
            ("field_name".to_string(), select.field_name.clone()),
        ];

        for previous in self.selects[..index].iter().rev() {
            match &previous.value {
                Some(value) if !value.is_empty() => params.push((previous.id.clone(), value.clone())),
                _ => break,
            }
        }

        params
    }

    /// Placeholder for the select at `index` while it has no value.
    pub fn placeholder(&self, index: usize) -> Option<String> {
        let select = self.selects.get(index)?;
        if let Some(text) = &select.placeholder_override {
            return Some(text.clone());
        }
        if select.has_value() || index == 0 {
            return None;
        }
        let previous = &self.selects[index - 1];
        if previous.has_value() {
            None
        } else {
            Some(format!("Select a {} first.", previous.name))
        }
    }

    fn select_mut(&mut self, id: &str) -> Option<&mut DependentSelect> {
        self.selects.iter_mut().find(|s| s.id == id)
    }
}

/// Whether the select widget shows its search box for `count` choices.
pub fn should_show_search(count: usize) -> bool {
    count >= MINIMUM_RESULTS_FOR_SEARCH
}

/// Disables the owner select of tables of the default type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOwnerRule {
    /// Element id of the owner select.
    pub owner_id: String,
}

impl Default for TableOwnerRule {
    fn default() -> Self {
        Self {
            owner_id: "id_owner".to_string(),
        }
    }
}

impl TableOwnerRule {
    /// Applies the rule after the table type select changed to `table_type`.
    pub fn apply(&self, table_type: &str, chain: &mut SelectChain) {
        let Some(index) = chain.position(&self.owner_id) else {
            return;
        };

        if table_type == DEFAULT_TABLE_TYPE {
            chain.set_value(index, None);
            if let Some(owner) = chain.select_mut(&self.owner_id) {
                owner.disabled = true;
                owner.placeholder_override = Some(DEFAULT_TABLE_OWNER_PLACEHOLDER.to_string());
            }
        } else if let Some(owner) = chain.select_mut(&self.owner_id) {
            owner.disabled = false;
            owner.placeholder_override = None;
        }
    }
}

/// One autocomplete choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

/// Whether more pages of choices exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub more: bool,
}

/// A page of autocomplete choices as returned by the admin autocomplete view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoicesPage {
    pub results: Vec<Choice>,
    #[serde(default)]
    pub pagination: Pagination,
}
