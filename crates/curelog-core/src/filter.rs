//! Plain filter values passed into the series builder.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Selector value meaning "no type filter".
pub const ALL_TYPES: &str = "All";

/// Type selector: every type, or exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeFilter {
    #[default]
    All,
    Only(String),
}

impl TypeFilter {
    /// Parse a selector string. `"All"` and blank mean no filter.
    pub fn from_selector(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == ALL_TYPES {
            TypeFilter::All
        } else {
            TypeFilter::Only(s.to_string())
        }
    }

    pub fn accepts(&self, soap_type: &str) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => t == soap_type,
        }
    }
}

/// Filters applied before grouping readings into series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFilter {
    pub soap_type: TypeFilter,
    /// Case-insensitive substring of the soap name. Empty matches everything.
    pub search: String,
}

impl SeriesFilter {
    pub fn new(soap_type: TypeFilter, search: impl Into<String>) -> Self {
        Self {
            soap_type,
            search: search.into(),
        }
    }

    /// True when either part narrows the data.
    pub fn is_active(&self) -> bool {
        self.soap_type != TypeFilter::All || !self.search.is_empty()
    }

    /// Whether a joined row with this soap name and resolved type survives.
    pub fn accepts(&self, soap_name: &str, soap_type: &str) -> bool {
        if !self.soap_type.accepts(soap_type) {
            return false;
        }
        self.search.is_empty()
            || soap_name
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }
}

/// Sorted distinct types, for building a type selector.
pub fn distinct_types<'a>(types: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    types
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
