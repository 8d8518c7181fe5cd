use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{TransactionRecord, TransactionTable};

// ---------------------------------------------------------------------------
// PropertyType – the four selectable classifications
// ---------------------------------------------------------------------------

/// Value of the `type_local` column a view is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Appartement,
    Dependance,
    LocalIndustriel,
    Maison,
}

impl PropertyType {
    /// Selector order.
    pub const ALL: [PropertyType; 4] = [
        PropertyType::Appartement,
        PropertyType::Dependance,
        PropertyType::LocalIndustriel,
        PropertyType::Maison,
    ];

    /// The exact `type_local` text used in the yearly files.
    pub fn label(self) -> &'static str {
        match self {
            PropertyType::Appartement => "Appartement",
            PropertyType::Dependance => "Dépendance",
            PropertyType::LocalIndustriel => "Local industriel. commercial ou assimilé",
            PropertyType::Maison => "Maison",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Whether a record belongs to this property type.
    pub fn matches(self, record: &TransactionRecord) -> bool {
        record.type_local.as_deref() == Some(self.label())
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// FilteredView – borrowed subset of one table
// ---------------------------------------------------------------------------

/// Rows of a table with one property type, in table order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub property_type: PropertyType,
    rows: Vec<&'a TransactionRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn rows(&self) -> &[&'a TransactionRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TransactionRecord> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Restrict `table` to `property_type`. An empty result is not an error.
pub fn filter_by_type(table: &TransactionTable, property_type: PropertyType) -> FilteredView<'_> {
    let rows: Vec<&TransactionRecord> = table
        .records()
        .iter()
        .filter(|r| property_type.matches(r))
        .collect();

    if rows.is_empty() {
        log::debug!(
            "No '{property_type}' rows in {}",
            table.source().display()
        );
    }

    FilteredView {
        property_type,
        rows,
    }
}
