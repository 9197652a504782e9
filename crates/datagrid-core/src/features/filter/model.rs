use crate::value::CellValue;
use serde::{Deserialize, Serialize};

/// One filter condition on a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridFilterItem {
    /// Identifier, used to update or delete the item. Assigned when missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Field of the filtered column.
    pub column_field: String,
    /// Operator of the column. Defaults to the first operator of the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_value: Option<String>,
    /// Raw filter value, parsed through the column's value parser before filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
}

impl GridFilterItem {
    /// An item without id. A null value is stored as no value.
    pub fn new(
        column_field: impl Into<String>,
        operator_value: impl Into<String>,
        value: impl Into<CellValue>,
    ) -> Self {
        let value = value.into();
        Self {
            id: None,
            column_field: column_field.into(),
            operator_value: Some(operator_value.into()),
            value: (!value.is_null()).then_some(value),
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// How the items of a filter model combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridLinkOperator {
    /// Every item must match.
    #[default]
    And,
    /// At least one item must match.
    Or,
}

/// Filter items, link operator and quick filter values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridFilterModel {
    /// Filter items.
    pub items: Vec<GridFilterItem>,
    /// Combination of the items.
    pub link_operator: GridLinkOperator,
    /// Quick filter tokens.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quick_filter_values: Vec<String>,
    /// Combination of the quick filter tokens.
    pub quick_filter_logic_operator: GridLinkOperator,
}

impl GridFilterModel {
    /// A model combining `items` with `link_operator`.
    pub fn new(items: Vec<GridFilterItem>, link_operator: GridLinkOperator) -> Self {
        Self {
            items,
            link_operator,
            ..Self::default()
        }
    }

    /// Whether the model equals the default model (nothing to filter on).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
