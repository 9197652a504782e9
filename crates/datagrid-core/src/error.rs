//! Error types returned by the grid API.

use crate::value::GridRowId;
use thiserror::Error;

/// Errors raised by [`GridApi`](crate::GridApi) operations.
///
/// Misuse of the API (calling a disabled feature, editing a row twice, ...) is reported through
/// this type. Inconsistent data (a filter item pointing at a removed column, a pinned field that
/// does not exist) is never an error: it is skipped and logged instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// An API method was called while the feature backing it is disabled.
    #[error("you cannot call `{method}` when `{prop}` is true")]
    FeatureDisabled {
        /// Name of the API method.
        method: &'static str,
        /// Name of the prop disabling the feature.
        prop: &'static str,
    },
    /// A feature is enabled without a prop it requires.
    #[error("`{prop}` is required when `{feature}` is true")]
    MissingProp {
        /// Name of the missing prop.
        prop: &'static str,
        /// Name of the prop enabling the feature.
        feature: &'static str,
    },
    /// No registered strategy is available for a capability.
    #[error("no strategy available for capability `{capability}`")]
    NoStrategyAvailable {
        /// Capability name.
        capability: &'static str,
    },
    /// A filter item references a column that declares no filter operators.
    #[error("no filter operators found for column `{field}`")]
    MissingFilterOperators {
        /// Column field.
        field: String,
    },
    /// A filter item references an operator unknown to its column.
    #[error("no filter operator found for column `{field}` with operator `{operator}`")]
    UnknownFilterOperator {
        /// Column field.
        field: String,
        /// Operator value found in the filter item.
        operator: String,
    },
    /// A row could not be identified.
    #[error(
        "the row id could not be resolved; every row needs a unique `id` field or a `get_row_id` accessor"
    )]
    MissingRowId,
    /// No row with the given id exists.
    #[error("no row with id `{0}` found")]
    RowNotFound(GridRowId),
    /// No column with the given field exists.
    #[error("no column with field `{0}` found")]
    ColumnNotFound(String),
    /// The row is already in edit mode.
    #[error("the row with id `{0}` is not in view mode")]
    RowAlreadyInEditMode(GridRowId),
    /// The row is not in edit mode.
    #[error("the row with id `{0}` is not in edit mode")]
    RowNotInEditMode(GridRowId),
    /// The cell is not part of the row being edited.
    #[error("the cell with id `{id}` and field `{field}` is not in edit mode")]
    CellNotInEditMode {
        /// Row id.
        id: GridRowId,
        /// Column field.
        field: String,
    },
    /// A `process_row_update` callback rejected the update.
    #[error("processRowUpdate failed: {0}")]
    ProcessRowUpdate(String),
    /// An event handler failed.
    #[error("event handler failed: {0}")]
    Handler(String),
    /// Exported state could not be (de)serialized.
    #[error("state serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Serialization(err.to_string())
    }
}
