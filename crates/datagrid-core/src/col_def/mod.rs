//! Column definitions and the built-in column types.
//!
//! A [`GridColDef`] is owned by the caller and never modified by the grid. When columns enter the
//! state they are resolved into [`GridStateColDef`]s: type defaults (filter operators, comparator,
//! quick-filter factory, value parser) are filled in and the computed width is attached.

mod boolean_operators;
mod comparators;
mod date_operators;
mod number_operators;
mod single_select_operators;
mod string_operators;

pub use boolean_operators::grid_boolean_operators;
pub use comparators::{
    grid_boolean_comparator, grid_date_comparator, grid_number_comparator,
    grid_string_or_number_comparator,
};
pub use date_operators::{grid_date_operators, parse_filter_date};
pub use number_operators::{get_grid_numeric_quick_filter_fn, grid_numeric_operators};
pub use single_select_operators::{
    get_grid_single_select_quick_filter_fn, grid_single_select_operators,
};
pub use string_operators::{get_grid_string_quick_filter_fn, grid_string_operators};

use crate::features::filter::GridFilterItem;
use crate::value::{CellValue, GridRowId, GridRowModel};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Default column width.
pub const DEFAULT_COLUMN_WIDTH: f64 = 100.0;
/// Default minimum column width.
pub const DEFAULT_COLUMN_MIN_WIDTH: f64 = 50.0;

/// Parameters handed to a filter predicate.
#[derive(Debug, Clone)]
pub struct GridCellParams<'a> {
    /// Row id.
    pub id: &'a GridRowId,
    /// Column field.
    pub field: &'a str,
    /// Cell value (after the column's value getter).
    pub value: CellValue,
    /// The whole row.
    pub row: &'a GridRowModel,
}

/// A row predicate produced by a filter operator for one filter item.
pub type GridFilterPredicate = Rc<dyn Fn(&GridCellParams<'_>) -> bool>;

/// Filter function factory. Returns `None` when the item cannot filter (e.g. empty value).
pub type GetApplyFilterFn =
    Rc<dyn Fn(&GridFilterItem, &GridStateColDef) -> Option<GridFilterPredicate>>;

/// Quick filter factory: one token in, a predicate out (or `None` if the column cannot match it).
pub type GetApplyQuickFilterFn = Rc<dyn Fn(&str, &GridStateColDef) -> Option<GridFilterPredicate>>;

/// Cell comparator used by sorting.
pub type GridComparatorFn = Rc<dyn Fn(&CellValue, &CellValue) -> Ordering>;

/// Computes a cell value from the row.
pub type GridValueGetter = Rc<dyn Fn(&GridRowId, &GridRowModel) -> CellValue>;

/// Parses a raw input value (filter input, edit input) into the column's value type.
pub type GridValueParser = Rc<dyn Fn(&CellValue) -> CellValue>;

/// Edit props handed to [`GridColDef::pre_process_edit_cell_props`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridEditCellProps {
    /// Value being edited.
    pub value: CellValue,
    /// Whether the value was rejected.
    pub error: bool,
}

/// Validates or rewrites an edited value. Receives the row id, the row being edited and the
/// proposed props.
pub type GridPreProcessEditCellProps =
    Rc<dyn Fn(&GridRowId, &GridRowModel, GridEditCellProps) -> GridEditCellProps>;

/// A filter operator exposed by a column.
#[derive(Clone)]
pub struct GridFilterOperator {
    /// Operator identifier stored in [`GridFilterItem::operator_value`].
    pub value: String,
    /// Predicate factory.
    pub get_apply_filter_fn: GetApplyFilterFn,
    /// Whether the operator needs a value (`isEmpty` does not).
    pub requires_filter_value: bool,
}

impl GridFilterOperator {
    /// Create an operator that requires a filter value.
    pub fn new(
        value: &str,
        get_apply_filter_fn: impl Fn(&GridFilterItem, &GridStateColDef) -> Option<GridFilterPredicate>
            + 'static,
    ) -> Self {
        Self {
            value: value.to_string(),
            get_apply_filter_fn: Rc::new(get_apply_filter_fn),
            requires_filter_value: true,
        }
    }

    /// Mark the operator as not needing a value.
    pub fn without_value(mut self) -> Self {
        self.requires_filter_value = false;
        self
    }
}

impl fmt::Debug for GridFilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridFilterOperator")
            .field("value", &self.value)
            .field("requires_filter_value", &self.requires_filter_value)
            .finish()
    }
}

/// Built-in column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridColType {
    /// Free text.
    #[default]
    String,
    /// Numbers.
    Number,
    /// Dates without time.
    Date,
    /// Dates with time.
    DateTime,
    /// Booleans.
    Boolean,
    /// One value out of `value_options`.
    SingleSelect,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Caller-owned column descriptor.
#[derive(Clone)]
pub struct GridColDef {
    /// Field read from each row.
    pub field: String,
    /// Header label.
    pub header_name: Option<String>,
    /// Column type. Drives the default operators, comparator and parser.
    pub col_type: GridColType,
    /// Width in pixels. Defaults to 100.
    pub width: Option<f64>,
    /// Minimum width. Defaults to 50.
    pub min_width: Option<f64>,
    /// Maximum width. Unbounded by default.
    pub max_width: Option<f64>,
    /// Flex factor sharing the remaining viewport width.
    pub flex: Option<f64>,
    /// Legacy visibility flag. Only seeds the visibility model when none was provided.
    pub hide: Option<bool>,
    /// Whether the column can be sorted.
    pub sortable: bool,
    /// Whether the column can be filtered.
    pub filterable: bool,
    /// Whether the column can be pinned.
    pub pinnable: bool,
    /// Whether the column can be hidden from the column menu.
    pub hideable: bool,
    /// Whether the column cannot be reordered.
    pub disable_reorder: bool,
    /// Whether the column menu is disabled for this column.
    pub disable_column_menu: bool,
    /// Whether the column is editable in row edit mode.
    pub editable: bool,
    /// Keep filter values untrimmed.
    pub disable_trim: bool,
    /// Options of a single-select column.
    pub value_options: Vec<CellValue>,
    /// Custom filter operators.
    pub filter_operators: Option<Vec<GridFilterOperator>>,
    /// Custom comparator.
    pub sort_comparator: Option<GridComparatorFn>,
    /// Custom sort cycle for this column.
    pub sorting_order: Option<Vec<Option<GridSortDirection>>>,
    /// Custom value getter.
    pub value_getter: Option<GridValueGetter>,
    /// Custom value parser.
    pub value_parser: Option<GridValueParser>,
    /// Custom quick filter factory.
    pub get_apply_quick_filter_fn: Option<GetApplyQuickFilterFn>,
    /// Edit validation hook.
    pub pre_process_edit_cell_props: Option<GridPreProcessEditCellProps>,
}

impl GridColDef {
    /// Create a string column for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header_name: None,
            col_type: GridColType::String,
            width: None,
            min_width: None,
            max_width: None,
            flex: None,
            hide: None,
            sortable: true,
            filterable: true,
            pinnable: true,
            hideable: true,
            disable_reorder: false,
            disable_column_menu: false,
            editable: false,
            disable_trim: false,
            value_options: Vec::new(),
            filter_operators: None,
            sort_comparator: None,
            sorting_order: None,
            value_getter: None,
            value_parser: None,
            get_apply_quick_filter_fn: None,
            pre_process_edit_cell_props: None,
        }
    }

    /// Set the column type.
    pub fn with_type(mut self, col_type: GridColType) -> Self {
        self.col_type = col_type;
        self
    }

    /// Set the width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the flex factor.
    pub fn with_flex(mut self, flex: f64) -> Self {
        self.flex = Some(flex);
        self
    }

    /// Mark the column editable.
    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }
}

impl fmt::Debug for GridColDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridColDef")
            .field("field", &self.field)
            .field("col_type", &self.col_type)
            .field("width", &self.width)
            .field("flex", &self.flex)
            .field("hide", &self.hide)
            .finish_non_exhaustive()
    }
}

/// A column as stored in the grid state.
#[derive(Clone)]
pub struct GridStateColDef {
    def: GridColDef,
    /// Resolved filter operators.
    pub filter_operators: Rc<Vec<GridFilterOperator>>,
    /// Resolved comparator.
    pub sort_comparator: GridComparatorFn,
    /// Resolved value parser.
    pub value_parser: Option<GridValueParser>,
    /// Resolved quick filter factory.
    pub quick_filter_fn: Option<GetApplyQuickFilterFn>,
    /// Width after dimension hydration.
    pub computed_width: f64,
    /// Whether the width was set by the user (resize or restored dimensions).
    pub has_been_resized: bool,
}

impl GridStateColDef {
    /// Resolve a definition against its type defaults.
    pub fn resolve(def: GridColDef) -> Self {
        let filter_operators = Rc::new(
            def.filter_operators
                .clone()
                .unwrap_or_else(|| default_filter_operators(def.col_type)),
        );
        let sort_comparator = def
            .sort_comparator
            .clone()
            .unwrap_or_else(|| default_comparator(def.col_type));
        let value_parser = def
            .value_parser
            .clone()
            .or_else(|| default_value_parser(def.col_type));
        let quick_filter_fn = def
            .get_apply_quick_filter_fn
            .clone()
            .or_else(|| default_quick_filter_fn(def.col_type));
        let computed_width = def.width.unwrap_or(DEFAULT_COLUMN_WIDTH);
        Self {
            def,
            filter_operators,
            sort_comparator,
            value_parser,
            quick_filter_fn,
            computed_width,
            has_been_resized: false,
        }
    }

    /// Re-resolve with a new definition, keeping user dimensions when the column was resized.
    pub fn upsert(&self, def: GridColDef) -> Self {
        let mut next = Self::resolve(def);
        if self.has_been_resized {
            next.def.width = self.def.width;
            next.def.flex = self.def.flex;
            next.computed_width = self.computed_width;
            next.has_been_resized = true;
        }
        next
    }

    /// The caller's definition.
    pub fn def(&self) -> &GridColDef {
        &self.def
    }

    /// Mutable access used by width updates and restored dimensions.
    pub(crate) fn def_mut(&mut self) -> &mut GridColDef {
        &mut self.def
    }

    /// Effective minimum width.
    pub fn min_width(&self) -> f64 {
        self.def.min_width.unwrap_or(DEFAULT_COLUMN_MIN_WIDTH)
    }

    /// Effective maximum width.
    pub fn max_width(&self) -> f64 {
        self.def.max_width.unwrap_or(f64::INFINITY)
    }

    /// Effective width before flex distribution.
    pub fn width(&self) -> f64 {
        self.def.width.unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    /// Cell value of this column for a row.
    pub fn cell_value(&self, id: &GridRowId, row: &GridRowModel) -> CellValue {
        match &self.def.value_getter {
            Some(getter) => getter(id, row),
            None => row.get(&self.def.field).cloned().unwrap_or_default(),
        }
    }

    /// Parse a raw value through the column parser. Lists are parsed item by item.
    pub fn parse_value(&self, value: &CellValue) -> CellValue {
        match (&self.value_parser, value) {
            (Some(parser), CellValue::List(items)) => {
                CellValue::List(items.iter().map(|item| parser(item)).collect())
            }
            (Some(parser), value) => parser(value),
            (None, value) => value.clone(),
        }
    }

    /// Look up a filter operator by value.
    pub fn filter_operator(&self, operator_value: &str) -> Option<&GridFilterOperator> {
        self.filter_operators
            .iter()
            .find(|operator| operator.value == operator_value)
    }
}

impl Deref for GridStateColDef {
    type Target = GridColDef;

    fn deref(&self) -> &GridColDef {
        &self.def
    }
}

impl fmt::Debug for GridStateColDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridStateColDef")
            .field("def", &self.def)
            .field("computed_width", &self.computed_width)
            .field("has_been_resized", &self.has_been_resized)
            .finish_non_exhaustive()
    }
}

fn default_filter_operators(col_type: GridColType) -> Vec<GridFilterOperator> {
    match col_type {
        GridColType::String => grid_string_operators(),
        GridColType::Number => grid_numeric_operators(),
        GridColType::Date => grid_date_operators(false),
        GridColType::DateTime => grid_date_operators(true),
        GridColType::Boolean => grid_boolean_operators(),
        GridColType::SingleSelect => grid_single_select_operators(),
    }
}

fn default_comparator(col_type: GridColType) -> GridComparatorFn {
    match col_type {
        GridColType::String | GridColType::SingleSelect => {
            Rc::new(grid_string_or_number_comparator)
        }
        GridColType::Number => Rc::new(grid_number_comparator),
        GridColType::Date | GridColType::DateTime => Rc::new(grid_date_comparator),
        GridColType::Boolean => Rc::new(grid_boolean_comparator),
    }
}

fn default_value_parser(col_type: GridColType) -> Option<GridValueParser> {
    match col_type {
        GridColType::Number => Some(Rc::new(|value: &CellValue| match value {
            CellValue::Text(text) if text.trim().is_empty() => CellValue::Null,
            CellValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or(CellValue::Number(f64::NAN)),
            other => other.clone(),
        })),
        _ => None,
    }
}

fn default_quick_filter_fn(col_type: GridColType) -> Option<GetApplyQuickFilterFn> {
    match col_type {
        GridColType::String => Some(Rc::new(get_grid_string_quick_filter_fn)),
        GridColType::Number => Some(Rc::new(get_grid_numeric_quick_filter_fn)),
        GridColType::SingleSelect => Some(Rc::new(get_grid_single_select_quick_filter_fn)),
        GridColType::Date | GridColType::DateTime | GridColType::Boolean => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fills_type_defaults() {
        let col = GridStateColDef::resolve(GridColDef::new("age").with_type(GridColType::Number));
        assert_eq!(col.computed_width, DEFAULT_COLUMN_WIDTH);
        assert!(col.filter_operator(">=").is_some());
        assert!(col.filter_operator("contains").is_none());
        assert_eq!(
            col.parse_value(&CellValue::from("42")),
            CellValue::Number(42.0)
        );
        assert!(col.quick_filter_fn.is_some());
    }

    #[test]
    fn test_value_getter_overrides_field_lookup() {
        let mut def = GridColDef::new("full_name");
        def.value_getter = Some(Rc::new(|_: &GridRowId, row: &GridRowModel| {
            CellValue::Text(format!(
                "{} {}",
                row.get("first").cloned().unwrap_or_default(),
                row.get("last").cloned().unwrap_or_default()
            ))
        }));
        let col = GridStateColDef::resolve(def);
        let row = GridRowModel::new().with("first", "Ada").with("last", "Lovelace");
        assert_eq!(
            col.cell_value(&GridRowId::Number(1), &row),
            CellValue::from("Ada Lovelace")
        );
    }
}
