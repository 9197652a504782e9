//! Row editing.
//!
//! A row enters edit mode with [`GridApi::start_row_edit_mode`]: every editable column gets an
//! edit cell seeded with the current cell value. [`GridApi::set_edit_cell_value`] updates an edit
//! cell, optionally debounced; each new call for the same cell restarts the delay so only the
//! latest value is applied. Leaving edit mode commits the edited row through
//! `process_row_update` (when provided) or discards the modifications.
//!
//! A debounced value only lands if its cell is still being edited when the timer fires.

use crate::api::GridApi;
use crate::col_def::GridEditCellProps;
use crate::error::GridError;
use crate::events::GridEvent;
use crate::state::GridState;
use crate::timers::GridTimerKey;
use crate::value::{CellValue, GridRowId, GridRowModel};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

/// Value of one cell being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct GridEditCellState {
    /// Edited value.
    pub value: CellValue,
    /// Whether the value was rejected by `pre_process_edit_cell_props`.
    pub error: bool,
}

/// Edit cells of a row, by field.
pub type GridEditRow = BTreeMap<String, GridEditCellState>;

/// Editing slice: the rows in edit mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridEditingState {
    /// Edit cells by row id.
    pub rows: HashMap<GridRowId, GridEditRow>,
}

/// Whether a row is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridRowMode {
    /// Read only.
    View,
    /// In edit mode.
    Edit,
}

/// Parameters of [`GridApi::set_edit_cell_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridEditCellValueParams {
    /// Row id.
    pub id: GridRowId,
    /// Column field.
    pub field: String,
    /// New raw value.
    pub value: CellValue,
    /// Delay before the value is applied. `None` applies it right away.
    pub debounce_ms: Option<u64>,
}

fn with_editing(state: &GridState, editing: GridEditingState) -> GridState {
    GridState {
        editing: Rc::new(editing),
        ..state.clone()
    }
}

fn with_edit_row(state: &GridState, id: &GridRowId, row: Option<GridEditRow>) -> GridState {
    let mut editing = (*state.editing).clone();
    match row {
        Some(row) => editing.rows.insert(id.clone(), row),
        None => editing.rows.remove(id),
    };
    with_editing(state, editing)
}

impl GridApi {
    /// Whether `id` is in edit mode.
    pub fn get_row_mode(&self, id: &GridRowId) -> GridRowMode {
        if self.state_ref().editing.rows.contains_key(id) {
            GridRowMode::Edit
        } else {
            GridRowMode::View
        }
    }

    fn is_cell_in_edit_mode(&self, id: &GridRowId, field: &str) -> bool {
        self.state_ref()
            .editing
            .rows
            .get(id)
            .is_some_and(|row| row.contains_key(field))
    }

    /// The row being edited with its edited values applied, or `None` when the row is not in
    /// edit mode.
    pub fn get_edit_row(&self, id: &GridRowId) -> Option<GridRowModel> {
        let edit_row = self.state_ref().editing.rows.get(id)?;
        let mut row = self.get_row(id)?.clone();
        for (field, cell) in edit_row {
            row.set(field.clone(), cell.value.clone());
        }
        Some(row)
    }

    /// Put a row in edit mode and publish `rowEditStart`.
    pub fn start_row_edit_mode(&mut self, id: &GridRowId) -> Result<(), GridError> {
        if self.get_row_mode(id) == GridRowMode::Edit {
            return Err(GridError::RowAlreadyInEditMode(id.clone()));
        }
        let row = self
            .get_row(id)
            .ok_or_else(|| GridError::RowNotFound(id.clone()))?
            .clone();
        let state = self.state();
        let edit_row: GridEditRow = state
            .columns
            .all
            .iter()
            .filter_map(|field| state.columns.column(field))
            .filter(|column| column.editable)
            .map(|column| {
                let cell = GridEditCellState {
                    value: column.cell_value(id, &row),
                    error: false,
                };
                (column.field.clone(), cell)
            })
            .collect();
        tracing::debug!("row {} enters edit mode with {} cell(s)", id, edit_row.len());
        self.set_state(|state| with_edit_row(state, id, Some(edit_row)));
        self.publish_event(GridEvent::RowEditStart { id: id.clone() });
        Ok(())
    }

    /// Update the value of an edit cell.
    ///
    /// With `debounce_ms`, the value is applied once the delay elapses without a newer call for
    /// the same cell.
    pub fn set_edit_cell_value(
        &mut self,
        params: GridEditCellValueParams,
    ) -> Result<(), GridError> {
        let GridEditCellValueParams {
            id,
            field,
            value,
            debounce_ms,
        } = params;
        if self.get_row_mode(&id) != GridRowMode::Edit {
            return Err(GridError::RowNotInEditMode(id));
        }
        if !self.is_cell_in_edit_mode(&id, &field) {
            return Err(GridError::CellNotInEditMode { id, field });
        }
        let Some(delay) = debounce_ms.filter(|ms| *ms > 0) else {
            return self.apply_edit_cell_value(&id, &field, value);
        };
        let key = GridTimerKey::EditCellValue {
            id: id.clone(),
            field: field.clone(),
        };
        self.timers.schedule(
            key,
            Duration::from_millis(delay),
            Box::new(move |api: &mut GridApi| {
                if !api.is_cell_in_edit_mode(&id, &field) {
                    tracing::debug!("dropping stale value of cell {} / {}", id, field);
                    return Ok(());
                }
                api.apply_edit_cell_value(&id, &field, value)
            }),
        );
        Ok(())
    }

    fn apply_edit_cell_value(
        &mut self,
        id: &GridRowId,
        field: &str,
        value: CellValue,
    ) -> Result<(), GridError> {
        let column = self
            .get_column(field)
            .cloned()
            .ok_or_else(|| GridError::ColumnNotFound(field.to_string()))?;
        let mut props = GridEditCellProps {
            value: column.parse_value(&value),
            error: false,
        };
        if let Some(pre_process) = column.pre_process_edit_cell_props.clone() {
            let mut row = self
                .get_edit_row(id)
                .ok_or_else(|| GridError::RowNotInEditMode(id.clone()))?;
            row.set(field, props.value.clone());
            props = pre_process(id, &row, props);
        }
        let Some(mut edit_row) = self.state_ref().editing.rows.get(id).cloned() else {
            return Err(GridError::RowNotInEditMode(id.clone()));
        };
        let applied = props.value.clone();
        edit_row.insert(
            field.to_string(),
            GridEditCellState {
                value: props.value,
                error: props.error,
            },
        );
        self.set_state(|state| with_edit_row(state, id, Some(edit_row)));
        self.publish_event(GridEvent::EditCellValueChange {
            id: id.clone(),
            field: field.to_string(),
            value: applied,
        });
        Ok(())
    }

    /// Leave edit mode and publish `rowEditStop`.
    ///
    /// Pending debounced values are applied first, or dropped with `ignore_modifications`. The
    /// edited row goes through `process_row_update`; a rejected update is routed to
    /// `on_process_row_update_error` and the row stays in edit mode. A row holding a rejected
    /// cell value also stays in edit mode.
    pub fn stop_row_edit_mode(
        &mut self,
        id: &GridRowId,
        ignore_modifications: bool,
    ) -> Result<(), GridError> {
        if self.get_row_mode(id) != GridRowMode::Edit {
            return Err(GridError::RowNotInEditMode(id.clone()));
        }
        let is_row_timer = |key: &GridTimerKey| {
            matches!(key, GridTimerKey::EditCellValue { id: row, .. } if row == id)
        };

        if ignore_modifications {
            let dropped = self.timers.cancel_where(is_row_timer);
            tracing::debug!("row {} leaves edit mode, {} pending value(s) dropped", id, dropped);
            self.leave_edit_mode(id, true);
            return Ok(());
        }

        for task in self.timers.take_where(is_row_timer) {
            task(self)?;
        }
        let has_error = self
            .state_ref()
            .editing
            .rows
            .get(id)
            .is_some_and(|row| row.values().any(|cell| cell.error));
        if has_error {
            tracing::debug!("row {} holds invalid values, staying in edit mode", id);
            return Ok(());
        }

        let old_row = self
            .get_row(id)
            .ok_or_else(|| GridError::RowNotFound(id.clone()))?
            .clone();
        let new_row = self
            .get_edit_row(id)
            .ok_or_else(|| GridError::RowNotInEditMode(id.clone()))?;
        let committed = match self.props().process_row_update.clone() {
            Some(process_row_update) => match process_row_update(&new_row, &old_row) {
                Ok(row) => row,
                Err(err) => {
                    match self.props().on_process_row_update_error.clone() {
                        Some(on_error) => on_error(&err),
                        None => tracing::error!(
                            "{}; provide `on_process_row_update_error` to handle it",
                            err
                        ),
                    }
                    return Ok(());
                }
            },
            None => new_row,
        };
        self.update_rows(vec![committed])?;
        self.leave_edit_mode(id, false);
        Ok(())
    }

    fn leave_edit_mode(&mut self, id: &GridRowId, ignore_modifications: bool) {
        self.set_state(|state| with_edit_row(state, id, None));
        self.publish_event(GridEvent::RowEditStop {
            id: id.clone(),
            ignore_modifications,
        });
    }
}
