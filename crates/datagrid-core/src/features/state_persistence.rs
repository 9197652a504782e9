//! Export and restoration of the persistable state.
//!
//! Every feature contributes its slice to the `exportState` pipe (omitting values equal to its
//! defaults) and reads its slice back in the `restoreState` pipe. Restoration commits all slice
//! updates in a single state update, then re-runs the derived computations (column hydration,
//! filtering, sorting) before returning.

use crate::api::GridApi;
use crate::error::GridError;
use crate::pipe_processing::{ExportState, GridRestoreStateValue, RestoreState};
use crate::props::{GridChangeReason, GridInitialState};

impl GridApi {
    /// Snapshot of the persistable state. Slices at their default value are left out.
    pub fn export_state(&self) -> GridInitialState {
        self.apply_pipe_processors::<ExportState>(GridInitialState::default(), &())
    }

    /// Apply a previously exported state. Only the slices present in `state` change.
    pub fn restore_state(&mut self, state: GridInitialState) -> Result<(), GridError> {
        let GridRestoreStateValue {
            state_updates,
            callbacks,
        } = self.apply_pipe_processors::<RestoreState>(GridRestoreStateValue::default(), &state);
        tracing::debug!(
            "restoring state with {} update(s) and {} callback(s)",
            state_updates.len(),
            callbacks.len()
        );
        self.set_state_with_reason(
            move |current| {
                let mut next = current.clone();
                for update in state_updates {
                    update(&mut next);
                }
                next
            },
            Some(GridChangeReason::RestoreState),
        );
        for callback in callbacks {
            callback(self)?;
        }
        self.force_update();
        Ok(())
    }

    /// [`export_state`](Self::export_state) serialized to JSON.
    pub fn export_state_json(&self) -> Result<String, GridError> {
        Ok(serde_json::to_string(&self.export_state())?)
    }

    /// Parse and [`restore_state`](Self::restore_state) a JSON blob.
    pub fn restore_state_json(&mut self, json: &str) -> Result<(), GridError> {
        let state: GridInitialState = serde_json::from_str(json)?;
        self.restore_state(state)
    }
}
