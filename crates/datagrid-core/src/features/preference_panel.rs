//! Preference panel (filter panel and column management panel).

use crate::api::GridApi;
use crate::error::GridError;
use crate::events::GridEvent;
use crate::pipe_processing::{ExportState, RestoreState};
use crate::props::GridInitialState;
use crate::state::GridState;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

const GROUP: &str = "preferencePanel";

/// Panels that can be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridPreferencePanelsValue {
    /// Filter panel.
    Filters,
    /// Column management panel.
    Columns,
}

/// Preference panel slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPreferencePanelState {
    /// Whether a panel is open.
    #[serde(default)]
    pub open: bool,
    /// Panel opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_panel_value: Option<GridPreferencePanelsValue>,
}

fn with_panel(state: &GridState, panel: GridPreferencePanelState) -> GridState {
    GridState {
        preference_panel: Rc::new(panel),
        ..state.clone()
    }
}

impl GridApi {
    /// Open a preference panel.
    pub fn show_preferences(&mut self, panel: GridPreferencePanelsValue) {
        tracing::debug!("opening preferences panel {:?}", panel);
        self.set_state(|state| {
            with_panel(
                state,
                GridPreferencePanelState {
                    open: true,
                    opened_panel_value: Some(panel),
                },
            )
        });
        self.publish_event(GridEvent::PreferencePanelOpen { panel });
    }

    /// Close the preference panel.
    pub fn hide_preferences(&mut self) {
        let panel = self.state_ref().preference_panel.opened_panel_value;
        tracing::debug!("hiding preferences panel");
        self.set_state(|state| {
            with_panel(
                state,
                GridPreferencePanelState {
                    open: false,
                    opened_panel_value: None,
                },
            )
        });
        self.publish_event(GridEvent::PreferencePanelClose { panel });
    }
}

/// Initialize the preference panel slice and register its export and restore processors.
pub fn register_preference_panel(api: &mut GridApi) -> Result<(), GridError> {
    let initial = api
        .props()
        .initial_state
        .as_ref()
        .and_then(|state| state.preference_panel.clone())
        .unwrap_or_default();
    api.initialize_state(|state| with_panel(state, initial));

    api.register_pipe_processor::<ExportState>(GROUP, |api, state: GridInitialState, _| {
        let panel = api.state_ref().preference_panel.clone();
        if !panel.open {
            return state;
        }
        GridInitialState {
            preference_panel: Some((*panel).clone()),
            ..state
        }
    });

    api.register_pipe_processor::<RestoreState>(GROUP, |_, mut value, context| {
        if let Some(panel) = context.preference_panel.clone() {
            value
                .state_updates
                .push(Box::new(move |state: &mut GridState| {
                    state.preference_panel = Rc::new(panel);
                }));
        }
        value
    });
    Ok(())
}
