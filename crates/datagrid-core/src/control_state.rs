//! Controlled-state registration.
//!
//! Some state slices can be driven by the caller through a prop (`filter_model`, `sort_model`,
//! `pinned_columns`, ...). Each of them is declared once with a [`GridControlStateItem`]. On every
//! state update, the grid reconciles each declared item whose value changed:
//!
//! * when the prop is set and the requested value differs from it, the slice keeps its previous
//!   value and the `on_*_change` callback receives the requested value: the caller decides
//!   whether to feed it back through the prop;
//! * otherwise the value is committed, the callback is called (when present) and the change
//!   event is published.
//!
//! Reconciliation happens inside [`GridApi::set_state_with_reason`], before the new snapshot is
//! committed, so a controlled slice never diverges from its prop.

use crate::api::GridApi;
use crate::events::GridEvent;
use crate::props::{GridCallback, GridCallbackDetails, GridChangeReason, GridProps};
use crate::state::GridState;
use std::fmt;

/// Value of a controllable slice, tagged by who owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum GridStateMode<T> {
    /// The caller owns the value through a prop.
    Controlled(T),
    /// The grid owns the value.
    Uncontrolled(T),
}

impl<T> GridStateMode<T> {
    /// Resolve the mode from the prop and the stored value.
    pub fn resolve(prop: Option<T>, stored: T) -> Self {
        match prop {
            Some(value) => GridStateMode::Controlled(value),
            None => GridStateMode::Uncontrolled(stored),
        }
    }

    /// The authoritative value.
    pub fn value(&self) -> &T {
        match self {
            GridStateMode::Controlled(value) | GridStateMode::Uncontrolled(value) => value,
        }
    }

    /// Whether the caller owns the value.
    pub fn is_controlled(&self) -> bool {
        matches!(self, GridStateMode::Controlled(_))
    }
}

/// Declaration of a controllable slice.
pub struct GridControlStateItem<T: 'static> {
    /// Public identifier (`filter`, `sorting`, `pinnedColumns`, ...).
    pub state_id: &'static str,
    /// Reads the value from a snapshot.
    pub state_selector: fn(&GridState) -> &T,
    /// Builds `next` with this item's value taken from `previous`.
    pub restore_previous: fn(&GridState, &GridState) -> GridState,
    /// Reads the controlling prop.
    pub prop_model: fn(&GridProps) -> Option<&T>,
    /// Reads the change callback.
    pub prop_on_change: fn(&GridProps) -> Option<&GridCallback<T>>,
    /// Builds the change event.
    pub change_event: fn(&T, Option<GridChangeReason>) -> GridEvent,
}

impl<T> fmt::Debug for GridControlStateItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridControlStateItem")
            .field("state_id", &self.state_id)
            .finish_non_exhaustive()
    }
}

/// Deferred notification produced by a reconciliation.
pub(crate) type GridControlNotification = Box<dyn FnOnce()>;

/// Outcome of reconciling one item.
#[derive(Default)]
pub(crate) struct GridReconciliation {
    pub callback: Option<GridControlNotification>,
    pub event: Option<GridEvent>,
}

/// Type-erased control state item.
pub(crate) trait ControlStateEntry {
    fn state_id(&self) -> &'static str;

    /// Reconcile `next` against `previous`. Returns `None` when the item did not change.
    fn reconcile(
        &self,
        props: &GridProps,
        previous: &GridState,
        next: &mut GridState,
        reason: Option<GridChangeReason>,
    ) -> Option<GridReconciliation>;
}

impl<T: Clone + PartialEq + 'static> ControlStateEntry for GridControlStateItem<T> {
    fn state_id(&self) -> &'static str {
        self.state_id
    }

    fn reconcile(
        &self,
        props: &GridProps,
        previous: &GridState,
        next: &mut GridState,
        reason: Option<GridChangeReason>,
    ) -> Option<GridReconciliation> {
        let requested = (self.state_selector)(next);
        if (self.state_selector)(previous) == requested {
            return None;
        }
        let requested = requested.clone();
        let mode = GridStateMode::resolve((self.prop_model)(props), &requested);
        let details = GridCallbackDetails { reason };
        let callback = (self.prop_on_change)(props)
            .filter(|_| mode.value() != &&requested || !mode.is_controlled())
            .cloned()
            .map(|callback| {
                let value = requested.clone();
                let notification: GridControlNotification =
                    Box::new(move || callback(&value, &details));
                notification
            });

        if mode.is_controlled() && mode.value() != &&requested {
            tracing::debug!(
                "{} is controlled, keeping the prop value until it is fed back",
                self.state_id
            );
            *next = (self.restore_previous)(previous, next);
            return Some(GridReconciliation {
                callback,
                event: None,
            });
        }

        Some(GridReconciliation {
            callback,
            event: Some((self.change_event)(&requested, reason)),
        })
    }
}

impl GridApi {
    /// Declare a controllable slice. Declaring the same `state_id` again replaces the previous
    /// declaration.
    pub fn register_control_state<T: Clone + PartialEq + 'static>(
        &mut self,
        item: GridControlStateItem<T>,
    ) {
        tracing::trace!("registering control state {}", item.state_id);
        self.register_control_state_entry(std::rc::Rc::new(item));
    }
}
