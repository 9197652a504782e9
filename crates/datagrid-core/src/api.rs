//! The grid instance.
//!
//! [`GridApi`] owns everything attached to one grid: the versioned state store, the current
//! props, the event bus, the pipe and strategy registries, the controlled-state declarations,
//! the props effects, the timer queue and the memoized selectors. Features extend it with
//! `impl GridApi` blocks (core) or extension traits (pro).
//!
//! # Update cycle
//!
//! 1. An API method computes the next snapshot and calls [`GridApi::set_state_with_reason`].
//! 2. Controlled items are reconciled against their props.
//! 3. If anything changed, the snapshot is committed and `stateChange` is published.
//! 4. Change callbacks run, then the change events of the committed items are published.
//!
//! # Example
//!
//! ```rust
//! use datagrid_core::{GridApi, GridEventName, GridProps};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut api = GridApi::new(GridProps::default());
//! let commits = Rc::new(Cell::new(0));
//! let seen = commits.clone();
//! api.subscribe_event(GridEventName::StateChange, move |_, _, _| {
//!     seen.set(seen.get() + 1);
//!     Ok(())
//! });
//!
//! let version = api.version();
//! api.set_state(|state| state.clone());
//! assert!(!api.has_changed_since(version));
//!
//! api.set_state(|state| {
//!     let mut next = state.clone();
//!     next.pagination = Rc::new(datagrid_core::GridPaginationState { page: 1, page_size: 100 });
//!     next
//! });
//! assert!(api.has_changed_since(version));
//! assert_eq!(commits.get(), 1);
//! ```

use crate::control_state::ControlStateEntry;
use crate::error::GridError;
use crate::events::{
    GridEvent, GridEventBus, GridEventMeta, GridEventName, GridListenerId, GridSubscribeOptions,
};
use crate::pipe_processing::GridPipeRegistry;
use crate::props::{GridChangeReason, GridProps};
use crate::selectors::GridSelectors;
use crate::state::{GridState, GridStore};
use crate::strategy_processing::GridStrategyRegistry;
use crate::timers::GridTimers;
use std::fmt;
use std::rc::Rc;

/// Reaction of a feature to a props update. Receives the previous props.
pub type GridPropsEffect = Rc<dyn Fn(&mut GridApi, &GridProps) -> Result<(), GridError>>;

/// Normalizes props before they are stored (tier defaults, forced flags).
pub type GridPropsNormalizer = fn(GridProps) -> GridProps;

/// One grid instance.
pub struct GridApi {
    store: GridStore,
    props: GridProps,
    normalize_props: GridPropsNormalizer,
    events: GridEventBus,
    pub(crate) pipes: GridPipeRegistry,
    pub(crate) strategies: GridStrategyRegistry,
    pub(crate) timers: GridTimers,
    control_state: Vec<Rc<dyn ControlStateEntry>>,
    props_effects: Vec<(&'static str, GridPropsEffect)>,
    selectors: Rc<GridSelectors>,
    mounted: bool,
}

impl GridApi {
    /// Create an instance with the given props and an empty state.
    ///
    /// No feature is registered: see [`DataGrid`](crate::DataGrid) for the assembled grid.
    pub fn new(props: GridProps) -> Self {
        Self::with_props_normalizer(props, |props| props)
    }

    /// Create an instance whose props always go through `normalize_props`.
    pub fn with_props_normalizer(props: GridProps, normalize_props: GridPropsNormalizer) -> Self {
        Self {
            store: GridStore::new(GridState::default()),
            props: normalize_props(props),
            normalize_props,
            events: GridEventBus::new(),
            pipes: GridPipeRegistry::new(),
            strategies: GridStrategyRegistry::new(),
            timers: GridTimers::new(),
            control_state: Vec::new(),
            props_effects: Vec::new(),
            selectors: Rc::new(GridSelectors::new()),
            mounted: false,
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> Rc<GridState> {
        self.store.state()
    }

    /// Borrow the current snapshot.
    pub fn state_ref(&self) -> &GridState {
        self.store.state_ref()
    }

    /// Number of commits so far.
    pub fn version(&self) -> u64 {
        self.store.version()
    }

    /// Whether a commit happened after `version`.
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.store.has_changed_since(version)
    }

    /// Current props.
    pub fn props(&self) -> &GridProps {
        &self.props
    }

    /// Memoized selectors of this instance.
    pub fn selectors(&self) -> Rc<GridSelectors> {
        self.selectors.clone()
    }

    /// Apply an update without a change reason. Returns whether a new snapshot was committed.
    pub fn set_state(&mut self, updater: impl FnOnce(&GridState) -> GridState) -> bool {
        self.set_state_with_reason(updater, None)
    }

    /// Apply an update, reconcile controlled items and notify.
    ///
    /// The updater runs to completion before anything is published. Controlled items whose
    /// requested value differs from their prop keep their previous value; their change callback
    /// still receives the requested value.
    pub fn set_state_with_reason(
        &mut self,
        updater: impl FnOnce(&GridState) -> GridState,
        reason: Option<GridChangeReason>,
    ) -> bool {
        let previous = self.store.state();
        let mut next = updater(&previous);

        let mut callbacks = Vec::new();
        let mut events = Vec::new();
        for entry in self.control_state.clone() {
            if let Some(outcome) = entry.reconcile(&self.props, &previous, &mut next, reason) {
                callbacks.extend(outcome.callback);
                events.extend(outcome.event);
            }
        }

        let changed = !next.changed_slices(&previous).is_empty();
        if changed {
            self.store.replace(next);
            let version = self.store.version();
            self.publish_event(GridEvent::StateChange { version });
        }
        for callback in callbacks {
            callback();
        }
        for event in events {
            self.publish_event(event);
        }
        changed
    }

    /// Replace the state without reconciliation or notification. Used while features
    /// initialize their slices.
    pub fn initialize_state(&mut self, updater: impl FnOnce(&GridState) -> GridState) {
        let next = updater(self.store.state_ref());
        self.store.replace(next);
    }

    /// Recompute every memoized selector against the current snapshot.
    pub fn force_update(&self) {
        let state = self.store.state();
        self.selectors.visible_columns.select(&state);
        self.selectors.visible_pinned_columns.select(&state);
        self.selectors.column_positions.select(&state);
        self.selectors.columns_total_width.select(&state);
        self.selectors.paginated_row_ids.select(&state);
        self.selectors.visible_top_level_row_count.select(&state);
        self.selectors.filtered_top_level_row_count.select(&state);
    }

    /// Publish an event to its subscribers, in dispatch order.
    ///
    /// Handler errors are reported and do not stop the remaining handlers.
    pub fn publish_event(&mut self, event: GridEvent) -> GridEventMeta {
        let mut meta = GridEventMeta::default();
        let handlers = self.events.handlers(event.name());
        tracing::trace!(
            "publishing {} to {} handler(s)",
            event.name(),
            handlers.len()
        );
        for (id, handler) in handlers {
            if meta.is_propagation_stopped() {
                break;
            }
            if !self.events.is_subscribed(id) {
                continue;
            }
            if let Err(err) = handler(self, &event, &mut meta) {
                self.report_error(&err);
            }
        }
        meta
    }

    /// Subscribe to an event.
    pub fn subscribe_event(
        &mut self,
        name: GridEventName,
        handler: impl Fn(&mut GridApi, &GridEvent, &mut GridEventMeta) -> Result<(), GridError>
        + 'static,
    ) -> GridListenerId {
        self.subscribe_event_with(name, GridSubscribeOptions::default(), handler)
    }

    /// Subscribe to an event with options.
    pub fn subscribe_event_with(
        &mut self,
        name: GridEventName,
        options: GridSubscribeOptions,
        handler: impl Fn(&mut GridApi, &GridEvent, &mut GridEventMeta) -> Result<(), GridError>
        + 'static,
    ) -> GridListenerId {
        self.events.subscribe(name, options, Rc::new(handler))
    }

    /// Remove a subscription. Returns false if it was already removed.
    pub fn unsubscribe_event(&mut self, id: GridListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Number of subscribers of an event.
    pub fn listener_count(&self, name: GridEventName) -> usize {
        self.events.listener_count(name)
    }

    pub(crate) fn register_control_state_entry(&mut self, entry: Rc<dyn ControlStateEntry>) {
        let state_id = entry.state_id();
        match self
            .control_state
            .iter_mut()
            .find(|existing| existing.state_id() == state_id)
        {
            Some(existing) => *existing = entry,
            None => self.control_state.push(entry),
        }
    }

    /// Register the reaction of `group` to props updates.
    pub fn register_props_effect(
        &mut self,
        group: &'static str,
        effect: impl Fn(&mut GridApi, &GridProps) -> Result<(), GridError> + 'static,
    ) {
        self.props_effects.push((group, Rc::new(effect)));
    }

    /// Replace the props and run every props effect.
    pub fn set_props(&mut self, props: GridProps) {
        let previous = std::mem::replace(&mut self.props, (self.normalize_props)(props));
        let effects: Vec<_> = self
            .props_effects
            .iter()
            .map(|(_, effect)| effect.clone())
            .collect();
        for effect in effects {
            if let Err(err) = effect(self, &previous) {
                self.report_error(&err);
            }
        }
        self.refresh_active_strategies();
    }

    /// Update the props in place and run every props effect.
    pub fn update_props(&mut self, update: impl FnOnce(&mut GridProps)) {
        let mut props = self.props.clone();
        update(&mut props);
        self.set_props(props);
    }

    /// Route an error to `on_error`, or log it.
    pub fn report_error(&self, err: &GridError) {
        match &self.props.on_error {
            Some(on_error) => on_error(err),
            None => tracing::error!("{}", err),
        }
    }

    /// Compute every derived slice once all features are registered.
    ///
    /// Builds the row tree, runs the pipe appliers, then applies filtering and sorting. After
    /// mounting, registering a pipe processor re-runs the appliers of its pipe.
    pub fn mount(&mut self) -> Result<(), GridError> {
        self.refresh_active_strategies();
        self.mounted = true;
        self.regenerate_row_tree()?;
        for applier in self.pipes.all_appliers() {
            applier(self)?;
        }
        self.apply_filters()?;
        self.apply_sorting()?;
        self.force_update();
        tracing::debug!("grid mounted at version {}", self.version());
        Ok(())
    }

    /// Whether [`mount`](Self::mount) ran.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Remove everything registered by a feature group: pipe processors and appliers,
    /// strategies and props effects. Appliers of the affected pipes re-run.
    pub fn unmount_feature(&mut self, group: &'static str) {
        tracing::debug!("unmounting feature {}", group);
        let changed_pipes = self.pipes.unregister_group(group);
        let changed_strategies = self.strategies.unregister_group(group);
        self.props_effects
            .retain(|(effect_group, _)| *effect_group != group);
        if !self.mounted {
            return;
        }
        for type_id in changed_pipes {
            self.run_pipe_appliers(type_id);
        }
        if changed_strategies {
            self.refresh_active_strategies();
        }
    }
}

impl fmt::Debug for GridApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridApi")
            .field("version", &self.store.version())
            .field("mounted", &self.mounted)
            .field("events", &self.events)
            .field("pipes", &self.pipes)
            .field("strategies", &self.strategies)
            .field("timers", &self.timers)
            .finish_non_exhaustive()
    }
}
