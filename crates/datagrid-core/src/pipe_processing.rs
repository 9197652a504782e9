//! Pipe processing.
//!
//! A pipe is a named transformation chain shared by independent features. Each feature registers
//! a processor for a pipe under its feature group; running the pipe threads an accumulator value
//! through every registered processor, in registration order. Every processor always runs; a
//! processor that has nothing to contribute returns its input unchanged.
//!
//! Registering again under the same group replaces the processor in place, keeping its position.
//! Removing a feature removes its processors (see
//! [`GridApi::unmount_feature`](crate::GridApi::unmount_feature)).
//!
//! Pipes are identified by marker types implementing [`GridPipe`], which ties the pipe name to
//! its value and context types.
//!
//! Some pipes also have *appliers*: functions that recompute state from the pipe's result (the
//! `hydrateColumns` applier rebuilds the column layout). Appliers re-run whenever the set of
//! processors of their pipe changes after the grid is mounted, or on demand through
//! [`GridApi::request_pipe_processors_application`].

use crate::api::GridApi;
use crate::col_def::GridStateColDef;
use crate::error::GridError;
use crate::features::column_menu::GridColumnMenuItem;
use crate::features::columns::GridColumnsState;
use crate::features::dimensions::{GridCellIndexCoordinates, GridScrollPosition};
use crate::props::GridInitialState;
use crate::state::GridState;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A pipe key with its value and context types.
pub trait GridPipe: 'static {
    /// Accumulated value.
    type Value: 'static;
    /// Read-only context handed to every processor.
    type Context: 'static;
    /// Public pipe name.
    const NAME: &'static str;
}

/// Items of the column menu of one column.
#[derive(Debug)]
pub struct ColumnMenu;

impl GridPipe for ColumnMenu {
    type Value = Vec<GridColumnMenuItem>;
    type Context = GridStateColDef;
    const NAME: &'static str = "columnMenu";
}

/// Scroll target computed by `scroll_to_indexes`.
#[derive(Debug)]
pub struct ScrollToIndexes;

impl GridPipe for ScrollToIndexes {
    type Value = GridScrollPosition;
    type Context = GridCellIndexCoordinates;
    const NAME: &'static str = "scrollToIndexes";
}

/// Parameters of the `canBeReordered` pipe.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCanBeReorderedParams {
    /// Column being moved.
    pub field: String,
    /// Index among the visible columns where the column would land.
    pub target_index: usize,
}

/// Whether a column may move to a target index.
#[derive(Debug)]
pub struct CanBeReordered;

impl GridPipe for CanBeReordered {
    type Value = bool;
    type Context = GridCanBeReorderedParams;
    const NAME: &'static str = "canBeReordered";
}

/// State export.
#[derive(Debug)]
pub struct ExportState;

impl GridPipe for ExportState {
    type Value = GridInitialState;
    type Context = ();
    const NAME: &'static str = "exportState";
}

/// Deferred state update produced while restoring a state.
pub type GridStateUpdate = Box<dyn FnOnce(&mut GridState)>;

/// Follow-up work run after a restored state was committed.
pub type GridRestoreCallback = Box<dyn FnOnce(&mut GridApi) -> Result<(), GridError>>;

/// Accumulator of the `restoreState` pipe.
///
/// Processors do not touch the store: they describe the slice updates to commit (applied together
/// in one state update) and the derived recomputations to run afterwards.
#[derive(Default)]
pub struct GridRestoreStateValue {
    /// Slice updates, applied in order within a single commit.
    pub state_updates: Vec<GridStateUpdate>,
    /// Derived recomputations, run in order once the updates are committed.
    pub callbacks: Vec<GridRestoreCallback>,
}

impl fmt::Debug for GridRestoreStateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridRestoreStateValue")
            .field("state_updates", &self.state_updates.len())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// State restoration.
#[derive(Debug)]
pub struct RestoreState;

impl GridPipe for RestoreState {
    type Value = GridRestoreStateValue;
    type Context = GridInitialState;
    const NAME: &'static str = "restoreState";
}

/// Column layout hydration (order and per-column adjustments).
#[derive(Debug)]
pub struct HydrateColumns;

impl GridPipe for HydrateColumns {
    type Value = GridColumnsState;
    type Context = ();
    const NAME: &'static str = "hydrateColumns";
}

/// A pipe processor.
pub type GridPipeProcessor<P> = Rc<
    dyn Fn(&GridApi, <P as GridPipe>::Value, &<P as GridPipe>::Context) -> <P as GridPipe>::Value,
>;

/// A pipe applier.
pub type GridPipeApplier = Rc<dyn Fn(&mut GridApi) -> Result<(), GridError>>;

struct ProcessorEntry<P: GridPipe> {
    group: &'static str,
    processor: GridPipeProcessor<P>,
}

trait ProcessorList {
    fn remove_group(&mut self, group: &'static str) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<P: GridPipe> ProcessorList for Vec<ProcessorEntry<P>> {
    fn remove_group(&mut self, group: &'static str) -> bool {
        let before = self.len();
        self.retain(|entry| entry.group != group);
        before != self.len()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Processors and appliers of every pipe.
#[derive(Default)]
pub struct GridPipeRegistry {
    processors: HashMap<TypeId, (&'static str, Box<dyn ProcessorList>)>,
    appliers: Vec<(TypeId, &'static str, GridPipeApplier)>,
}

impl GridPipeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn list_mut<P: GridPipe>(&mut self) -> Option<&mut Vec<ProcessorEntry<P>>> {
        let (_, list) = self
            .processors
            .entry(TypeId::of::<P>())
            .or_insert_with(|| {
                let list: Box<dyn ProcessorList> = Box::new(Vec::<ProcessorEntry<P>>::new());
                (P::NAME, list)
            });
        list.as_any_mut().downcast_mut::<Vec<ProcessorEntry<P>>>()
    }

    /// Register (or replace in place) the processor of `group`.
    pub fn register<P: GridPipe>(&mut self, group: &'static str, processor: GridPipeProcessor<P>) {
        if let Some(list) = self.list_mut::<P>() {
            match list.iter_mut().find(|entry| entry.group == group) {
                Some(entry) => entry.processor = processor,
                None => list.push(ProcessorEntry { group, processor }),
            }
        }
    }

    /// Remove the processor of `group`. Returns true if one was registered.
    pub fn unregister<P: GridPipe>(&mut self, group: &'static str) -> bool {
        self.processors
            .get_mut(&TypeId::of::<P>())
            .is_some_and(|(_, list)| list.remove_group(group))
    }

    /// Remove every processor and applier of `group`. Returns the pipes whose processors changed.
    pub fn unregister_group(&mut self, group: &'static str) -> Vec<TypeId> {
        let changed = self
            .processors
            .iter_mut()
            .filter_map(|(type_id, (_, list))| list.remove_group(group).then_some(*type_id))
            .collect();
        self.appliers
            .retain(|(_, applier_group, _)| *applier_group != group);
        changed
    }

    /// Snapshot of the processors of a pipe, in registration order.
    pub fn processors<P: GridPipe>(&self) -> Vec<GridPipeProcessor<P>> {
        self.processors
            .get(&TypeId::of::<P>())
            .and_then(|(_, list)| list.as_any().downcast_ref::<Vec<ProcessorEntry<P>>>())
            .map(|list| list.iter().map(|entry| entry.processor.clone()).collect())
            .unwrap_or_default()
    }

    /// Groups with a processor registered for a pipe, in registration order.
    pub fn groups<P: GridPipe>(&self) -> Vec<&'static str> {
        self.processors
            .get(&TypeId::of::<P>())
            .and_then(|(_, list)| list.as_any().downcast_ref::<Vec<ProcessorEntry<P>>>())
            .map(|list| list.iter().map(|entry| entry.group).collect())
            .unwrap_or_default()
    }

    /// Register (or replace) the applier of `group` for pipe `P`.
    pub fn register_applier<P: GridPipe>(&mut self, group: &'static str, applier: GridPipeApplier) {
        let type_id = TypeId::of::<P>();
        match self
            .appliers
            .iter_mut()
            .find(|(pipe, existing, _)| *pipe == type_id && *existing == group)
        {
            Some(entry) => entry.2 = applier,
            None => self.appliers.push((type_id, group, applier)),
        }
    }

    /// Appliers of a pipe, identified by type id.
    pub(crate) fn appliers_of(&self, type_id: TypeId) -> Vec<GridPipeApplier> {
        self.appliers
            .iter()
            .filter(|(pipe, _, _)| *pipe == type_id)
            .map(|(_, _, applier)| applier.clone())
            .collect()
    }

    /// Every applier, in registration order.
    pub(crate) fn all_appliers(&self) -> Vec<GridPipeApplier> {
        self.appliers
            .iter()
            .map(|(_, _, applier)| applier.clone())
            .collect()
    }
}

impl fmt::Debug for GridPipeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, list) in self.processors.values() {
            map.entry(name, &list.len());
        }
        map.finish()
    }
}

impl GridApi {
    /// Register the processor of `group` for pipe `P`.
    ///
    /// When the grid is already mounted, the appliers of `P` run immediately so the derived state
    /// reflects the new processor.
    pub fn register_pipe_processor<P: GridPipe>(
        &mut self,
        group: &'static str,
        processor: impl Fn(&GridApi, P::Value, &P::Context) -> P::Value + 'static,
    ) {
        tracing::trace!("registering {} processor for group {}", P::NAME, group);
        self.pipes.register::<P>(group, Rc::new(processor));
        if self.is_mounted() {
            self.run_pipe_appliers(TypeId::of::<P>());
        }
    }

    /// Remove the processor of `group` for pipe `P`.
    pub fn unregister_pipe_processor<P: GridPipe>(&mut self, group: &'static str) {
        if self.pipes.unregister::<P>(group) && self.is_mounted() {
            self.run_pipe_appliers(TypeId::of::<P>());
        }
    }

    /// Register the applier of `group` for pipe `P`.
    pub fn register_pipe_applier<P: GridPipe>(
        &mut self,
        group: &'static str,
        applier: impl Fn(&mut GridApi) -> Result<(), GridError> + 'static,
    ) {
        self.pipes.register_applier::<P>(group, Rc::new(applier));
    }

    /// Run every processor of pipe `P`, in registration order.
    pub fn apply_pipe_processors<P: GridPipe>(
        &self,
        value: P::Value,
        context: &P::Context,
    ) -> P::Value {
        tracing::trace!("applying {} pipe", P::NAME);
        self.pipes
            .processors::<P>()
            .into_iter()
            .fold(value, |value, processor| processor(self, value, context))
    }

    /// Re-run the appliers of pipe `P`.
    pub fn request_pipe_processors_application<P: GridPipe>(&mut self) -> Result<(), GridError> {
        for applier in self.pipes.appliers_of(TypeId::of::<P>()) {
            applier(self)?;
        }
        Ok(())
    }

    pub(crate) fn run_pipe_appliers(&mut self, type_id: TypeId) {
        for applier in self.pipes.appliers_of(type_id) {
            if let Err(err) = applier(self) {
                self.report_error(&err);
            }
        }
    }
}
