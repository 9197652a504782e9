//! Strategy processing.
//!
//! Several features may offer alternative implementations of the same capability (building the
//! row tree, filtering the rows, sorting them). Exactly one implementation is used per call: the
//! registered strategies of the capability are checked in reverse registration order and the
//! first whose availability check passes wins, so a feature registered later can override the
//! default for as long as it is available.
//!
//! When props change, the active strategy of every capability is re-evaluated and an
//! `activeStrategyProcessorChange` event is published for each capability whose winner changed,
//! letting the owning features recompute their derived state.

use crate::api::GridApi;
use crate::error::GridError;
use crate::events::GridEvent;
use crate::features::filter::{GridFilteringMethodParams, GridFilteringMethodValue};
use crate::features::rows::{GridRowTreeCreationParams, GridRowTreeCreationValue};
use crate::features::sorting::GridSortingMethodParams;
use crate::value::GridRowId;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A capability with its parameter and output types.
pub trait GridStrategyCapability: 'static {
    /// Parameters handed to the selected strategy.
    type Params: 'static;
    /// Output of the selected strategy.
    type Output: 'static;
    /// Public capability name.
    const NAME: &'static str;
}

/// Builds the row tree from the row models.
#[derive(Debug)]
pub struct RowTreeCreation;

impl GridStrategyCapability for RowTreeCreation {
    type Params = GridRowTreeCreationParams;
    type Output = GridRowTreeCreationValue;
    const NAME: &'static str = "rowTreeCreation";
}

/// Decides which rows pass the filters.
#[derive(Debug)]
pub struct Filtering;

impl GridStrategyCapability for Filtering {
    type Params = GridFilteringMethodParams;
    type Output = GridFilteringMethodValue;
    const NAME: &'static str = "filtering";
}

/// Orders the rows.
#[derive(Debug)]
pub struct Sorting;

impl GridStrategyCapability for Sorting {
    type Params = GridSortingMethodParams;
    type Output = Vec<GridRowId>;
    const NAME: &'static str = "sorting";
}

/// Availability check of a strategy.
pub type GridStrategyAvailability = Rc<dyn Fn(&GridApi) -> bool>;

/// A strategy implementation.
pub type GridStrategyProcessor<C> = Rc<
    dyn Fn(
        &GridApi,
        <C as GridStrategyCapability>::Params,
    ) -> Result<<C as GridStrategyCapability>::Output, GridError>,
>;

struct StrategyEntry<C: GridStrategyCapability> {
    group: &'static str,
    strategy_name: &'static str,
    is_available: GridStrategyAvailability,
    processor: GridStrategyProcessor<C>,
}

trait StrategyList {
    fn remove_group(&mut self, group: &'static str) -> bool;
    fn availability(&self) -> Vec<(&'static str, GridStrategyAvailability)>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: GridStrategyCapability> StrategyList for Vec<StrategyEntry<C>> {
    fn remove_group(&mut self, group: &'static str) -> bool {
        let before = self.len();
        self.retain(|entry| entry.group != group);
        before != self.len()
    }

    fn availability(&self) -> Vec<(&'static str, GridStrategyAvailability)> {
        self.iter()
            .rev()
            .map(|entry| (entry.strategy_name, entry.is_available.clone()))
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Capability {
    name: &'static str,
    strategies: Box<dyn StrategyList>,
    active: Option<&'static str>,
}

/// Strategies of every capability.
#[derive(Default)]
pub struct GridStrategyRegistry {
    capabilities: HashMap<TypeId, Capability>,
}

impl GridStrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn list_mut<C: GridStrategyCapability>(&mut self) -> Option<&mut Vec<StrategyEntry<C>>> {
        let capability = self
            .capabilities
            .entry(TypeId::of::<C>())
            .or_insert_with(|| {
                let strategies: Box<dyn StrategyList> =
                    Box::new(Vec::<StrategyEntry<C>>::new());
                Capability {
                    name: C::NAME,
                    strategies,
                    active: None,
                }
            });
        capability
            .strategies
            .as_any_mut()
            .downcast_mut::<Vec<StrategyEntry<C>>>()
    }

    fn list<C: GridStrategyCapability>(&self) -> Option<&Vec<StrategyEntry<C>>> {
        self.capabilities
            .get(&TypeId::of::<C>())
            .and_then(|capability| capability.strategies.as_any().downcast_ref())
    }

    /// Register a strategy. A strategy registered again by the same group replaces the previous
    /// one in place.
    pub fn register<C: GridStrategyCapability>(
        &mut self,
        group: &'static str,
        strategy_name: &'static str,
        is_available: GridStrategyAvailability,
        processor: GridStrategyProcessor<C>,
    ) {
        if let Some(list) = self.list_mut::<C>() {
            let entry = StrategyEntry {
                group,
                strategy_name,
                is_available,
                processor,
            };
            match list
                .iter_mut()
                .find(|existing| existing.group == group && existing.strategy_name == strategy_name)
            {
                Some(existing) => *existing = entry,
                None => list.push(entry),
            }
        }
    }

    /// Remove every strategy of `group`.
    pub fn unregister_group(&mut self, group: &'static str) -> bool {
        let mut changed = false;
        for capability in self.capabilities.values_mut() {
            changed |= capability.strategies.remove_group(group);
        }
        changed
    }

    /// Names of the strategies of a capability, in registration order.
    pub fn strategy_names<C: GridStrategyCapability>(&self) -> Vec<&'static str> {
        self.list::<C>()
            .map(|list| list.iter().map(|entry| entry.strategy_name).collect())
            .unwrap_or_default()
    }

    fn candidates<C: GridStrategyCapability>(
        &self,
    ) -> Vec<(&'static str, GridStrategyAvailability, GridStrategyProcessor<C>)> {
        self.list::<C>()
            .map(|list| {
                list.iter()
                    .rev()
                    .map(|entry| {
                        (
                            entry.strategy_name,
                            entry.is_available.clone(),
                            entry.processor.clone(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn availability(&self) -> Vec<(TypeId, Vec<(&'static str, GridStrategyAvailability)>)> {
        self.capabilities
            .iter()
            .map(|(type_id, capability)| (*type_id, capability.strategies.availability()))
            .collect()
    }

    fn set_active(
        &mut self,
        type_id: TypeId,
        active: Option<&'static str>,
    ) -> Option<&'static str> {
        let capability = self.capabilities.get_mut(&type_id)?;
        if capability.active == active {
            return None;
        }
        capability.active = active;
        Some(capability.name)
    }
}

impl fmt::Debug for GridStrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for capability in self.capabilities.values() {
            map.entry(&capability.name, &capability.active);
        }
        map.finish()
    }
}

impl GridApi {
    /// Register a strategy of capability `C` owned by `group`.
    pub fn register_strategy_processor<C: GridStrategyCapability>(
        &mut self,
        group: &'static str,
        strategy_name: &'static str,
        is_available: impl Fn(&GridApi) -> bool + 'static,
        processor: impl Fn(&GridApi, C::Params) -> Result<C::Output, GridError> + 'static,
    ) {
        tracing::trace!(
            "registering {} strategy {} for group {}",
            C::NAME,
            strategy_name,
            group
        );
        self.strategies.register::<C>(
            group,
            strategy_name,
            Rc::new(is_available),
            Rc::new(processor),
        );
        if self.is_mounted() {
            self.refresh_active_strategies();
        }
    }

    /// Name of the strategy that would run for capability `C`.
    pub fn active_strategy<C: GridStrategyCapability>(&self) -> Option<&'static str> {
        self.strategies
            .candidates::<C>()
            .into_iter()
            .find(|(_, is_available, _)| is_available(self))
            .map(|(name, _, _)| name)
    }

    /// Run the active strategy of capability `C`.
    ///
    /// Strategies are checked from the most recently registered one. Having no available
    /// strategy is a configuration error.
    pub fn apply_strategy_processor<C: GridStrategyCapability>(
        &self,
        params: C::Params,
    ) -> Result<C::Output, GridError> {
        let (name, _, processor) = self
            .strategies
            .candidates::<C>()
            .into_iter()
            .find(|(_, is_available, _)| is_available(self))
            .ok_or(GridError::NoStrategyAvailable {
                capability: C::NAME,
            })?;
        tracing::trace!("applying {} strategy {}", C::NAME, name);
        processor(self, params)
    }

    /// Re-evaluate the winner of every capability and publish
    /// `activeStrategyProcessorChange` for each one that changed.
    pub(crate) fn refresh_active_strategies(&mut self) {
        let mut changes = Vec::new();
        for (type_id, strategies) in self.strategies.availability() {
            let active = strategies
                .into_iter()
                .find(|(_, is_available)| is_available(self))
                .map(|(name, _)| name);
            if let Some(capability) = self.strategies.set_active(type_id, active) {
                changes.push((capability, active));
            }
        }
        if !self.is_mounted() {
            return;
        }
        for (capability, strategy) in changes {
            tracing::debug!("active {} strategy is now {:?}", capability, strategy);
            self.publish_event(GridEvent::ActiveStrategyProcessorChange {
                capability,
                strategy,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Labeling;

    impl GridStrategyCapability for Labeling {
        type Params = u32;
        type Output = String;
        const NAME: &'static str = "labeling";
    }

    fn processor(label: &'static str) -> GridStrategyProcessor<Labeling> {
        Rc::new(move |_: &GridApi, value: u32| -> Result<String, GridError> {
            Ok(format!("{label}:{value}"))
        })
    }

    #[test]
    fn test_registry_lists_strategies_in_registration_order() {
        let mut registry = GridStrategyRegistry::new();
        let always: GridStrategyAvailability = Rc::new(|_: &GridApi| true);
        registry.register::<Labeling>("core", "flat", always.clone(), processor("flat"));
        registry.register::<Labeling>("tree", "tree", always.clone(), processor("tree"));
        registry.register::<Labeling>("core", "flat", always, processor("flat2"));

        assert_eq!(registry.strategy_names::<Labeling>(), vec!["flat", "tree"]);
        assert!(registry.unregister_group("tree"));
        assert!(!registry.unregister_group("tree"));
        assert_eq!(registry.strategy_names::<Labeling>(), vec!["flat"]);
        assert!(registry.strategy_names::<Sorting>().is_empty());
    }
}
