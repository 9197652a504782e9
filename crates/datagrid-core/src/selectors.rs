//! Memoized selectors.
//!
//! A selector maps a [`GridState`] snapshot to a derived value. [`MemoSelector`] caches the last
//! `(input, output)` pair, where the input is the exact set of slices (or upstream selector
//! outputs) the selector reads. Inputs are compared by reference, so a selector recomputes only
//! when one of the slices it depends on was replaced. Because upstream outputs are themselves
//! `Rc`s handed out from a cache, invalidation propagates through composed selectors.
//!
//! Every grid instance owns its own [`GridSelectors`].

use crate::col_def::GridStateColDef;
use crate::features::columns::{GridColumnsState, GridPinnedColumns, filter_columns};
use crate::features::pagination::GridPaginationState;
use crate::features::rows::GridRowsState;
use crate::state::GridState;
use crate::value::GridRowId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Inputs of a memoized selector.
pub trait SelectorInput {
    /// Whether two inputs are the same (reference equality for shared values).
    fn same_as(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SelectorInput for Rc<T> {
    fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

macro_rules! impl_selector_input_by_value {
    ($($ty:ty),*) => {
        $(impl SelectorInput for $ty {
            fn same_as(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

impl_selector_input_by_value!(bool, usize, u64, f64);

macro_rules! impl_selector_input_for_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: SelectorInput),+> SelectorInput for ($($name,)+) {
            fn same_as(&self, other: &Self) -> bool {
                $(self.$idx.same_as(&other.$idx))&&+
            }
        }
    };
}

impl_selector_input_for_tuple!(A: 0, B: 1);
impl_selector_input_for_tuple!(A: 0, B: 1, C: 2);
impl_selector_input_for_tuple!(A: 0, B: 1, C: 2, D: 3);

type InputFn<I> = Box<dyn Fn(&GridState) -> I>;
type CombineFn<I, O> = Box<dyn Fn(&I) -> O>;

/// A selector caching its last result.
pub struct MemoSelector<I, O> {
    input: InputFn<I>,
    combine: CombineFn<I, O>,
    cache: RefCell<Option<(I, Rc<O>)>>,
    recomputations: Cell<usize>,
}

impl<I: SelectorInput, O> MemoSelector<I, O> {
    /// Create a selector from an input extractor and a pure combiner.
    pub fn new(
        input: impl Fn(&GridState) -> I + 'static,
        combine: impl Fn(&I) -> O + 'static,
    ) -> Self {
        Self {
            input: Box::new(input),
            combine: Box::new(combine),
            cache: RefCell::new(None),
            recomputations: Cell::new(0),
        }
    }

    /// Evaluate against a snapshot.
    pub fn select(&self, state: &GridState) -> Rc<O> {
        let input = (self.input)(state);
        if let Some((cached_input, output)) = self.cache.borrow().as_ref()
            && cached_input.same_as(&input)
        {
            return output.clone();
        }
        let output = Rc::new((self.combine)(&input));
        self.recomputations.set(self.recomputations.get() + 1);
        *self.cache.borrow_mut() = Some((input, output.clone()));
        output
    }

    /// Number of times the combiner ran.
    pub fn recomputations(&self) -> usize {
        self.recomputations.get()
    }
}

impl<I, O> fmt::Debug for MemoSelector<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoSelector")
            .field("recomputations", &self.recomputations.get())
            .finish_non_exhaustive()
    }
}

/// Rows in display order whose filter result is not `false` and whose ancestors are expanded.
fn visible_sorted_rows(
    rows: &GridRowsState,
    sorted: &[GridRowId],
    visible_lookup: &HashMap<GridRowId, bool>,
) -> Vec<GridRowId> {
    sorted
        .iter()
        .filter(|id| {
            if visible_lookup.get(*id) == Some(&false) {
                return false;
            }
            let Some(node) = rows.tree.nodes.get(*id) else {
                return false;
            };
            let mut parent = node.parent.as_ref();
            while let Some(parent_id) = parent {
                match rows.tree.nodes.get(parent_id) {
                    Some(parent_node) if parent_node.children_expanded => {
                        parent = parent_node.parent.as_ref();
                    }
                    _ => return false,
                }
            }
            true
        })
        .cloned()
        .collect()
}

fn paginate(
    rows: &GridRowsState,
    visible: &[GridRowId],
    pagination: &GridPaginationState,
) -> Vec<GridRowId> {
    if pagination.page_size == 0 {
        return visible.to_vec();
    }
    let first = pagination.page * pagination.page_size;
    let last = first + pagination.page_size;
    let mut top_level_index: Option<usize> = None;
    visible
        .iter()
        .filter(|id| {
            let depth = rows.tree.nodes.get(*id).map(|node| node.depth).unwrap_or(0);
            if depth == 0 {
                top_level_index = Some(top_level_index.map_or(0, |index| index + 1));
            }
            top_level_index.is_some_and(|index| index >= first && index < last)
        })
        .cloned()
        .collect()
}

/// Memoized selectors of one grid instance.
pub struct GridSelectors {
    /// Columns whose visibility model entry is not `false`, in display order.
    pub visible_columns: Rc<MemoSelector<Rc<GridColumnsState>, Vec<GridStateColDef>>>,
    /// Fields of the visible columns.
    pub visible_column_fields: Rc<MemoSelector<Rc<Vec<GridStateColDef>>, Vec<String>>>,
    /// Left offset of each visible column.
    pub column_positions: MemoSelector<Rc<Vec<GridStateColDef>>, Vec<f64>>,
    /// Sum of the visible column widths.
    pub columns_total_width: MemoSelector<Rc<Vec<GridStateColDef>>, f64>,
    /// Pinned columns restricted to visible fields (left wins over right).
    pub visible_pinned_columns:
        MemoSelector<(Rc<GridPinnedColumns>, Rc<Vec<String>>), GridPinnedColumns>,
    /// Row ids passing the filters, in sorted order, honoring expansion.
    #[allow(clippy::type_complexity)]
    pub visible_sorted_row_ids: Rc<
        MemoSelector<
            (
                Rc<GridRowsState>,
                Rc<Vec<GridRowId>>,
                Rc<HashMap<GridRowId, bool>>,
            ),
            Vec<GridRowId>,
        >,
    >,
    /// Number of visible top-level rows.
    pub visible_top_level_row_count: MemoSelector<(Rc<Vec<GridRowId>>, Rc<GridRowsState>), usize>,
    /// Visible rows of the current page.
    #[allow(clippy::type_complexity)]
    pub paginated_row_ids: MemoSelector<
        (
            Rc<Vec<GridRowId>>,
            Rc<GridRowsState>,
            Rc<GridPaginationState>,
        ),
        Vec<GridRowId>,
    >,
    /// Number of top-level rows passing the filters, regardless of expansion.
    pub filtered_top_level_row_count:
        MemoSelector<(Rc<GridRowsState>, Rc<HashMap<GridRowId, bool>>), usize>,
}

impl GridSelectors {
    /// Build the selector set of a new grid instance.
    pub fn new() -> Self {
        let visible_columns = Rc::new(MemoSelector::new(
            |state: &GridState| state.columns.clone(),
            |columns: &Rc<GridColumnsState>| {
                columns
                    .all
                    .iter()
                    .filter(|field| columns.column_visibility_model.get(*field) != Some(&false))
                    .filter_map(|field| columns.lookup.get(field).cloned())
                    .collect::<Vec<_>>()
            },
        ));

        let visible_column_fields = {
            let visible_columns = visible_columns.clone();
            Rc::new(MemoSelector::new(
                move |state: &GridState| visible_columns.select(state),
                |columns: &Rc<Vec<GridStateColDef>>| {
                    columns.iter().map(|column| column.field.clone()).collect()
                },
            ))
        };

        let column_positions = {
            let visible_columns = visible_columns.clone();
            MemoSelector::new(
                move |state: &GridState| visible_columns.select(state),
                |columns: &Rc<Vec<GridStateColDef>>| {
                    let mut left = 0.0;
                    columns
                        .iter()
                        .map(|column| {
                            let position = left;
                            left += column.computed_width;
                            position
                        })
                        .collect()
                },
            )
        };

        let columns_total_width = {
            let visible_columns = visible_columns.clone();
            MemoSelector::new(
                move |state: &GridState| visible_columns.select(state),
                |columns: &Rc<Vec<GridStateColDef>>| {
                    columns.iter().map(|column| column.computed_width).sum()
                },
            )
        };

        let visible_pinned_columns = {
            let visible_column_fields = visible_column_fields.clone();
            MemoSelector::new(
                move |state: &GridState| {
                    (
                        state.pinned_columns.clone(),
                        visible_column_fields.select(state),
                    )
                },
                |(pinned, fields): &(Rc<GridPinnedColumns>, Rc<Vec<String>>)| {
                    let (left, right) = filter_columns(pinned, fields);
                    GridPinnedColumns { left, right }
                },
            )
        };

        let visible_sorted_row_ids = Rc::new(MemoSelector::new(
            |state: &GridState| {
                (
                    state.rows.clone(),
                    state.sorting.sorted_rows.clone(),
                    state.filter.visible_rows_lookup.clone(),
                )
            },
            |(rows, sorted, lookup): &(
                Rc<GridRowsState>,
                Rc<Vec<GridRowId>>,
                Rc<HashMap<GridRowId, bool>>,
            )| visible_sorted_rows(rows, sorted, lookup),
        ));

        let visible_top_level_row_count = {
            let visible_sorted_row_ids = visible_sorted_row_ids.clone();
            MemoSelector::new(
                move |state: &GridState| (visible_sorted_row_ids.select(state), state.rows.clone()),
                |(visible, rows): &(Rc<Vec<GridRowId>>, Rc<GridRowsState>)| {
                    visible
                        .iter()
                        .filter(|id| rows.tree.nodes.get(*id).is_some_and(|node| node.depth == 0))
                        .count()
                },
            )
        };

        let paginated_row_ids = {
            let visible_sorted_row_ids = visible_sorted_row_ids.clone();
            MemoSelector::new(
                move |state: &GridState| {
                    (
                        visible_sorted_row_ids.select(state),
                        state.rows.clone(),
                        state.pagination.clone(),
                    )
                },
                |(visible, rows, pagination): &(
                    Rc<Vec<GridRowId>>,
                    Rc<GridRowsState>,
                    Rc<GridPaginationState>,
                )| paginate(rows, visible, pagination),
            )
        };

        let filtered_top_level_row_count = MemoSelector::new(
            |state: &GridState| {
                (
                    state.rows.clone(),
                    state.filter.visible_rows_lookup.clone(),
                )
            },
            |(rows, lookup): &(Rc<GridRowsState>, Rc<HashMap<GridRowId, bool>>)| {
                rows.tree
                    .roots
                    .iter()
                    .filter(|id| lookup.get(*id) != Some(&false))
                    .count()
            },
        );

        Self {
            visible_columns,
            visible_column_fields,
            column_positions,
            columns_total_width,
            visible_pinned_columns,
            visible_sorted_row_ids,
            visible_top_level_row_count,
            paginated_row_ids,
            filtered_top_level_row_count,
        }
    }
}

impl Default for GridSelectors {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GridSelectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridSelectors").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::col_def::GridColDef;

    fn columns_state(fields: &[&str]) -> GridColumnsState {
        let mut state = GridColumnsState::default();
        for field in fields {
            state.all.push(field.to_string());
            state.lookup.insert(
                field.to_string(),
                GridStateColDef::resolve(GridColDef::new(*field)),
            );
        }
        state
    }

    #[test]
    fn test_memo_selector_recomputes_only_when_input_slice_changes() {
        let selectors = GridSelectors::new();
        let state = GridState {
            columns: Rc::new(columns_state(&["a", "b"])),
            ..GridState::default()
        };

        let first = selectors.visible_columns.select(&state);
        let again = selectors.visible_columns.select(&state);
        assert!(Rc::ptr_eq(&first, &again));
        assert_eq!(selectors.visible_columns.recomputations(), 1);

        // An unrelated slice changes: cached value is reused.
        let state = GridState {
            pagination: Rc::new(GridPaginationState {
                page: 3,
                page_size: 10,
            }),
            ..state
        };
        selectors.visible_columns.select(&state);
        assert_eq!(selectors.visible_columns.recomputations(), 1);

        let state = GridState {
            columns: Rc::new(columns_state(&["a"])),
            ..state
        };
        assert_eq!(selectors.visible_columns.select(&state).len(), 1);
        assert_eq!(selectors.visible_columns.recomputations(), 2);
    }

    #[test]
    fn test_composed_selectors_follow_upstream_cache() {
        let selectors = GridSelectors::new();
        let state = GridState {
            columns: Rc::new(columns_state(&["a", "b", "c"])),
            ..GridState::default()
        };
        assert_eq!(*selectors.column_positions.select(&state), vec![0.0, 100.0, 200.0]);
        assert_eq!(*selectors.columns_total_width.select(&state), 300.0);

        let state = GridState {
            dimensions: Default::default(),
            ..state
        };
        selectors.column_positions.select(&state);
        assert_eq!(selectors.column_positions.recomputations(), 1);
    }
}
