//! Pagination.
//!
//! The pagination slice holds the current page and the page size. Rows are only split in pages
//! when the `pagination` prop is set; the slice is kept up to date either way so it survives the
//! prop being toggled. After every filtering pass the page is clamped to the last page of the
//! filtered top-level rows (or of `row_count` in server mode).

use crate::api::GridApi;
use crate::control_state::GridControlStateItem;
use crate::error::GridError;
use crate::events::{GridEvent, GridEventName};
use crate::pipe_processing::{ExportState, RestoreState};
use crate::props::{
    GridCallback, GridChangeReason, GridFeatureMode, GridInitialState,
    GridPaginationInitialState, GridProps,
};
use crate::state::GridState;
use crate::value::GridRowId;
use std::rc::Rc;

const GROUP: &str = "pagination";

/// Page size used when neither the props nor the initial state provide one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Pagination slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPaginationState {
    /// Zero-based page.
    pub page: usize,
    /// Number of top-level rows per page.
    pub page_size: usize,
}

impl Default for GridPaginationState {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Number of pages needed for `row_count` rows. No rows or a zero page size give no page.
pub fn get_page_count(row_count: usize, page_size: usize) -> usize {
    if page_size == 0 || row_count == 0 {
        return 0;
    }
    row_count.div_ceil(page_size)
}

fn with_pagination(state: &GridState, pagination: GridPaginationState) -> GridState {
    GridState {
        pagination: Rc::new(pagination),
        ..state.clone()
    }
}

fn with_page(state: &GridState, page: usize) -> GridState {
    with_pagination(
        state,
        GridPaginationState {
            page,
            ..*state.pagination
        },
    )
}

fn with_page_size(state: &GridState, page_size: usize) -> GridState {
    with_pagination(
        state,
        GridPaginationState {
            page_size,
            ..*state.pagination
        },
    )
}

fn page(state: &GridState) -> &usize {
    &state.pagination.page
}

fn restore_page(previous: &GridState, next: &GridState) -> GridState {
    with_page(next, previous.pagination.page)
}

fn page_prop(props: &GridProps) -> Option<&usize> {
    props.page.as_ref()
}

fn on_page_change(props: &GridProps) -> Option<&GridCallback<usize>> {
    props.on_page_change.as_ref()
}

fn page_change(page: &usize, _: Option<GridChangeReason>) -> GridEvent {
    GridEvent::PageChange { page: *page }
}

fn page_size(state: &GridState) -> &usize {
    &state.pagination.page_size
}

fn restore_page_size(previous: &GridState, next: &GridState) -> GridState {
    with_page_size(next, previous.pagination.page_size)
}

fn page_size_prop(props: &GridProps) -> Option<&usize> {
    props.page_size.as_ref()
}

fn on_page_size_change(props: &GridProps) -> Option<&GridCallback<usize>> {
    props.on_page_size_change.as_ref()
}

fn page_size_change(page_size: &usize, _: Option<GridChangeReason>) -> GridEvent {
    GridEvent::PageSizeChange {
        page_size: *page_size,
    }
}

impl GridApi {
    /// Current page and page size.
    pub fn get_pagination(&self) -> GridPaginationState {
        *self.state_ref().pagination
    }

    /// Number of top-level rows being paginated: the filtered rows, or `row_count` in server
    /// mode.
    pub fn get_pagination_row_count(&self) -> usize {
        match (self.props().pagination_mode, self.props().row_count) {
            (GridFeatureMode::Server, Some(row_count)) => row_count,
            _ => *self
                .selectors()
                .filtered_top_level_row_count
                .select(self.state_ref()),
        }
    }

    /// Number of pages of the current rows.
    pub fn get_page_count(&self) -> usize {
        get_page_count(
            self.get_pagination_row_count(),
            self.state_ref().pagination.page_size,
        )
    }

    fn clamp_page(&self, page: usize) -> usize {
        page.min(self.get_page_count().saturating_sub(1))
    }

    /// Go to `page`, clamped to the last page.
    pub fn set_page(&mut self, page: usize) {
        let page = self.clamp_page(page);
        if page == self.state_ref().pagination.page {
            return;
        }
        tracing::debug!("Setting page to {}", page);
        self.set_state(|state| with_page(state, page));
        self.force_update();
    }

    /// Change the number of rows per page. The page is clamped to the new last page.
    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size == self.state_ref().pagination.page_size {
            return;
        }
        tracing::debug!("Setting page size to {}", page_size);
        self.set_state(|state| with_page_size(state, page_size));
        self.ensure_page_in_range();
        self.force_update();
    }

    /// Move back to the last page when the current one is past it.
    pub fn ensure_page_in_range(&mut self) {
        let current = self.state_ref().pagination.page;
        let page = self.clamp_page(current);
        if page != current {
            tracing::debug!("page {} is out of range, moving to page {}", current, page);
            self.set_state(|state| with_page(state, page));
        }
    }

    /// Visible rows of the current page, or every visible row when pagination is off.
    pub fn get_paginated_row_ids(&self) -> Rc<Vec<GridRowId>> {
        let selectors = self.selectors();
        if !self.props().pagination {
            return selectors.visible_sorted_row_ids.select(self.state_ref());
        }
        selectors.paginated_row_ids.select(self.state_ref())
    }
}

/// Initialize the pagination slice and register the page and page size handlers.
pub fn register_pagination(api: &mut GridApi) -> Result<(), GridError> {
    let props = api.props().clone();
    let initial = props
        .initial_state
        .as_ref()
        .and_then(|state| state.pagination.clone())
        .unwrap_or_default();
    let pagination = GridPaginationState {
        page: props.page.or(initial.page).unwrap_or(0),
        page_size: props
            .page_size
            .or(initial.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE),
    };
    api.initialize_state(|state| with_pagination(state, pagination));

    api.register_control_state(GridControlStateItem {
        state_id: "page",
        state_selector: page,
        restore_previous: restore_page,
        prop_model: page_prop,
        prop_on_change: on_page_change,
        change_event: page_change,
    });
    api.register_control_state(GridControlStateItem {
        state_id: "pageSize",
        state_selector: page_size,
        restore_previous: restore_page_size,
        prop_model: page_size_prop,
        prop_on_change: on_page_size_change,
        change_event: page_size_change,
    });

    api.subscribe_event(GridEventName::FilteredRowsSet, |api, _, _| {
        api.ensure_page_in_range();
        Ok(())
    });

    api.register_pipe_processor::<ExportState>(GROUP, |api, state: GridInitialState, _| {
        let pagination = api.get_pagination();
        let props = api.props();
        let initialized = props
            .initial_state
            .as_ref()
            .and_then(|state| state.pagination.as_ref());
        let export_page = props.page.is_some()
            || initialized.is_some_and(|initial| initial.page.is_some())
            || pagination.page != 0;
        let export_page_size = props.page_size.is_some()
            || initialized.is_some_and(|initial| initial.page_size.is_some())
            || pagination.page_size != DEFAULT_PAGE_SIZE;
        if !export_page && !export_page_size {
            return state;
        }
        GridInitialState {
            pagination: Some(GridPaginationInitialState {
                page: export_page.then_some(pagination.page),
                page_size: export_page_size.then_some(pagination.page_size),
            }),
            ..state
        }
    });

    api.register_pipe_processor::<RestoreState>(GROUP, |_, mut value, context| {
        let Some(pagination) = context.pagination.clone() else {
            return value;
        };
        value
            .state_updates
            .push(Box::new(move |state: &mut GridState| {
                let mut next = *state.pagination;
                if let Some(page_size) = pagination.page_size {
                    next.page_size = page_size;
                }
                if let Some(page) = pagination.page {
                    next.page = page;
                }
                *state = with_pagination(state, next);
            }));
        value.callbacks.push(Box::new(|api: &mut GridApi| {
            api.ensure_page_in_range();
            Ok(())
        }));
        value
    });

    api.register_props_effect(GROUP, |api, previous| {
        let props = api.props().clone();
        if let Some(page_size) = props.page_size
            && previous.page_size != Some(page_size)
        {
            api.set_page_size(page_size);
        }
        if let Some(page) = props.page
            && previous.page != Some(page)
        {
            api.set_page(page);
        }
        if previous.row_count != props.row_count
            || previous.pagination_mode != props.pagination_mode
        {
            api.ensure_page_in_range();
        }
        Ok(())
    });
    Ok(())
}
