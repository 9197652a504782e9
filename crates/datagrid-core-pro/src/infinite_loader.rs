//! Infinite loader.
//!
//! Publishes `rowsScrollEnd` when a scroll brings the bottom of the viewport within
//! `scroll_end_threshold` pixels of the end of the rows, then stays quiet until the viewport
//! leaves that area again.

use datagrid_core::events::{GridEvent, GridEventName};
use datagrid_core::props::GridRowsScrollEndParams;
use datagrid_core::{GridApi, GridError};
use std::cell::Cell;

/// Height of the rows of the current page, never less than one pixel.
fn content_height(api: &GridApi) -> f64 {
    let row_count = api.get_paginated_row_ids().len();
    (row_count as f64 * api.props().row_height).max(1.0)
}

fn handle_rows_scroll(api: &mut GridApi, top: f64, is_in_bottom_area: &Cell<bool>) {
    let dimensions = api.get_dimensions();
    let scroll_bottom = top + dimensions.viewport_height;
    let threshold = content_height(api) - api.props().scroll_end_threshold;

    if scroll_bottom < threshold {
        is_in_bottom_area.set(false);
        return;
    }
    if is_in_bottom_area.get() {
        return;
    }
    is_in_bottom_area.set(true);
    let event = GridEvent::RowsScrollEnd {
        viewport_page_size: api.get_viewport_page_size(),
        virtual_row_count: api.get_paginated_row_ids().len(),
        visible_columns: api
            .get_visible_columns()
            .iter()
            .map(|column| column.field.clone())
            .collect(),
    };
    tracing::debug!("scrolled to the end of the rows at {}", top);
    api.publish_event(event);
}

/// Register the scroll end detection and the `on_rows_scroll_end` handler.
pub fn register_infinite_loader(api: &mut GridApi) -> Result<(), GridError> {
    let is_in_bottom_area = Cell::new(false);
    api.subscribe_event(GridEventName::RowsScroll, move |api, event, _| {
        if let GridEvent::RowsScroll { top, .. } = event {
            handle_rows_scroll(api, *top, &is_in_bottom_area);
        }
        Ok(())
    });

    api.subscribe_event(GridEventName::RowsScrollEnd, |api, event, _| {
        let GridEvent::RowsScrollEnd {
            viewport_page_size,
            virtual_row_count,
            visible_columns,
        } = event
        else {
            return Ok(());
        };
        if let Some(on_rows_scroll_end) = api.props().on_rows_scroll_end.clone() {
            on_rows_scroll_end(&GridRowsScrollEndParams {
                viewport_page_size: *viewport_page_size,
                virtual_row_count: *virtual_row_count,
                visible_columns: visible_columns.clone(),
            });
        }
        Ok(())
    });
    Ok(())
}
