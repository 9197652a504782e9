//! Viewport dimensions and scrolling.

use crate::api::GridApi;
use crate::error::GridError;
use crate::events::GridEvent;
use crate::pipe_processing::ScrollToIndexes;
use crate::state::GridState;
use std::rc::Rc;

/// Dimensions slice.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridDimensionsState {
    /// Inner width of the viewport.
    pub viewport_width: f64,
    /// Inner height of the viewport.
    pub viewport_height: f64,
    /// Horizontal scroll offset.
    pub scroll_left: f64,
    /// Vertical scroll offset.
    pub scroll_top: f64,
}

/// Scroll target. `None` leaves the axis untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridScrollPosition {
    /// Horizontal offset.
    pub left: Option<f64>,
    /// Vertical offset.
    pub top: Option<f64>,
}

/// Cell to bring into view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridCellIndexCoordinates {
    /// Index among the visible rows.
    pub row_index: Option<usize>,
    /// Index among the visible columns.
    pub col_index: Option<usize>,
}

/// Offset bringing `[offset, offset + size)` into a window of `client_size` scrolled at
/// `scroll`, or `None` when it is already fully visible.
pub fn scroll_into_view(client_size: f64, scroll: f64, size: f64, offset: f64) -> Option<f64> {
    let end = offset + size;
    if size > client_size {
        return Some(offset);
    }
    if end - client_size > scroll {
        return Some(end - client_size);
    }
    if offset < scroll {
        return Some(offset);
    }
    None
}

fn with_dimensions(state: &GridState, dimensions: GridDimensionsState) -> GridState {
    GridState {
        dimensions: Rc::new(dimensions),
        ..state.clone()
    }
}

impl GridApi {
    /// Current viewport dimensions and scroll offsets.
    pub fn get_dimensions(&self) -> GridDimensionsState {
        *self.state_ref().dimensions
    }

    /// Number of rows fitting in the viewport.
    pub fn get_viewport_page_size(&self) -> usize {
        let row_height = self.props().row_height;
        if row_height <= 0.0 {
            return 0;
        }
        (self.state_ref().dimensions.viewport_height / row_height).floor() as usize
    }

    /// Resize the viewport. Flex columns are redistributed.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        let dimensions = *self.state_ref().dimensions;
        if dimensions.viewport_width == width && dimensions.viewport_height == height {
            return;
        }
        self.set_state(|state| {
            with_dimensions(
                state,
                GridDimensionsState {
                    viewport_width: width,
                    viewport_height: height,
                    ..dimensions
                },
            )
        });
        self.hydrate_column_widths();
        self.publish_event(GridEvent::ViewportInnerSizeChange { width, height });
    }

    /// Scroll the viewport and publish `rowsScroll`.
    pub fn scroll(&mut self, position: GridScrollPosition) {
        let dimensions = *self.state_ref().dimensions;
        let next = GridDimensionsState {
            scroll_left: position.left.unwrap_or(dimensions.scroll_left).max(0.0),
            scroll_top: position.top.unwrap_or(dimensions.scroll_top).max(0.0),
            ..dimensions
        };
        self.set_state(|state| with_dimensions(state, next));
        self.publish_event(GridEvent::RowsScroll {
            left: next.scroll_left,
            top: next.scroll_top,
        });
    }

    /// Scroll so that a cell becomes visible. Returns whether the viewport scrolled.
    pub fn scroll_to_indexes(
        &mut self,
        coordinates: GridCellIndexCoordinates,
    ) -> Result<bool, GridError> {
        let state = self.state();
        let dimensions = *state.dimensions;
        let mut position = GridScrollPosition::default();

        if let Some(col_index) = coordinates.col_index {
            let columns = self.get_visible_columns();
            let positions = self.selectors().column_positions.select(&state);
            let column = columns
                .get(col_index)
                .ok_or_else(|| GridError::ColumnNotFound(format!("#{col_index}")))?;
            position.left = scroll_into_view(
                dimensions.viewport_width,
                dimensions.scroll_left,
                column.computed_width,
                positions.get(col_index).copied().unwrap_or_default(),
            );
        }

        if let Some(row_index) = coordinates.row_index {
            let pagination = &state.pagination;
            let element_index = if self.props().pagination {
                row_index.saturating_sub(pagination.page * pagination.page_size)
            } else {
                row_index
            };
            let row_height = self.props().row_height;
            position.top = scroll_into_view(
                dimensions.viewport_height,
                dimensions.scroll_top,
                row_height,
                row_height * element_index as f64,
            );
        }

        let position = self.apply_pipe_processors::<ScrollToIndexes>(position, &coordinates);
        if position.left.is_none() && position.top.is_none() {
            return Ok(false);
        }
        self.scroll(position);
        Ok(true)
    }
}
