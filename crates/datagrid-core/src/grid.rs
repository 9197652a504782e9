//! Community grid assembly.

use crate::api::GridApi;
use crate::error::GridError;
use crate::features::columns::register_columns;
use crate::features::filter::register_filter;
use crate::features::pagination::register_pagination;
use crate::features::preference_panel::register_preference_panel;
use crate::features::rows::register_rows;
use crate::features::sorting::register_sorting;
use crate::props::GridProps;
use std::ops::{Deref, DerefMut};

/// Props normalization of the community tier: multi-column filtering and sorting are off.
pub fn community_props(props: GridProps) -> GridProps {
    GridProps {
        disable_multiple_column_filtering: true,
        disable_multiple_column_sorting: true,
        ..props
    }
}

/// Register every community feature, in dependency order.
///
/// Rows come first (the row tree feeds everything else), then columns (filter and sort models
/// are sanitized against them), then the features reading both.
pub fn register_community_features(api: &mut GridApi) -> Result<(), GridError> {
    register_rows(api)?;
    register_columns(api)?;
    register_filter(api)?;
    register_sorting(api)?;
    register_pagination(api)?;
    register_preference_panel(api)?;
    Ok(())
}

/// A mounted community grid.
///
/// Dereferences to [`GridApi`], so every API method is available on the grid directly.
///
/// ```rust
/// use datagrid_core::{DataGrid, GridColDef, GridProps, GridRowId, GridRowModel, GridSortItem};
///
/// let rows = vec![
///     GridRowModel::new().with("id", 1).with("brand", "Puma"),
///     GridRowModel::new().with("id", 2).with("brand", "Adidas"),
/// ];
/// let mut grid = DataGrid::new(GridProps::new(rows, vec![GridColDef::new("brand")])).unwrap();
///
/// grid.set_sort_model(vec![GridSortItem::asc("brand")]).unwrap();
/// assert_eq!(*grid.get_sorted_row_ids(), vec![GridRowId::from(2), GridRowId::from(1)]);
/// ```
#[derive(Debug)]
pub struct DataGrid {
    api: GridApi,
}

impl DataGrid {
    /// Build, register and mount a grid.
    pub fn new(props: GridProps) -> Result<Self, GridError> {
        let mut api = GridApi::with_props_normalizer(props, community_props);
        register_community_features(&mut api)?;
        api.mount()?;
        Ok(Self { api })
    }

    /// The grid API.
    pub fn api(&self) -> &GridApi {
        &self.api
    }

    /// The grid API, mutably.
    pub fn api_mut(&mut self) -> &mut GridApi {
        &mut self.api
    }

    /// Release the grid API.
    pub fn into_api(self) -> GridApi {
        self.api
    }
}

impl Deref for DataGrid {
    type Target = GridApi;

    fn deref(&self) -> &GridApi {
        &self.api
    }
}

impl DerefMut for DataGrid {
    fn deref_mut(&mut self) -> &mut GridApi {
        &mut self.api
    }
}
