//! Pro grid assembly.

use crate::column_pinning::register_column_pinning;
use crate::infinite_loader::register_infinite_loader;
use crate::tree_data::register_tree_data;
use datagrid_core::{GridApi, GridError, GridProps, register_community_features};
use std::ops::{Deref, DerefMut};

/// Register the pro features on top of the community ones.
pub fn register_pro_features(api: &mut GridApi) -> Result<(), GridError> {
    register_community_features(api)?;
    register_column_pinning(api)?;
    register_tree_data(api)?;
    register_infinite_loader(api)?;
    Ok(())
}

/// A mounted pro grid: multi-column filtering and sorting, column pinning, tree data and
/// infinite loading.
///
/// ```rust
/// use datagrid_core::{GridColDef, GridPinnedPosition, GridProps, GridRowModel};
/// use datagrid_core_pro::{DataGridPro, GridColumnPinningApi};
///
/// let rows = vec![GridRowModel::new().with("id", 1).with("brand", "Nike").with("price", 10)];
/// let columns = vec![GridColDef::new("brand"), GridColDef::new("price")];
/// let mut grid = DataGridPro::new(GridProps::new(rows, columns)).unwrap();
///
/// grid.pin_column("price", GridPinnedPosition::Left).unwrap();
/// assert_eq!(grid.state_ref().columns.all, vec!["price", "brand"]);
/// ```
#[derive(Debug)]
pub struct DataGridPro {
    api: GridApi,
}

impl DataGridPro {
    /// Build, register and mount a grid.
    pub fn new(props: GridProps) -> Result<Self, GridError> {
        let mut api = GridApi::new(props);
        register_pro_features(&mut api)?;
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

impl Deref for DataGridPro {
    type Target = GridApi;

    fn deref(&self) -> &GridApi {
        &self.api
    }
}

impl DerefMut for DataGridPro {
    fn deref_mut(&mut self) -> &mut GridApi {
        &mut self.api
    }
}
