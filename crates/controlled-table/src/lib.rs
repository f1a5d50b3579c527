//! Controlled Table - a fully controlled, paginated, editable table model.
//!
//! The host owns the rows and the projection state. The table derives a
//! memoized page view from them, keeps one edit buffer per visible editable
//! cell, and writes accepted edits back through a single commit path that
//! records the most recent change.
//!
//! - [`RowStore`]: the host's records and the commit/regenerate protocol
//! - [`ColumnSchema`]: how each column reads, renders and writes a record
//! - [`ViewModelBuilder`]: the sorted, paginated projection
//! - [`ControlledState`]: lifts the projection state into host-owned state
//! - [`CellEditController`]: per-cell drafts and the blur-to-commit flow
//! - [`ChangeLog`]: the last applied commit
//! - [`ControlledTable`]: a host wiring all of the above
//!
//! # Example
//!
//! ```
//! use controlled_table::{ControlledTable, StateUpdate, TableConfig, TableEvent};
//!
//! fn main() -> controlled_table::Result<()> {
//!     let mut table = ControlledTable::people(TableConfig::default())?;
//!
//!     table.handle(TableEvent::State(StateUpdate::ToggleSort {
//!         column_id: "age".into(),
//!         multi: false,
//!     }));
//!
//!     let frame = table.render();
//!     assert_eq!(frame.total_rows, 8);
//!     println!("{}", table.data_json()?);
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod change_log;
pub mod column;
pub mod config;
pub mod editor;
pub mod error;
pub mod generator;
pub mod person;
pub mod record;
pub mod state;
pub mod store;
pub mod table;
pub mod value;
pub mod view_model;

/// Reactive primitives the table is built on.
pub mod reactive {
    pub use controlled_table_core::*;
}

pub use bridge::ControlledState;
pub use change_log::{ChangeLog, ChangeLogEntry};
pub use column::{
    Accessor, CellContext, CellRenderer, Column, ColumnDef, ColumnSchema, DerivedAccessor,
    FooterRenderer, HeaderContext, ValueParser,
};
pub use config::TableConfig;
pub use editor::{
    CellEditController, CellKey, CommitPayload, CommitRequest, EditBuffer, EditState,
};
pub use error::{Error, Result};
pub use generator::{DataGenerator, PersonGenerator, make_data};
pub use person::{Person, person_columns};
pub use record::Record;
pub use state::{PaginationState, SortSpec, StateUpdate, TableState, Updater};
pub use store::{CommitOutcome, IgnoreReason, RowStore, Rows};
pub use table::{
    ControlledTable, DESCRIPTION, RenderedCell, RenderedHeader, RenderedTable, TITLE, TableEvent,
};
pub use value::CellValue;
pub use view_model::{
    Cell, Header, HeaderGroup, Row, SortDirection, StateChangeHandler, TableOptions, TableView,
    ViewModelBuilder, build_view,
};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        CellKey, CellValue, ColumnDef, ColumnSchema, CommitOutcome, ControlledState,
        ControlledTable, Record, RowStore, StateUpdate, TableConfig, TableEvent, TableState,
        ViewModelBuilder,
    };
}
