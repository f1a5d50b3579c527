//! Column schema.
//!
//! A [`ColumnDef`] describes how to read, label, render and edit one column of
//! a record type. [`ColumnSchema::new`] resolves every definition into a
//! [`Column`] with a unique id, failing fast on definitions that cannot be
//! resolved. The schema never depends on the row store's contents.
//!
//! # Example
//!
//! ```
//! use controlled_table::{ColumnDef, ColumnSchema, Person};
//!
//! let schema = ColumnSchema::<Person>::new(vec![
//!     ColumnDef::accessor_key("firstName").header("First Name"),
//!     ColumnDef::accessor_fn(|p: &Person| p.last_name.clone())
//!         .id("lastName")
//!         .header("Last Name")
//!         .editable(true),
//! ])
//! .unwrap();
//!
//! assert_eq!(schema.ids(), vec!["firstName", "lastName"]);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use controlled_table_core::logging::targets;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::value::CellValue;

/// Type alias for a derived accessor function.
pub type DerivedAccessor<R> = Arc<dyn Fn(&R) -> CellValue + Send + Sync>;

/// Type alias for a raw-input parser.
pub type ValueParser = Arc<dyn Fn(&str) -> CellValue + Send + Sync>;

/// Type alias for a footer renderer.
pub type FooterRenderer = Arc<dyn Fn(&HeaderContext<'_>) -> String + Send + Sync>;

/// Type alias for a cell renderer override.
pub type CellRenderer = Arc<dyn Fn(&CellContext<'_>) -> String + Send + Sync>;

/// What a header or footer renderer gets to see.
#[derive(Debug, Clone, Copy)]
pub struct HeaderContext<'a> {
    /// The resolved column id.
    pub column_id: &'a str,
    /// The column's header label.
    pub label: &'a str,
}

/// What a cell renderer gets to see.
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    /// Position of the record in the row store.
    pub row_index: usize,
    /// The resolved column id.
    pub column_id: &'a str,
    /// The committed value of the cell.
    pub value: &'a CellValue,
}

/// How a column reads its value from a record.
pub enum Accessor<R> {
    /// Reads a named field. The field name doubles as the column id.
    Key(String),
    /// Computes the value from the whole record.
    Derived(DerivedAccessor<R>),
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Key(key) => Accessor::Key(key.clone()),
            Accessor::Derived(f) => Accessor::Derived(f.clone()),
        }
    }
}

impl<R> fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Accessor::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// An unresolved column definition.
pub struct ColumnDef<R> {
    accessor: Accessor<R>,
    id: Option<String>,
    header: String,
    footer: Option<FooterRenderer>,
    cell: Option<CellRenderer>,
    editable: Option<bool>,
    parser: Option<ValueParser>,
}

impl<R: Record> ColumnDef<R> {
    fn with_accessor(accessor: Accessor<R>) -> Self {
        Self {
            accessor,
            id: None,
            header: String::new(),
            footer: None,
            cell: None,
            editable: None,
            parser: None,
        }
    }

    /// A column reading the record field `key`.
    pub fn accessor_key(key: impl Into<String>) -> Self {
        Self::with_accessor(Accessor::Key(key.into()))
    }

    /// A column computing its value from the record. Requires [`ColumnDef::id`].
    pub fn accessor_fn<F>(accessor: F) -> Self
    where
        F: Fn(&R) -> CellValue + Send + Sync + 'static,
    {
        Self::with_accessor(Accessor::Derived(Arc::new(accessor)))
    }

    /// Sets an explicit column id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the header label.
    pub fn header(mut self, label: impl Into<String>) -> Self {
        self.header = label.into();
        self
    }

    /// Sets a footer renderer.
    pub fn footer<F>(mut self, render: F) -> Self
    where
        F: Fn(&HeaderContext<'_>) -> String + Send + Sync + 'static,
    {
        self.footer = Some(Arc::new(render));
        self
    }

    /// Overrides how the committed value is displayed.
    ///
    /// A column with a cell renderer shows the rendered text instead of an
    /// editor, so it defaults to read-only.
    pub fn cell<F>(mut self, render: F) -> Self
    where
        F: Fn(&CellContext<'_>) -> String + Send + Sync + 'static,
    {
        self.cell = Some(Arc::new(render));
        self
    }

    /// Marks the column editable or read-only.
    ///
    /// Key columns default to editable; derived columns and columns with a
    /// cell renderer default to read-only. An editable derived column commits
    /// into the record field named by its id. An editable column with a cell
    /// renderer shows the rendered text until the user types into it.
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    /// Sets the parser that turns raw editor input into a committed value.
    ///
    /// Without one, input is committed as text.
    pub fn parser<F>(mut self, parse: F) -> Self
    where
        F: Fn(&str) -> CellValue + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parse));
        self
    }

    /// The id this definition resolves to, if it resolves at all.
    pub fn resolved_id(&self) -> Option<&str> {
        match (&self.id, &self.accessor) {
            (Some(id), _) => Some(id.as_str()),
            (None, Accessor::Key(key)) => Some(key.as_str()),
            (None, Accessor::Derived(_)) => None,
        }
    }
}

/// A resolved column.
pub struct Column<R> {
    id: String,
    index: usize,
    header: String,
    accessor: Accessor<R>,
    footer: Option<FooterRenderer>,
    cell: Option<CellRenderer>,
    editable: bool,
    parser: Option<ValueParser>,
}

impl<R: Record> Column<R> {
    /// The unique column id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Position of the column in the schema.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The header label.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Whether cells of this column accept edits.
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Whether the column uses a derived accessor.
    pub fn is_derived(&self) -> bool {
        matches!(self.accessor, Accessor::Derived(_))
    }

    /// The record field a commit on this column writes to.
    pub fn field_key(&self) -> &str {
        match &self.accessor {
            Accessor::Key(key) => key,
            Accessor::Derived(_) => &self.id,
        }
    }

    /// Reads this column's value from a record.
    pub fn value(&self, record: &R) -> CellValue {
        match &self.accessor {
            Accessor::Key(key) => record.field(key).unwrap_or_default(),
            Accessor::Derived(f) => f(record),
        }
    }

    fn header_context(&self) -> HeaderContext<'_> {
        HeaderContext {
            column_id: &self.id,
            label: &self.header,
        }
    }

    /// Display content for the footer cell, if the column has a footer.
    pub fn render_footer(&self) -> Option<String> {
        self.footer.as_ref().map(|render| render(&self.header_context()))
    }

    /// Display content for a body cell.
    pub fn render_cell(&self, row_index: usize, value: &CellValue) -> String {
        match &self.cell {
            Some(render) => render(&CellContext {
                row_index,
                column_id: &self.id,
                value,
            }),
            None => value.to_string(),
        }
    }

    /// Converts raw editor input into the value to commit.
    pub fn parse(&self, raw: &str) -> CellValue {
        match &self.parser {
            Some(parse) => parse(raw),
            None => CellValue::from_input(raw),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("header", &self.header)
            .field("accessor", &self.accessor)
            .field("editable", &self.editable)
            .finish()
    }
}

/// An ordered list of resolved columns with unique ids.
pub struct ColumnSchema<R> {
    columns: Vec<Column<R>>,
}

impl<R: Record> ColumnSchema<R> {
    /// Resolves column definitions.
    ///
    /// Fails when the schema is empty, a derived column has no id, two columns
    /// share an id, or a column reads or writes a field the record lacks.
    pub fn new(defs: Vec<ColumnDef<R>>) -> Result<Self> {
        Self::resolve(defs).inspect_err(|err| {
            tracing::warn!(target: targets::SCHEMA, error = %err, "column schema rejected");
        })
    }

    fn resolve(defs: Vec<ColumnDef<R>>) -> Result<Self> {
        if defs.is_empty() {
            return Err(Error::EmptySchema);
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(defs.len());

        for (index, def) in defs.into_iter().enumerate() {
            let id = def
                .resolved_id()
                .map(str::to_string)
                .ok_or_else(|| Error::missing_column_id(&def.header))?;

            if !seen.insert(id.clone()) {
                return Err(Error::duplicate_column_id(id));
            }

            let editable = def
                .editable
                .unwrap_or(matches!(def.accessor, Accessor::Key(_)) && def.cell.is_none());

            match &def.accessor {
                Accessor::Key(key) if !R::has_field(key) => {
                    return Err(Error::unknown_field(id, key.clone()));
                }
                Accessor::Derived(_) if editable && !R::has_field(&id) => {
                    return Err(Error::unknown_field(id.clone(), id));
                }
                _ => {}
            }

            columns.push(Column {
                id,
                index,
                header: def.header,
                accessor: def.accessor,
                footer: def.footer,
                cell: def.cell,
                editable,
                parser: def.parser,
            });
        }

        tracing::debug!(target: targets::SCHEMA, columns = columns.len(), "column schema resolved");
        Ok(Self { columns })
    }

    /// All columns in schema order.
    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    /// Iterates columns in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &Column<R>> {
        self.columns.iter()
    }

    /// Looks up a column by id.
    pub fn column(&self, id: &str) -> Option<&Column<R>> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Returns `true` if a column with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.column(id).is_some()
    }

    /// Column ids in schema order.
    pub fn ids(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.id.as_str()).collect()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false` for a resolved schema; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<R> fmt::Debug for ColumnSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.columns.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::{Person, person_columns};

    #[test]
    fn test_key_column_infers_id() {
        let schema =
            ColumnSchema::<Person>::new(vec![ColumnDef::accessor_key("age").header("Age")]).unwrap();

        let column = schema.column("age").unwrap();
        assert_eq!(column.header(), "Age");
        assert!(column.is_editable());
        assert!(!column.is_derived());
        assert_eq!(column.field_key(), "age");
    }

    #[test]
    fn test_derived_column_requires_id() {
        let err = ColumnSchema::<Person>::new(vec![
            ColumnDef::accessor_fn(|p: &Person| p.last_name.clone()).header("Last Name"),
        ])
        .unwrap_err();

        assert!(matches!(err, Error::MissingColumnId { ref header } if header == "Last Name"));
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_derived_column_defaults_read_only() {
        let schema = ColumnSchema::<Person>::new(vec![
            ColumnDef::accessor_fn(|p: &Person| {
                CellValue::from(format!("{} {}", p.first_name, p.last_name))
            })
            .id("fullName")
            .header("Full Name"),
        ])
        .unwrap();

        let column = schema.column("fullName").unwrap();
        assert!(column.is_derived());
        assert!(!column.is_editable());

        let ann = Person::new("Ann", "Lee", 30, 10, "single", 50);
        assert_eq!(column.value(&ann), CellValue::from("Ann Lee"));
    }

    #[test]
    fn test_editable_derived_column_must_name_a_field() {
        let err = ColumnSchema::<Person>::new(vec![
            ColumnDef::accessor_fn(|p: &Person| p.last_name.clone())
                .id("surname")
                .editable(true),
        ])
        .unwrap_err();

        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn test_duplicate_and_unknown_ids_rejected() {
        let err = ColumnSchema::<Person>::new(vec![
            ColumnDef::accessor_key("age"),
            ColumnDef::accessor_fn(|p: &Person| p.age.clone()).id("age"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateColumnId { ref id } if id == "age"));

        let err = ColumnSchema::<Person>::new(vec![ColumnDef::accessor_key("height")]).unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));

        assert!(matches!(
            ColumnSchema::<Person>::new(Vec::new()),
            Err(Error::EmptySchema)
        ));
    }

    #[test]
    fn test_renderers_and_parser() {
        let schema = ColumnSchema::<Person>::new(vec![
            ColumnDef::accessor_key("progress")
                .header("Profile Progress")
                .footer(|ctx| ctx.column_id.to_string())
                .cell(|ctx| format!("{}%", ctx.value))
                .parser(CellValue::parse_number),
        ])
        .unwrap();

        let column = schema.column("progress").unwrap();
        assert!(!column.is_editable());
        assert_eq!(column.render_footer().as_deref(), Some("progress"));
        assert_eq!(column.render_cell(0, &CellValue::from(42)), "42%");
        assert_eq!(column.parse("17"), CellValue::Int(17));
    }

    #[test]
    fn test_person_columns_resolve() {
        let schema = person_columns().unwrap();
        assert_eq!(
            schema.ids(),
            vec!["firstName", "lastName", "age", "visits", "status", "progress"]
        );
        assert!(schema.iter().all(|c| c.is_editable()));
        assert_eq!(schema.column("lastName").map(|c| c.is_derived()), Some(true));
    }
}
