//! The sample record shipped with the demo: a person with six fields.

use serde::{Deserialize, Serialize};

use crate::column::{ColumnDef, ColumnSchema, HeaderContext};
use crate::error::Result;
use crate::record::Record;
use crate::value::CellValue;

const FIELDS: &[&str] = &["firstName", "lastName", "age", "visits", "status", "progress"];

/// A sample record.
///
/// Fields hold [`CellValue`]s rather than concrete types because edits commit
/// raw strings: after editing `age` to `"41"`, the JSON dump shows `"41"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: CellValue,
    pub last_name: CellValue,
    pub age: CellValue,
    pub visits: CellValue,
    pub status: CellValue,
    pub progress: CellValue,
}

impl Person {
    /// Creates a person from typed values.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: u32,
        visits: u32,
        status: impl Into<String>,
        progress: u32,
    ) -> Self {
        Self {
            first_name: CellValue::Text(first_name.into()),
            last_name: CellValue::Text(last_name.into()),
            age: CellValue::from(age),
            visits: CellValue::from(visits),
            status: CellValue::Text(status.into()),
            progress: CellValue::from(progress),
        }
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut CellValue> {
        match name {
            "firstName" => Some(&mut self.first_name),
            "lastName" => Some(&mut self.last_name),
            "age" => Some(&mut self.age),
            "visits" => Some(&mut self.visits),
            "status" => Some(&mut self.status),
            "progress" => Some(&mut self.progress),
            _ => None,
        }
    }
}

impl Record for Person {
    fn field_names() -> &'static [&'static str] {
        FIELDS
    }

    fn field(&self, name: &str) -> Option<CellValue> {
        match name {
            "firstName" => Some(self.first_name.clone()),
            "lastName" => Some(self.last_name.clone()),
            "age" => Some(self.age.clone()),
            "visits" => Some(self.visits.clone()),
            "status" => Some(self.status.clone()),
            "progress" => Some(self.progress.clone()),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: CellValue) -> bool {
        match self.slot_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

fn footer(ctx: &HeaderContext<'_>) -> String {
    ctx.column_id.to_string()
}

/// The demo's column schema.
///
/// `lastName` goes through a derived accessor with an explicit id, every other
/// column reads its field directly, and every footer shows the column id.
pub fn person_columns() -> Result<ColumnSchema<Person>> {
    ColumnSchema::new(vec![
        ColumnDef::accessor_key("firstName")
            .header("First Name")
            .footer(footer),
        ColumnDef::accessor_fn(|p: &Person| p.last_name.clone())
            .id("lastName")
            .header("Last Name")
            .editable(true)
            .footer(footer),
        ColumnDef::accessor_key("age").header("Age").footer(footer),
        ColumnDef::accessor_key("visits").header("Visits").footer(footer),
        ColumnDef::accessor_key("status").header("Status").footer(footer),
        ColumnDef::accessor_key("progress")
            .header("Profile Progress")
            .footer(footer),
    ])
}
