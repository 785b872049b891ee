//! Field-projection views of records.
//!
//! A [`View`] is a plain value: an ordered allow-list of fields plus an exclusion list.
//! [`View::dump`] projects any [`Record`] onto exactly those fields, in that order.

use serde_json::{Map, Value as Json};

use crate::store::{Record, Value};

#[derive(Debug, Clone, Copy)]
pub struct View {
    /// Fields to emit, in order; empty means every column in table order.
    fields: &'static [&'static str],
    exclude: &'static [&'static str],
}

pub const CARD_VIEW: View = View::new(&["id", "title", "description", "date", "status", "priority"]);

pub const USER_VIEW: View =
    View::new(&["id", "name", "email", "password", "is_admin"]).excluding(&["password"]);

impl View {
    pub const fn new(fields: &'static [&'static str]) -> Self {
        Self { fields, exclude: &[] }
    }

    pub const fn all() -> Self {
        Self::new(&[])
    }

    pub const fn excluding(self, exclude: &'static [&'static str]) -> Self {
        Self {
            fields: self.fields,
            exclude,
        }
    }

    pub fn dump<R: Record>(&self, record: &R) -> Map<String, Json> {
        let row = record.to_row();
        let names: Vec<&str> = if self.fields.is_empty() {
            row.table().column_names().collect()
        } else {
            self.fields.to_vec()
        };

        let mut out = Map::new();
        for name in names {
            if self.exclude.contains(&name) {
                continue;
            }
            if let Some(value) = row.get(name) {
                out.insert(name.to_string(), to_json(value));
            }
        }
        out
    }

    pub fn dump_many<R: Record>(&self, records: &[R]) -> Json {
        Json::Array(records.iter().map(|record| Json::Object(self.dump(record))).collect())
    }
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Integer(v) => Json::from(*v),
        Value::Text(v) => Json::String(v.clone()),
        Value::Date(v) => Json::String(v.format("%Y-%m-%d").to_string()),
        Value::Bool(v) => Json::Bool(*v),
    }
}
