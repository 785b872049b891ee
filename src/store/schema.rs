//! Reflection-free table descriptions.
//!
//! Each record type points at a `static` [`Table`]; both store backends read it to
//! generate DDL, validate column names, fill generated/default values and decode rows.

use super::Value;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    Serial,
    /// Variable-length text with an optional maximum length.
    VarChar(Option<u32>),
    /// Unbounded text.
    Text,
    /// Calendar date.
    Date,
    Boolean,
}

/// Literal default applied when an insert leaves the column out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    Bool(bool),
}

impl ColumnDefault {
    pub fn to_value(self) -> Value {
        match self {
            ColumnDefault::Bool(value) => Value::Bool(value),
        }
    }

    fn sql(self) -> String {
        match self {
            ColumnDefault::Bool(value) => value.to_string(),
        }
    }
}

impl ColumnType {
    pub fn sql(&self) -> String {
        match self {
            ColumnType::Serial => "SERIAL PRIMARY KEY".to_string(),
            ColumnType::VarChar(Some(len)) => format!("VARCHAR({})", len),
            ColumnType::VarChar(None) => "VARCHAR".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
    /// Ordinal scale for a label column: ordering uses the label's position in
    /// this list instead of its text. Labels not on the scale rank lowest.
    pub scale: Option<&'static [&'static str]>,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
            unique: false,
            default: None,
            scale: None,
        }
    }

    pub const fn serial(name: &'static str) -> Self {
        Self::new(name, ColumnType::Serial)
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn default_bool(mut self, value: bool) -> Self {
        self.default = Some(ColumnDefault::Bool(value));
        self
    }

    pub const fn ranked(mut self, scale: &'static [&'static str]) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn is_generated(&self) -> bool {
        self.ty == ColumnType::Serial
    }

    /// Position on the ordinal scale, 1-based; 0 for labels not on the scale.
    pub fn rank(&self, value: &Value) -> Option<i32> {
        let scale = self.scale?;
        let rank = match value {
            Value::Text(label) => scale
                .iter()
                .position(|candidate| *candidate == label.as_str())
                .map_or(0, |idx| idx as i32 + 1),
            _ => 0,
        };
        Some(rank)
    }

    /// Column definition as it appears inside `CREATE TABLE`.
    pub fn ddl(&self) -> String {
        let mut ddl = format!("{} {}", self.name, self.ty.sql());
        if !self.is_generated() {
            if !self.nullable {
                ddl.push_str(" NOT NULL");
            }
            if self.unique {
                ddl.push_str(" UNIQUE");
            }
            if let Some(default) = self.default {
                ddl.push_str(&format!(" DEFAULT {}", default.sql()));
            }
        }
        ddl
    }
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|column| column.name)
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(Column::ddl).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }
}
