//! Table, column, and constraint definitions
//!
//! The relational model a snapshot captures. Constraints are a closed
//! tagged sum so validation can match exhaustively; adding a variant
//! forces every call site to be revisited.

use serde::{Deserialize, Serialize};

/// A database table definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Positive integer, unique within a schema.
    pub id: u32,
    /// Lowercase identifier matching engine naming rules.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered, non-empty. Order is part of content identity.
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

/// Column metadata for a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: u32,
    pub name: String,
    /// Engine-specific type tag (e.g. `serial`, `text`).
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ColumnConstraints>,
}

/// Per-column constraint flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl Column {
    /// Columns are nullable unless explicitly overridden.
    pub fn is_nullable(&self) -> bool {
        self.constraints
            .as_ref()
            .and_then(|c| c.nullable)
            .unwrap_or(true)
    }
}

/// Referential action taken on the referencing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

/// Primary key constraint preserving column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub id: u32,
    pub name: String,
    pub columns: Vec<String>,
}

/// Unique constraint definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub id: u32,
    pub name: String,
    pub columns: Vec<String>,
}

/// Target side of a foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    pub table: String,
    pub columns: Vec<String>,
}

/// Foreign key constraint preserving column ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    pub id: u32,
    pub name: String,
    pub columns: Vec<String>,
    pub references: ForeignKeyReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

/// Table-level constraint definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    PrimaryKey(PrimaryKey),
    ForeignKey(ForeignKey),
    Unique(UniqueConstraint),
}

impl Constraint {
    pub fn id(&self) -> u32 {
        match self {
            Constraint::PrimaryKey(pk) => pk.id,
            Constraint::ForeignKey(fk) => fk.id,
            Constraint::Unique(u) => u.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Constraint::PrimaryKey(pk) => &pk.name,
            Constraint::ForeignKey(fk) => &fk.name,
            Constraint::Unique(u) => &u.name,
        }
    }

    /// Referenced column names, in declaration order.
    pub fn columns(&self) -> &[String] {
        match self {
            Constraint::PrimaryKey(pk) => &pk.columns,
            Constraint::ForeignKey(fk) => &fk.columns,
            Constraint::Unique(u) => &u.columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_nullable_defaults_to_true() {
        let col: Column = serde_json::from_str(r#"{"id":1,"name":"email","type":"text"}"#).unwrap();
        assert!(col.is_nullable());

        let col: Column = serde_json::from_str(
            r#"{"id":1,"name":"email","type":"text","constraints":{}}"#,
        )
        .unwrap();
        assert!(col.is_nullable());

        let col: Column = serde_json::from_str(
            r#"{"id":1,"name":"email","type":"text","constraints":{"nullable":false}}"#,
        )
        .unwrap();
        assert!(!col.is_nullable());
    }

    #[test]
    fn test_constraint_tagged_roundtrip() {
        let json = r#"{
            "type": "foreign_key",
            "id": 3,
            "name": "fk_orders_user",
            "columns": ["user_id"],
            "references": {"table": "users", "columns": ["id"]},
            "on_delete": "cascade"
        }"#;
        let constraint: Constraint = serde_json::from_str(json).unwrap();
        match &constraint {
            Constraint::ForeignKey(fk) => {
                assert_eq!(fk.references.table, "users");
                assert_eq!(fk.on_delete, Some(ReferentialAction::Cascade));
                assert_eq!(fk.on_update, None);
            }
            other => panic!("expected ForeignKey, got {:?}", other),
        }
        assert_eq!(constraint.name(), "fk_orders_user");

        let value = serde_json::to_value(&constraint).unwrap();
        assert_eq!(value["type"], "foreign_key");
        assert!(value.get("on_update").is_none());
    }
}
