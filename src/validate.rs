//! Structural table validation
//!
//! A single pass over a table definition that accumulates every violation
//! found before failing, so one fix never hides the next error.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::engine::EngineRuleset;
use crate::table::{Column, Constraint, ReferentialAction, Table};

/// Upper bound on table descriptions.
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// A single validation finding.
///
/// `path` points at the offending field (e.g. `constraints[2].columns`) so
/// callers can report precisely where a table is broken.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub code: &'static str,
    pub message: String,
    pub path: String,
}

impl Issue {
    pub fn new(code: &'static str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
        }
    }

    /// Re-anchor the path under a parent object (e.g. `data.tables[0]`).
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.path = format!("{}.{}", prefix, self.path);
        self
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} (at {})", self.code, self.message, self.path)
    }
}

/// Validate the internal consistency of a single table definition.
///
/// Checks, in one pass:
/// - table id, name, and description against the engine's naming rules
/// - duplicate column ids/names
/// - duplicate constraint ids/names
/// - constraint columns exist among the table's columns
/// - primary key columns are non-nullable, at most one primary key
/// - foreign key column-count parity and `set_null` nullability rules
///
/// Cross-table targets of foreign keys are not resolved here; this is a
/// single-table contract.
pub fn validate_table(table: &Table, rules: &EngineRuleset) -> Result<(), Vec<Issue>> {
    let mut issues = Vec::new();

    if table.id == 0 {
        issues.push(Issue::new(
            "nonpositive-table-id",
            "table id must be a positive integer",
            "id",
        ));
    }

    check_identifier(&table.name, rules, "name", &mut issues);

    if let Some(description) = &table.description {
        if description.len() > MAX_DESCRIPTION_LEN {
            issues.push(Issue::new(
                "description-too-long",
                format!(
                    "description exceeds {} bytes ({} given)",
                    MAX_DESCRIPTION_LEN,
                    description.len()
                ),
                "description",
            ));
        }
    }

    if table.columns.is_empty() {
        issues.push(Issue::new(
            "empty-columns",
            "table must define at least one column",
            "columns",
        ));
    }

    // Name -> column lookup; first occurrence wins so later duplicate
    // flags do not cascade into bogus unknown-column reports.
    let mut columns_by_name: HashMap<&str, &Column> = HashMap::new();
    let mut seen_column_ids: HashSet<u32> = HashSet::new();

    for (i, column) in table.columns.iter().enumerate() {
        if !seen_column_ids.insert(column.id) {
            issues.push(Issue::new(
                "duplicate-column-id",
                format!("duplicate column id {}", column.id),
                format!("columns[{}].id", i),
            ));
        }
        if columns_by_name.contains_key(column.name.as_str()) {
            issues.push(Issue::new(
                "duplicate-column-name",
                format!("duplicate column name \"{}\"", column.name),
                format!("columns[{}].name", i),
            ));
        } else {
            columns_by_name.insert(column.name.as_str(), column);
        }
        check_identifier(&column.name, rules, &format!("columns[{}].name", i), &mut issues);
    }

    if table.constraints.is_empty() {
        return finish(issues);
    }

    let mut seen_constraint_ids: HashSet<u32> = HashSet::new();
    let mut seen_constraint_names: HashSet<&str> = HashSet::new();
    let mut primary_keys = 0usize;

    for (i, constraint) in table.constraints.iter().enumerate() {
        if !seen_constraint_ids.insert(constraint.id()) {
            issues.push(Issue::new(
                "duplicate-constraint-id",
                format!("duplicate constraint id {}", constraint.id()),
                format!("constraints[{}].id", i),
            ));
        }
        if !seen_constraint_names.insert(constraint.name()) {
            issues.push(Issue::new(
                "duplicate-constraint-name",
                format!("duplicate constraint name \"{}\"", constraint.name()),
                format!("constraints[{}].name", i),
            ));
        }

        let columns_path = format!("constraints[{}].columns", i);

        if constraint.columns().is_empty() {
            issues.push(Issue::new(
                "empty-constraint-columns",
                format!("constraint \"{}\" must reference at least one column", constraint.name()),
                columns_path.clone(),
            ));
        }

        for column_name in constraint.columns() {
            if !columns_by_name.contains_key(column_name.as_str()) {
                issues.push(Issue::new(
                    "unknown-constraint-column",
                    format!(
                        "constraint \"{}\" references non-existent column \"{}\"",
                        constraint.name(),
                        column_name
                    ),
                    columns_path.clone(),
                ));
            }
        }

        match constraint {
            Constraint::PrimaryKey(pk) => {
                primary_keys += 1;
                for column_name in &pk.columns {
                    if let Some(column) = columns_by_name.get(column_name.as_str()) {
                        if column.is_nullable() {
                            issues.push(Issue::new(
                                "nullable-primary-key-column",
                                format!(
                                    "primary key column \"{}\" must be declared non-nullable",
                                    column_name
                                ),
                                columns_path.clone(),
                            ));
                        }
                    }
                }
            }
            Constraint::ForeignKey(fk) => {
                if fk.columns.len() != fk.references.columns.len() {
                    issues.push(Issue::new(
                        "foreign-key-arity-mismatch",
                        format!(
                            "foreign key \"{}\" references {} column(s) but lists {}",
                            fk.name,
                            fk.references.columns.len(),
                            fk.columns.len()
                        ),
                        columns_path.clone(),
                    ));
                }
                check_set_null(fk.on_delete, &fk.columns, &columns_by_name, i, "on_delete", &mut issues);
                check_set_null(fk.on_update, &fk.columns, &columns_by_name, i, "on_update", &mut issues);
            }
            Constraint::Unique(_) => {}
        }
    }

    if primary_keys > 1 {
        issues.push(Issue::new(
            "multiple-primary-keys",
            format!(
                "at most one primary key constraint is allowed, found {}",
                primary_keys
            ),
            "constraints",
        ));
    }

    finish(issues)
}

fn finish(issues: Vec<Issue>) -> Result<(), Vec<Issue>> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_identifier(name: &str, rules: &EngineRuleset, path: &str, issues: &mut Vec<Issue>) {
    if !is_valid_identifier(name) {
        issues.push(Issue::new(
            "invalid-identifier",
            format!(
                "\"{}\" is not a valid lowercase identifier ([a-z_][a-z0-9_]*)",
                name
            ),
            path.to_string(),
        ));
    }
    if name.len() > rules.max_identifier_len {
        issues.push(Issue::new(
            "identifier-too-long",
            format!(
                "identifier \"{}\" exceeds the engine limit of {} bytes",
                name, rules.max_identifier_len
            ),
            path.to_string(),
        ));
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// A `set_null` action is only coherent when every referencing column can
/// actually hold NULL.
fn check_set_null(
    action: Option<ReferentialAction>,
    local_columns: &[String],
    columns_by_name: &HashMap<&str, &Column>,
    index: usize,
    field: &str,
    issues: &mut Vec<Issue>,
) {
    if action != Some(ReferentialAction::SetNull) {
        return;
    }
    for column_name in local_columns {
        if let Some(column) = columns_by_name.get(column_name.as_str()) {
            if !column.is_nullable() {
                issues.push(Issue::new(
                    "set-null-requires-nullable",
                    format!(
                        "{} action set_null requires column \"{}\" to be nullable",
                        field, column_name
                    ),
                    format!("constraints[{}].{}", index, field),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineKey;
    use crate::table::{ColumnConstraints, ForeignKey, ForeignKeyReference, PrimaryKey, UniqueConstraint};

    fn rules() -> &'static EngineRuleset {
        "postgresql:v15.0".parse::<EngineKey>().unwrap().ruleset().unwrap()
    }

    fn column(id: u32, name: &str, nullable: Option<bool>) -> Column {
        Column {
            id,
            name: name.to_string(),
            column_type: "text".to_string(),
            constraints: nullable.map(|n| ColumnConstraints { nullable: Some(n) }),
        }
    }

    fn table(columns: Vec<Column>, constraints: Vec<Constraint>) -> Table {
        Table {
            id: 1,
            name: "users".to_string(),
            description: None,
            columns,
            constraints,
        }
    }

    #[test]
    fn test_valid_table_without_constraints() {
        let t = table(vec![column(1, "id", Some(false))], vec![]);
        assert!(validate_table(&t, rules()).is_ok());
    }

    #[test]
    fn test_empty_columns_rejected() {
        let t = table(vec![], vec![]);
        let issues = validate_table(&t, rules()).unwrap_err();
        assert!(issues.iter().any(|i| i.code == "empty-columns"));
    }

    #[test]
    fn test_duplicate_column_name_scenario() {
        // {id:1, name:"users", columns:[{id:1,name:"id",serial,nullable:false},{id:2,name:"id",text}]}
        let t = table(
            vec![column(1, "id", Some(false)), column(2, "id", None)],
            vec![],
        );
        let issues = validate_table(&t, rules()).unwrap_err();
        let dup: Vec<_> = issues.iter().filter(|i| i.code == "duplicate-column-name").collect();
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].path, "columns[1].name");
    }

    #[test]
    fn test_duplicate_column_id_flagged() {
        let t = table(vec![column(1, "a", None), column(1, "b", None)], vec![]);
        let issues = validate_table(&t, rules()).unwrap_err();
        assert!(issues.iter().any(|i| i.code == "duplicate-column-id"));
    }

    #[test]
    fn test_primary_key_requires_non_nullable() {
        // Default nullability counts as a violation too.
        for nullable in [None, Some(true)] {
            let t = table(
                vec![column(1, "id", nullable)],
                vec![Constraint::PrimaryKey(PrimaryKey {
                    id: 1,
                    name: "pk_users".to_string(),
                    columns: vec!["id".to_string()],
                })],
            );
            let issues = validate_table(&t, rules()).unwrap_err();
            assert!(issues.iter().any(|i| i.code == "nullable-primary-key-column"));
            assert!(issues.iter().any(|i| i.path == "constraints[0].columns"));
        }
    }

    #[test]
    fn test_at_most_one_primary_key() {
        let t = table(
            vec![column(1, "a", Some(false)), column(2, "b", Some(false))],
            vec![
                Constraint::PrimaryKey(PrimaryKey {
                    id: 1,
                    name: "pk_a".to_string(),
                    columns: vec!["a".to_string()],
                }),
                Constraint::PrimaryKey(PrimaryKey {
                    id: 2,
                    name: "pk_b".to_string(),
                    columns: vec!["b".to_string()],
                }),
            ],
        );
        let issues = validate_table(&t, rules()).unwrap_err();
        let multi: Vec<_> = issues.iter().filter(|i| i.code == "multiple-primary-keys").collect();
        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].path, "constraints");
    }

    #[test]
    fn test_unknown_constraint_column() {
        let t = table(
            vec![column(1, "id", Some(false))],
            vec![Constraint::Unique(UniqueConstraint {
                id: 1,
                name: "uq_email".to_string(),
                columns: vec!["email".to_string()],
            })],
        );
        let issues = validate_table(&t, rules()).unwrap_err();
        let unknown: Vec<_> = issues.iter().filter(|i| i.code == "unknown-constraint-column").collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].path, "constraints[0].columns");
        assert!(unknown[0].message.contains("email"));
    }

    #[test]
    fn test_foreign_key_arity_mismatch_rejected() {
        let t = table(
            vec![column(1, "user_id", Some(false))],
            vec![Constraint::ForeignKey(ForeignKey {
                id: 1,
                name: "fk_user".to_string(),
                columns: vec!["user_id".to_string()],
                references: ForeignKeyReference {
                    table: "users".to_string(),
                    columns: vec!["id".to_string(), "tenant_id".to_string()],
                },
                on_delete: None,
                on_update: None,
            })],
        );
        let issues = validate_table(&t, rules()).unwrap_err();
        assert!(issues.iter().any(|i| i.code == "foreign-key-arity-mismatch"));
    }

    #[test]
    fn test_set_null_requires_nullable_columns() {
        let t = table(
            vec![column(1, "user_id", Some(false))],
            vec![Constraint::ForeignKey(ForeignKey {
                id: 1,
                name: "fk_user".to_string(),
                columns: vec!["user_id".to_string()],
                references: ForeignKeyReference {
                    table: "users".to_string(),
                    columns: vec!["id".to_string()],
                },
                on_delete: Some(ReferentialAction::SetNull),
                on_update: Some(ReferentialAction::SetNull),
            })],
        );
        let issues = validate_table(&t, rules()).unwrap_err();
        assert!(issues.iter().any(|i| i.path == "constraints[0].on_delete"));
        assert!(issues.iter().any(|i| i.path == "constraints[0].on_update"));
    }

    #[test]
    fn test_all_issues_accumulated_in_one_pass() {
        // Broken in four independent ways; every one must surface at once.
        let t = Table {
            id: 0,
            name: "Users".to_string(),
            description: None,
            columns: vec![column(1, "id", None), column(1, "id", None)],
            constraints: vec![Constraint::PrimaryKey(PrimaryKey {
                id: 1,
                name: "pk".to_string(),
                columns: vec!["missing".to_string()],
            })],
        };
        let issues = validate_table(&t, rules()).unwrap_err();
        let codes: Vec<_> = issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&"nonpositive-table-id"));
        assert!(codes.contains(&"invalid-identifier"));
        assert!(codes.contains(&"duplicate-column-id"));
        assert!(codes.contains(&"duplicate-column-name"));
        assert!(codes.contains(&"unknown-constraint-column"));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_valid_identifier("users"));
        assert!(is_valid_identifier("_audit_log2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("Users"));
        assert!(!is_valid_identifier("2fa_codes"));
        assert!(!is_valid_identifier("user-events"));
    }
}
