//! SQL text for the CRUD helpers.
//!
//! Table names, column names, and `WHERE` predicates are interpolated
//! verbatim. Only values travel as bound parameters. Callers that build
//! predicates from untrusted input are responsible for escaping them.

use tether_types::Columns;

use crate::error::Error;

fn require_table(table: &str) -> Result<(), Error> {
    if table.trim().is_empty() {
        return Err(Error::Validation("table name is empty".to_string()));
    }
    Ok(())
}

fn require_predicate(where_clause: &str) -> Result<(), Error> {
    if where_clause.trim().is_empty() {
        return Err(Error::Validation(
            "where clause is empty; pass an explicit predicate such as \"1 = 1\"".to_string(),
        ));
    }
    Ok(())
}

fn placeholders(placeholder: &str, count: usize) -> String {
    vec![placeholder; count].join(", ")
}

/// `INSERT INTO table (a, b) VALUES (?, ?)`.
pub(crate) fn insert<'a>(
    table: &str,
    fields: impl Iterator<Item = &'a str>,
    placeholder: &str,
) -> Result<String, Error> {
    require_table(table)?;
    let fields: Vec<&str> = fields.collect();
    if fields.is_empty() {
        return Err(Error::Validation(format!(
            "record for {table} has no fields"
        )));
    }
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        fields.join(", "),
        placeholders(placeholder, fields.len())
    ))
}

/// `UPDATE table SET a = ?, b = ? WHERE <predicate>`.
pub(crate) fn update<'a>(
    table: &str,
    fields: impl Iterator<Item = &'a str>,
    where_clause: &str,
    placeholder: &str,
) -> Result<String, Error> {
    require_table(table)?;
    require_predicate(where_clause)?;
    let assignments: Vec<String> = fields
        .map(|field| format!("{field} = {placeholder}"))
        .collect();
    if assignments.is_empty() {
        return Err(Error::Validation(format!(
            "update of {table} sets no fields"
        )));
    }
    Ok(format!(
        "UPDATE {table} SET {} WHERE {where_clause}",
        assignments.join(", ")
    ))
}

/// `DELETE FROM table WHERE <predicate>`.
pub(crate) fn delete(table: &str, where_clause: &str) -> Result<String, Error> {
    require_table(table)?;
    require_predicate(where_clause)?;
    Ok(format!("DELETE FROM {table} WHERE {where_clause}"))
}

/// `SELECT cols FROM table [WHERE <predicate>]`.
pub(crate) fn select(
    table: &str,
    columns: &Columns,
    where_clause: Option<&str>,
) -> Result<String, Error> {
    require_table(table)?;
    if columns.is_empty_list() {
        return Err(Error::Validation(format!(
            "select from {table} names no columns"
        )));
    }
    let mut sql = format!("SELECT {} FROM {table}", columns.to_sql());
    if let Some(predicate) = where_clause.filter(|p| !p.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(predicate);
    }
    Ok(sql)
}
