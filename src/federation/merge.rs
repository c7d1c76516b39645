// Merge engine: relational projection and filtering applied in-process
// once all raw rows are collected from the dispatched servers.

use crate::error::FederationError;
use crate::models::{
    CompareOp, FederatedResultSet, Literal, Predicate, QueryComponents, Row, SelectList,
};
use serde_json::Value;
use std::cmp::Ordering;

/// One server's reply for one routed table, tagged with its position in the
/// route plan so concurrent dispatch reassembles deterministically.
#[derive(Debug, Clone)]
pub struct TableBatch {
    pub plan_index: usize,
    pub table: String,
    pub server: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Combine batches into one result set.
///
/// Filtering runs against the full (pre-projection) rows, so predicates may
/// reference columns the projection drops; projection is applied last. Row
/// order is plan order, then row order within each batch.
pub fn merge(
    components: &QueryComponents,
    mut batches: Vec<TableBatch>,
) -> Result<FederatedResultSet, FederationError> {
    batches.sort_by_key(|b| b.plan_index);

    let columns = output_columns(components, &batches)?;

    let mut rows = Vec::new();
    for batch in &batches {
        for row in &batch.rows {
            if let Some(predicate) = &components.predicate {
                if !eval_predicate(predicate, row) {
                    continue;
                }
            }
            rows.push(project_row(&components.select, &batch.columns, row)?);
        }
    }

    Ok(FederatedResultSet::new(columns, rows))
}

/// Wildcard keeps the union of batch schemas in first-seen order; an
/// explicit list must be covered by the merged schema.
fn output_columns(
    components: &QueryComponents,
    batches: &[TableBatch],
) -> Result<Vec<String>, FederationError> {
    let mut merged_schema: Vec<String> = Vec::new();
    for batch in batches {
        for column in &batch.columns {
            if !merged_schema.contains(column) {
                merged_schema.push(column.clone());
            }
        }
    }

    match &components.select {
        SelectList::Wildcard => Ok(merged_schema),
        SelectList::Columns(requested) => {
            for column in requested {
                if !merged_schema.contains(column) {
                    return Err(FederationError::Projection(column.clone()));
                }
            }
            Ok(requested.clone())
        }
    }
}

fn project_row(
    select: &SelectList,
    batch_columns: &[String],
    row: &Row,
) -> Result<Row, FederationError> {
    match select {
        SelectList::Wildcard => Ok(row.clone()),
        SelectList::Columns(requested) => {
            let mut projected = Row::new();
            for column in requested {
                // A requested column missing from this row's known schema
                // is an error, not a silent drop.
                if !batch_columns.iter().any(|c| c == column) {
                    return Err(FederationError::Projection(column.clone()));
                }
                let value = row.get(column).cloned().unwrap_or(Value::Null);
                projected.insert(column.clone(), value);
            }
            Ok(projected)
        }
    }
}

/// Interpret the predicate AST against one row. A column the row does not
/// have makes the comparison non-matching, never an error: rows from
/// different source tables may have heterogeneous columns.
pub fn eval_predicate(predicate: &Predicate, row: &Row) -> bool {
    match predicate {
        Predicate::And(left, right) => eval_predicate(left, row) && eval_predicate(right, row),
        Predicate::Or(left, right) => eval_predicate(left, row) || eval_predicate(right, row),
        Predicate::Compare {
            column,
            op,
            literal,
        } => match row.get(column) {
            Some(value) => compare_value(value, *op, literal),
            None => false,
        },
    }
}

fn compare_value(value: &Value, op: CompareOp, literal: &Literal) -> bool {
    let ordering = match (value, literal) {
        (Value::Null, Literal::Null) => Some(Ordering::Equal),
        (Value::Number(n), literal) => match (n.as_f64(), literal.as_f64()) {
            (Some(left), Some(right)) => left.partial_cmp(&right),
            _ => None,
        },
        (Value::String(s), Literal::Text(t)) => Some(s.as_str().cmp(t.as_str())),
        (Value::Bool(b), Literal::Bool(l)) => Some(b.cmp(l)),
        // Type mismatch: the row is non-matching, not an error.
        _ => None,
    };

    match ordering {
        None => false,
        Some(ordering) => match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        },
    }
}
