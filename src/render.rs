// Plain-text table rendering of a result set. A consumer contract for
// front ends, not part of federation correctness.

use crate::models::FederatedResultSet;
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::Value;

/// Render the result set as a table using comfy-table.
pub fn format_table(result: &FederatedResultSet) -> String {
    if result.columns.is_empty() {
        return "(no columns)\n".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(result.columns.clone());

    for row in &result.rows {
        let cells: Vec<String> = result
            .columns
            .iter()
            .map(|column| render_value(row.get(column)))
            .collect();
        table.add_row(cells);
    }

    let mut out = table.to_string();
    out.push('\n');
    out
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
