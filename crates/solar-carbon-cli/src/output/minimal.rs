use serde_json::Value;

use super::cell;

/// Headline figure for each command, most specific first.
const PRIORITY_KEYS: [&str; 6] = [
    "total_revenue",
    "total",
    "carbon_credits",
    "client_share_percentage",
    "system_size_kwp",
    "portfolio_size_kwp",
];

/// Print just the headline value.
///
/// Falls back to `year: value` lines for bare year maps (prices) and to the
/// first field otherwise.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result").or_else(|| m.get("results")))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(val) = PRIORITY_KEYS
                .iter()
                .filter_map(|k| map.get(*k))
                .find(|v| !v.is_null())
            {
                println!("{}", cell(val));
                return;
            }
            if super::is_year_map(map) {
                for (year, amount) in map {
                    println!("{}: {}", year, cell(amount));
                }
                return;
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, cell(val));
            }
        }
        Value::Array(rows) => {
            // Schedule rows: year and revenue.
            for row in rows {
                let year = row.get("year").map(cell).unwrap_or_default();
                let revenue = row.get("revenue").map(cell).unwrap_or_default();
                println!("{}: {}", year, if revenue.is_empty() { "-" } else { revenue.as_str() });
            }
        }
        other => println!("{}", cell(other)),
    }
}
