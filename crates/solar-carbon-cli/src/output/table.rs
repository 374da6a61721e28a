use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, is_year_map};

/// Format output as tables: scalar fields first, then one table per year
/// map (`revenue`, prices) and per list of yearly rows.
pub fn print_table(value: &Value) {
    let Value::Object(envelope) = value else {
        println!("{}", cell(value));
        return;
    };

    match (envelope.get("result"), envelope.get("results")) {
        (Some(Value::Object(result)), _) => print_result(result),
        (_, Some(Value::Array(rows))) => print_rows(rows),
        _ => print_result(envelope),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_result(result: &Map<String, Value>) {
    if is_year_map(result) {
        print_year_map("price", result);
        return;
    }

    let mut scalars = Builder::default();
    scalars.push_record(["Field", "Value"]);
    let mut nested: Vec<(&String, &Value)> = Vec::new();
    for (key, val) in result {
        match val {
            Value::Object(_) | Value::Array(_) => nested.push((key, val)),
            _ => scalars.push_record([key.as_str(), &cell(val)]),
        }
    }
    println!("{}", Table::from(scalars));

    for (key, val) in nested {
        println!("\n{}:", key);
        match val {
            Value::Object(map) if is_year_map(map) => print_year_map(key, map),
            Value::Array(rows) => print_rows(rows),
            other => println!("{}", cell(other)),
        }
    }
}

fn print_year_map(label: &str, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["year", label]);
    for (year, amount) in map {
        builder.push_record([year.as_str(), &cell(amount)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        if rows.is_empty() {
            println!("(empty)");
        }
        for row in rows {
            println!("{}", cell(row));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows.iter().filter_map(Value::as_object) {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(h.as_str()).map(cell).unwrap_or_default())
            .collect();
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}
