use std::path::Path;

use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Guesses the provider from the file extension.
pub fn provider_from_extension(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "json" => Some("json"),
        "csv" => Some("csv"),
        "xlsx" | "xlsm" => Some("xlsx"),
        _ => None,
    }
}

/// Spreadsheets store everything as text: the flags are turned back into booleans.
pub fn text_cell_to_json(s: &str) -> JSValue {
    let t = s.trim();
    if t.eq_ignore_ascii_case("true") {
        JSValue::Bool(true)
    } else if t.eq_ignore_ascii_case("false") {
        JSValue::Bool(false)
    } else {
        JSValue::String(s.to_string())
    }
}

/// Builds a voter record out of a header row and a data row.
/// Empty cells and unnamed columns are left out.
pub fn make_record(header: &[String], cells: Vec<JSValue>) -> JSValue {
    let mut obj: JSMap<String, JSValue> = JSMap::new();
    for (name, cell) in header.iter().zip(cells) {
        if name.is_empty() || cell.is_null() {
            continue;
        }
        obj.insert(name.clone(), cell);
    }
    JSValue::Object(obj)
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}
