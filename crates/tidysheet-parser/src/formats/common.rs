use crate::model::CellValue;

/// Column name for a header cell; blank headers become `Unnamed: <index>`.
pub(crate) fn header_name(index: usize, raw: &str) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {index}")
    } else {
        raw.to_string()
    }
}

/// Type a delimited-text field. Numbers and booleans are recognized on the trimmed
/// text; anything else keeps its original spelling.
pub(crate) fn infer_delimited_cell(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::Text(String::new());
    }

    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => CellValue::Number(value),
        _ => CellValue::Text(raw.to_string()),
    }
}
