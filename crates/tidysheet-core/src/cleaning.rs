//! Ordered, total cleaning steps applied to an ingested frame.
//!
//! 1. drop duplicate rows (trim-aware comparison, first occurrence wins)
//! 2. trim and title-case headers, suffixing collisions
//! 3. trim text cells
//! 4. drop rows whose cells are all blank
//! 5. replace missing cells with empty text

use std::collections::HashSet;

use serde::Serialize;
use tidysheet_parser::{CellValue, TabularFrame};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleaningSummary {
    pub row_count: usize,
    pub column_count: usize,
}

impl CleaningSummary {
    pub fn of(frame: &TabularFrame) -> Self {
        Self {
            row_count: frame.height(),
            column_count: frame.width(),
        }
    }
}

/// Run every cleaning step in order. Never fails and is idempotent.
pub fn clean(mut frame: TabularFrame) -> TabularFrame {
    let input_rows = frame.height();

    let duplicates = drop_duplicate_rows(&mut frame);
    normalize_headers(&mut frame);
    trim_text_cells(&mut frame);
    let blanks = drop_blank_rows(&mut frame);
    fill_missing(&mut frame);

    debug!(
        input_rows,
        duplicates,
        blanks,
        output_rows = frame.height(),
        "cleaned frame"
    );
    frame
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CellKey {
    Blank,
    Text(String),
    Number(u64),
    Bool(bool),
}

impl CellKey {
    fn of(cell: &CellValue) -> Self {
        match cell {
            CellValue::Empty => CellKey::Blank,
            CellValue::Text(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    CellKey::Blank
                } else {
                    CellKey::Text(trimmed.to_string())
                }
            }
            // -0.0 and 0.0 compare equal, so they must share a key.
            CellValue::Number(value) if *value == 0.0 => CellKey::Number(0.0f64.to_bits()),
            CellValue::Number(value) => CellKey::Number(value.to_bits()),
            CellValue::Bool(value) => CellKey::Bool(*value),
        }
    }
}

/// Returns the number of rows removed.
pub fn drop_duplicate_rows(frame: &mut TabularFrame) -> usize {
    let mut seen = HashSet::with_capacity(frame.height());
    let mask: Vec<bool> = frame
        .rows()
        .map(|row| seen.insert(row.into_iter().map(CellKey::of).collect::<Vec<_>>()))
        .collect();
    let removed = mask.iter().filter(|keep| !**keep).count();
    if removed > 0 {
        frame.retain_rows(&mask);
    }
    removed
}

/// Trim and title-case every header, then make the names unique.
pub fn normalize_headers(frame: &mut TabularFrame) {
    let mut used = HashSet::new();
    for (index, name) in frame.column_names_mut().enumerate() {
        let mut base = title_case(name.trim());
        if base.is_empty() {
            base = format!("Unnamed: {index}");
        }
        let unique = disambiguate(&base, &used);
        used.insert(unique.clone());
        *name = unique;
    }
}

/// Lowest free numeric suffix starting at 2: `Total`, `Total 2`, `Total 3`.
fn disambiguate(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (2usize..)
        .map(|suffix| format!("{base} {suffix}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Upper-case a letter that follows a non-letter, lower-case every other letter.
/// Letters whose upper case spans several chars keep only the first one upper.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                result.extend(ch.to_lowercase());
            } else {
                // Only the leading char of a multi-char upper case is kept upper: ß -> Ss.
                let mut upper = ch.to_uppercase();
                result.extend(upper.next());
                for rest in upper {
                    result.extend(rest.to_lowercase());
                }
            }
            previous_is_letter = true;
        } else {
            result.push(ch);
            previous_is_letter = false;
        }
    }
    result
}

pub fn trim_text_cells(frame: &mut TabularFrame) {
    for cell in frame.cells_mut() {
        if let CellValue::Text(value) = cell {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
            }
        }
    }
}

/// Returns the number of rows removed.
pub fn drop_blank_rows(frame: &mut TabularFrame) -> usize {
    let mask: Vec<bool> = frame
        .rows()
        .map(|row| !row.iter().all(|cell| cell.is_blank()))
        .collect();
    let removed = mask.iter().filter(|keep| !**keep).count();
    if removed > 0 {
        frame.retain_rows(&mask);
    }
    removed
}

pub fn fill_missing(frame: &mut TabularFrame) {
    for cell in frame.cells_mut() {
        if cell.is_missing() {
            *cell = CellValue::Text(String::new());
        }
    }
}
