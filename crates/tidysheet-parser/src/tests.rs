use crate::errors::IngestError;
use calamine::{Data, Range};

use crate::formats::{frame_from_range, infer_delimited_cell, DelimitedTextDecoder, WorkbookDecoder};
use crate::model::{format_number, CellValue, FileFormat, SheetFlavor, TabularFrame};
use crate::registry::TableDecoder;
use crate::{ingest, ShapeError};

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

#[test]
fn resolves_format_from_extension_case_insensitively() {
    assert_eq!(
        FileFormat::from_file_name("sales.CSV"),
        Some(FileFormat::DelimitedText)
    );
    assert_eq!(
        FileFormat::from_file_name("Q3 Report.Xlsx"),
        Some(FileFormat::SpreadsheetContainer(SheetFlavor::OfficeOpenXml))
    );
    assert_eq!(
        FileFormat::from_file_name("legacy.xls"),
        Some(FileFormat::SpreadsheetContainer(SheetFlavor::LegacyBinary))
    );
    assert_eq!(FileFormat::from_file_name("report.pdf"), None);
    assert_eq!(FileFormat::from_file_name("no_extension"), None);
    assert_eq!(FileFormat::from_file_name(""), None);
}

#[test]
fn unsupported_extension_is_rejected_before_decoding() {
    // Valid CSV bytes must not rescue an unrecognized name.
    let err = ingest("report.pdf", b"a,b\n1,2\n").expect_err("pdf should be rejected");
    assert!(err.is_unsupported_format());
    assert!(matches!(
        err,
        IngestError::UnsupportedFormat { ref file_name } if file_name == "report.pdf"
    ));
}

#[test]
fn parses_csv_with_typed_cells() {
    let content = "name,amount,active,note\nAlice,12.5,TRUE,  hello \nBob,7,false,\n";
    let parsed = ingest("people.csv", content.as_bytes()).expect("csv parse failed");

    assert_eq!(parsed.format, FileFormat::DelimitedText);
    assert!(parsed.format.is_delimited_text());
    assert_eq!(
        parsed.frame.column_names(),
        vec!["name", "amount", "active", "note"]
    );
    assert_eq!(parsed.frame.height(), 2);

    let first = parsed.frame.row(0).expect("first row");
    assert_eq!(first[0], &text("Alice"));
    assert_eq!(first[1], &CellValue::Number(12.5));
    assert_eq!(first[2], &CellValue::Bool(true));
    assert_eq!(first[3], &text("  hello "));

    let second = parsed.frame.row(1).expect("second row");
    assert_eq!(second[1], &CellValue::Number(7.0));
    assert_eq!(second[2], &CellValue::Bool(false));
    assert_eq!(second[3], &text(""));
}

#[test]
fn csv_short_rows_are_padded_with_missing_cells() {
    let parsed = ingest("short.csv", b"a,b,c\n1\n").expect("csv parse failed");
    let row = parsed.frame.row(0).expect("row");
    assert_eq!(row[0], &CellValue::Number(1.0));
    assert!(row[1].is_missing());
    assert!(row[2].is_missing());
}

#[test]
fn csv_wide_rows_are_rejected() {
    let err = DelimitedTextDecoder
        .decode(b"a,b\n1,2,3\n")
        .expect_err("wide row should fail");
    assert!(matches!(err, IngestError::DataRow { line_index: 2, .. }));
}

#[test]
fn csv_without_header_is_rejected() {
    let err = ingest("empty.csv", b"").expect_err("empty csv should fail");
    assert!(matches!(err, IngestError::MissingHeader { .. }));
}

#[test]
fn csv_with_invalid_utf8_is_rejected() {
    let err = ingest("latin1.csv", b"name\ncaf\xe9\n").expect_err("latin1 should fail");
    assert!(matches!(err, IngestError::InvalidEncoding { offset: 8, .. }));
}

#[test]
fn csv_byte_order_mark_is_skipped() {
    let parsed = ingest("bom.csv", b"\xEF\xBB\xBFid,value\n1,x\n").expect("bom csv");
    assert_eq!(parsed.frame.column_names(), vec!["id", "value"]);
}

#[test]
fn blank_headers_are_named_by_position() {
    let parsed = ingest("blank.csv", b"id,, \n1,2,3\n").expect("csv parse failed");
    assert_eq!(
        parsed.frame.column_names(),
        vec!["id", "Unnamed: 1", "Unnamed: 2"]
    );
}

#[test]
fn quoted_fields_keep_delimiters_and_newlines() {
    let content = "city,address\n\"Portland, OR\",\"12 Main St\nSuite 4\"\n";
    let parsed = ingest("quoted.csv", content.as_bytes()).expect("csv parse failed");
    let row = parsed.frame.row(0).expect("row");
    assert_eq!(row[0], &text("Portland, OR"));
    assert_eq!(row[1], &text("12 Main St\nSuite 4"));
}

#[test]
fn infers_numbers_on_trimmed_text_only_when_finite() {
    assert_eq!(infer_delimited_cell(" 42 "), CellValue::Number(42.0));
    assert_eq!(infer_delimited_cell("1e3"), CellValue::Number(1000.0));
    assert_eq!(infer_delimited_cell("inf"), text("inf"));
    assert_eq!(infer_delimited_cell("NaN"), text("NaN"));
    assert_eq!(infer_delimited_cell("   "), text("   "));
    assert_eq!(infer_delimited_cell("12abc"), text("12abc"));
}

#[test]
fn formats_numbers_in_round_trippable_form() {
    assert_eq!(format_number(3.0), "3");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(2.5), "2.5");
    assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(format_number(1e20), "100000000000000000000");
}

#[test]
fn malformed_xlsx_bytes_fail_to_decode() {
    let err = ingest("broken.xlsx", b"this is not a zip archive")
        .expect_err("garbage xlsx should fail");
    assert!(!err.is_unsupported_format());
    assert!(matches!(err, IngestError::Workbook { decoder: "xlsx_workbook", .. }));
}

#[test]
fn malformed_xls_bytes_fail_to_decode() {
    let err = WorkbookDecoder::new(SheetFlavor::LegacyBinary)
        .decode(b"not an ole container")
        .expect_err("garbage xls should fail");
    assert!(matches!(err, IngestError::Workbook { decoder: "xls_workbook", .. }));
}

#[test]
fn workbook_columns_left_of_the_used_range_are_kept() {
    // Used cells start at B1, so column A is entirely blank.
    let mut range: Range<Data> = Range::new((0, 1), (2, 2));
    range.set_value((0, 1), Data::String("name".to_string()));
    range.set_value((0, 2), Data::String("score".to_string()));
    range.set_value((1, 1), Data::String("Ada".to_string()));
    range.set_value((1, 2), Data::Float(91.5));
    range.set_value((2, 1), Data::String("Grace".to_string()));
    range.set_value((2, 2), Data::Int(88));

    let frame = frame_from_range(&range, "xlsx_workbook").expect("frame");

    assert_eq!(frame.column_names(), vec!["Unnamed: 0", "name", "score"]);
    assert_eq!(frame.height(), 2);
    let blank = frame.column("Unnamed: 0").expect("blank column");
    assert!(blank.cells.iter().all(CellValue::is_missing));
    let first = frame.row(0).expect("row");
    assert_eq!(first[1].as_text(), Some("Ada"));
    assert_eq!(first[2].as_number(), Some(91.5));
    assert_eq!(frame.row(1).expect("row")[2], &CellValue::Number(88.0));
}

#[test]
fn workbook_range_at_column_a_has_no_padding() {
    let mut range: Range<Data> = Range::new((0, 0), (1, 0));
    range.set_value((0, 0), Data::String("id".to_string()));
    range.set_value((1, 0), Data::Int(1));

    let frame = frame_from_range(&range, "xlsx_workbook").expect("frame");
    assert_eq!(frame.column_names(), vec!["id"]);
    assert_eq!(frame.row(0).expect("row"), vec![&CellValue::Number(1.0)]);
}

#[test]
fn frame_rejects_rows_wider_than_header() {
    let err = TabularFrame::from_rows(
        vec!["a".to_string()],
        vec![vec![text("x"), text("y")]],
    )
    .expect_err("wide row should fail");
    assert_eq!(
        err,
        ShapeError::RowTooWide {
            row_index: 0,
            expected: 1,
            found: 2
        }
    );
}

#[test]
fn retain_rows_keeps_columns_aligned() {
    let mut frame = TabularFrame::from_rows(
        vec!["a".to_string(), "b".to_string()],
        vec![
            vec![text("1"), text("one")],
            vec![text("2"), text("two")],
            vec![text("3"), text("three")],
        ],
    )
    .expect("frame");

    frame.retain_rows(&[true, false, true]);

    assert_eq!(frame.height(), 2);
    assert_eq!(frame.row(1).expect("row"), vec![&text("3"), &text("three")]);
    for column in frame.columns() {
        assert_eq!(column.cells.len(), frame.height());
    }
}
