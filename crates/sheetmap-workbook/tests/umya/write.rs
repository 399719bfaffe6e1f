use crate::common::{Person, people};
use chrono::NaiveDate;
use sheetmap_common::{CellValue, Color, ColumnSet, Row, Table};
use sheetmap_workbook::{ExcelReaderWriter, Locale, UmyaBackend};
use std::sync::Arc;

#[test]
fn records_round_trip_through_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.xlsx");
    let rw = ExcelReaderWriter::new(UmyaBackend::new());
    let people = people();
    rw.write_records(&path, Some(&people), true, None).unwrap();

    let rows = rw.read(&path).unwrap();
    assert_eq!(rows.columns().to_vec(), vec!["Id", "Full name", "born"]);
    let back: Vec<Person> = rw.read_records(&path).unwrap();
    assert_eq!(back, people);
}

#[test]
fn header_is_bold_and_sheet_is_named() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.xlsx");
    ExcelReaderWriter::new(UmyaBackend::new())
        .write_records(&path, Some(&people()), false, None)
        .unwrap();

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book.get_sheet_by_name("People").unwrap();
    let header = sheet.get_cell((1, 1)).unwrap();
    assert_eq!(header.get_value(), "Id");
    assert!(header.get_style().get_font().is_some_and(|f| *f.get_bold()));
    let data = sheet.get_cell((2, 2)).unwrap();
    assert_eq!(data.get_value(), "Grace Hopper");
    assert!(!data.get_style().get_font().is_some_and(|f| *f.get_bold()));
}

#[test]
fn styled_rows_and_sparse_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("styled.xlsx");
    let columns = Arc::new(ColumnSet::new(["A", "B", "C"]));
    let mut table = Table::new(columns.clone());
    let mut row = Row::new(columns).foreground(Color::RED).background(Color::YELLOW);
    row.set("A", 1.5);
    row.set("C", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    table.push(row).unwrap();
    let rw = ExcelReaderWriter::new(UmyaBackend::new());
    rw.write_table(&path, Some(&table), false, Some(&Locale::invariant()))
        .unwrap();

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book.get_sheet_by_name("sheet1").unwrap();
    let a2 = sheet.get_cell((1, 2)).unwrap();
    let color = a2.get_style().get_font().map(|f| f.get_color().get_argb().to_string());
    assert_eq!(color.as_deref(), Some("FFFF0000"));
    assert!(a2.get_style().get_background_color().is_some());

    let back = rw.read(&path).unwrap();
    assert_eq!(back[0].get("A"), Some(&CellValue::Number(1.5)));
    assert_eq!(back[0].get("B"), None);
    assert_eq!(
        back[0].get("C"),
        Some(&CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()))
    );
}

#[test]
fn text_that_looks_typed_stays_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codes.xlsx");
    let mut table = Table::new(ColumnSet::new(["Code", "Word", "2024"]));
    let mut row = table.new_row();
    row.set("Code", "007");
    row.set("Word", "TRUE");
    row.set("2024", "#N/A");
    table.push(row).unwrap();
    let rw = ExcelReaderWriter::new(UmyaBackend::new());
    rw.write_table(&path, Some(&table), false, None).unwrap();

    let back = rw.read(&path).unwrap();
    assert_eq!(back.columns().to_vec(), vec!["Code", "Word", "2024"]);
    assert_eq!(back[0].get("Code"), Some(&CellValue::Text("007".into())));
    assert_eq!(back[0].get("Word"), Some(&CellValue::Text("TRUE".into())));
    assert_eq!(back[0].get("2024"), Some(&CellValue::Text("#N/A".into())));
}

#[test]
fn legacy_target_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.xls");
    let err = ExcelReaderWriter::new(UmyaBackend::new())
        .write_records(&path, Some(&people()), false, None)
        .unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::Unsupported));
    assert!(!path.exists());
}
