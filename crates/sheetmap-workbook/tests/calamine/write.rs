use crate::common::{Person, people};
use sheetmap_common::{Color, ColumnSet, Table};
use sheetmap_workbook::{CalamineBackend, ExcelReaderWriter, UmyaBackend};

#[test]
fn row_block_round_trips_through_both_backends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("block.xlsx");
    let range = ExcelReaderWriter::new(CalamineBackend::new());
    range.write_records(&path, Some(&people()), true, None).unwrap();

    let back: Vec<Person> = range.read_records(&path).unwrap();
    assert_eq!(back, people());
    let grid: Vec<Person> = ExcelReaderWriter::new(UmyaBackend::new())
        .read_records(&path)
        .unwrap();
    assert_eq!(grid, people());

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    assert!(book.get_sheet_by_name("People").is_some());
}

#[test]
fn styled_block_rows_keep_their_colors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colors.xlsx");
    let mut table = Table::new(ColumnSet::new(["Status"]));
    let mut row = table.new_row().background(Color::GREEN).bold();
    row.set("Status", "ok");
    table.push(row).unwrap();
    ExcelReaderWriter::new(CalamineBackend::new())
        .write_table(&path, Some(&table), false, None)
        .unwrap();

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book.get_sheet(&0).unwrap();
    let cell = sheet.get_cell((1, 2)).unwrap();
    assert_eq!(cell.get_value(), "ok");
    assert!(cell.get_style().get_font().is_some_and(|f| *f.get_bold()));
    assert!(cell.get_style().get_background_color().is_some());
}

#[test]
fn legacy_target_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let err = ExcelReaderWriter::new(CalamineBackend::new())
        .write_records(dir.path().join("x.xls"), Some(&people()), false, None)
        .unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::Unsupported));
}
