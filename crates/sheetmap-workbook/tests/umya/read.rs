use crate::common::build_workbook;
use chrono::NaiveDate;
use sheetmap_common::{CellValue, ColumnError};
use sheetmap_workbook::{ExcelReaderWriter, RowRead, UmyaBackend, WorkbookConfig, WorkbookError};

type NoHeader = fn(&sheetmap_workbook::ReadStart<'_>);

#[test]
fn reads_typed_cells() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((1, 1)).set_value("Id");
        sh.get_cell_mut((2, 1)).set_value("Name");
        sh.get_cell_mut((3, 1)).set_value("Active");
        sh.get_cell_mut((4, 1)).set_value("Since");
        sh.get_cell_mut((1, 2)).set_value_number(1);
        sh.get_cell_mut((2, 2)).set_value("Alice");
        sh.get_cell_mut((3, 2)).set_value_bool(true);
        let since = sh.get_cell_mut((4, 2));
        since.set_value_number(45000);
        since
            .get_style_mut()
            .get_number_format_mut()
            .set_format_code("yyyy-mm-dd");
    });

    let rows = ExcelReaderWriter::new(UmyaBackend::new()).read(&path).unwrap();
    assert_eq!(rows.columns().to_vec(), vec!["Id", "Name", "Active", "Since"]);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get("Id"), Some(&CellValue::Int(1)));
    assert_eq!(row.get("Name"), Some(&CellValue::Text("Alice".into())));
    assert_eq!(row.get("Active"), Some(&CellValue::Boolean(true)));
    assert_eq!(
        row.get("Since"),
        Some(&CellValue::Date(NaiveDate::from_ymd_opt(2023, 3, 15).unwrap()))
    );
}

#[test]
fn empty_row_ends_the_data() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((1, 1)).set_value("N");
        sh.get_cell_mut((1, 2)).set_value_number(1);
        sh.get_cell_mut((1, 4)).set_value_number(3);
    });
    let rows = ExcelReaderWriter::new(UmyaBackend::new()).read(&path).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn absent_cells_are_not_stored() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((1, 1)).set_value("A");
        sh.get_cell_mut((2, 1)).set_value("B");
        sh.get_cell_mut((2, 2)).set_value("b");
        sh.get_cell_mut((3, 2)).set_value("stray");
    });
    let rows = ExcelReaderWriter::new(UmyaBackend::new()).read(&path).unwrap();
    assert_eq!(rows.columns().len(), 2);
    assert_eq!(rows[0].get("A"), None);
    assert_eq!(rows[0].len(), 1);
}

#[test]
fn blank_header_in_file_is_rejected() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((1, 1)).set_value("A");
        sh.get_cell_mut((3, 1)).set_value("C");
        sh.get_cell_mut((1, 2)).set_value("x");
    });
    let mut calls = 0;
    let err = ExcelReaderWriter::new(UmyaBackend::new())
        .read_with(&path, |_: &mut RowRead| calls += 1, None::<NoHeader>)
        .unwrap_err();
    assert!(matches!(
        err,
        WorkbookError::InvalidColumns(ColumnError::EmptyNames { ref positions }) if positions == &[2]
    ));
    assert_eq!(calls, 0);
}

#[test]
fn reads_the_configured_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two.xlsx");
    let mut book = umya_spreadsheet::new_file();
    book.new_sheet("Second").unwrap();
    book.get_sheet_by_name_mut("Second")
        .unwrap()
        .get_cell_mut((1, 1))
        .set_value("Only");
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

    let config = WorkbookConfig::default().with_sheet_index(1);
    let rows = ExcelReaderWriter::with_config(UmyaBackend::new(), config)
        .read(&path)
        .unwrap();
    assert_eq!(rows.columns().to_vec(), vec!["Only"]);

    let config = WorkbookConfig::default().with_sheet_index(5);
    let err = ExcelReaderWriter::with_config(UmyaBackend::new(), config)
        .read(&path)
        .unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
}

#[test]
fn missing_and_legacy_files_are_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let rw = ExcelReaderWriter::new(UmyaBackend::new());

    let err = rw.read(dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, WorkbookError::Io { .. }));
    assert!(!err.is_validation());

    let err = rw.read(dir.path().join("legacy.xls")).unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::Unsupported));
}
