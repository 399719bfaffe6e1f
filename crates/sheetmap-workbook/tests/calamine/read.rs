use crate::common::build_workbook;
use chrono::NaiveDate;
use sheetmap_common::{CellValue, ColumnError};
use sheetmap_workbook::{
    CalamineBackend, ExcelReaderWriter, ReadStart, RowRead, UmyaBackend, WorkbookError,
};

#[test]
fn used_range_is_read_in_one_step() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((1, 1)).set_value("Id");
        sh.get_cell_mut((2, 1)).set_value("When");
        for r in 2..=4u32 {
            sh.get_cell_mut((1, r)).set_value_number(r - 1);
            let when = sh.get_cell_mut((2, r));
            when.set_value_number(45000 + r);
            when.get_style_mut()
                .get_number_format_mut()
                .set_format_code("yyyy-mm-dd");
        }
    });

    let rw = ExcelReaderWriter::new(CalamineBackend::new());
    let mut count = None;
    let rows = rw
        .read_with(
            &path,
            |r: &mut RowRead| r.take_row(),
            Some(|start: &ReadStart<'_>| count = Some(start.row_count)),
        )
        .unwrap();
    assert_eq!(count, Some(3));
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("Id"), Some(&CellValue::Int(1)));
    assert_eq!(
        rows[0].get("When"),
        Some(&CellValue::Date(NaiveDate::from_ymd_opt(2023, 3, 17).unwrap()))
    );
}

#[test]
fn cancellation_stops_the_range_walk() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((1, 1)).set_value("N");
        for r in 2..=6u32 {
            sh.get_cell_mut((1, r)).set_value_number(r);
        }
    });
    let values = ExcelReaderWriter::new(CalamineBackend::new())
        .read_with(
            &path,
            |r: &mut RowRead| {
                if r.index() == 2 {
                    r.cancel();
                }
                r.index()
            },
            None::<fn(&ReadStart<'_>)>,
        )
        .unwrap();
    assert_eq!(values, vec![0, 1]);
}

#[test]
fn duplicate_header_is_rejected() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((1, 1)).set_value("X");
        sh.get_cell_mut((2, 1)).set_value("X");
    });
    let err = ExcelReaderWriter::new(CalamineBackend::new())
        .read(&path)
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn missing_legacy_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ExcelReaderWriter::new(CalamineBackend::new())
        .read(dir.path().join("absent.xls"))
        .unwrap_err();
    assert!(matches!(err, WorkbookError::Io { .. }));
}

#[test]
fn legacy_workbook_is_read() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/people.xls");
    let rows = ExcelReaderWriter::new(CalamineBackend::new())
        .read(path)
        .unwrap();
    assert_eq!(rows.columns().to_vec(), vec!["Id", "Name"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Id"), Some(&CellValue::Int(1)));
    assert_eq!(rows[0].get("Name"), Some(&CellValue::Text("Alice".into())));
    assert_eq!(rows[1].get("Id"), Some(&CellValue::Int(2)));
    assert_eq!(rows[1].get("Name"), Some(&CellValue::Text("Bob".into())));
}

#[test]
fn grid_and_range_agree_on_an_offset_header() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((2, 1)).set_value("Id");
        sh.get_cell_mut((3, 1)).set_value("Name");
        sh.get_cell_mut((2, 2)).set_value_number(1);
        sh.get_cell_mut((3, 2)).set_value("Eve");
    });
    let blank_first = |err: WorkbookError| {
        matches!(
            err,
            WorkbookError::InvalidColumns(ColumnError::EmptyNames { ref positions }) if positions == &[1]
        )
    };
    let grid = ExcelReaderWriter::new(UmyaBackend::new()).read(&path).unwrap_err();
    let range = ExcelReaderWriter::new(CalamineBackend::new()).read(&path).unwrap_err();
    assert!(blank_first(grid));
    assert!(blank_first(range));
}

#[test]
fn grid_and_range_agree_on_rows_below_a_gap() {
    let (_dir, path) = build_workbook(|sh| {
        sh.get_cell_mut((1, 1)).set_value("N");
        sh.get_cell_mut((1, 2)).set_value_number(1);
        sh.get_cell_mut((1, 4)).set_value_number(3);
    });
    let grid = ExcelReaderWriter::new(UmyaBackend::new()).read(&path).unwrap();
    let range = ExcelReaderWriter::new(CalamineBackend::new()).read(&path).unwrap();
    assert_eq!(grid.len(), 1);
    assert_eq!(range.len(), 1);
    assert_eq!(grid[0].to_values(), range[0].to_values());
}
