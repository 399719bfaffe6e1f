// Shared helpers for the backend integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use sheetmap_macros::Record;
use tempfile::TempDir;

/// Build an xlsx file with umya and return its directory and path.
pub fn build_workbook(f: impl FnOnce(&mut umya_spreadsheet::Worksheet)) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.xlsx");
    let mut book = umya_spreadsheet::new_file();
    f(book.get_sheet_by_name_mut("Sheet1").unwrap());
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
    (dir, path)
}

#[derive(Debug, Clone, PartialEq, Record)]
#[record(display_name = "People")]
pub struct Person {
    #[record(display = "Id")]
    pub id: i64,
    #[record(display = "Full name")]
    pub name: String,
    pub born: Option<chrono::NaiveDate>,
}

pub fn people() -> Vec<Person> {
    vec![
        Person {
            id: 1,
            name: "Grace Hopper".into(),
            born: chrono::NaiveDate::from_ymd_opt(1906, 12, 9),
        },
        Person {
            id: 2,
            name: "Alan Turing".into(),
            born: None,
        },
    ]
}
