use std::ops::{Deref, DerefMut};
use std::path::Path;

use sheetmap_common::{CellValue, Color, Row, Table};

use crate::config::Locale;
use crate::error::Result;
use crate::style::{StyleCache, StyleKey};
use crate::traits::{PlannedCell, SheetSink};

/// The value → cell policy, in fixed precedence: numbers, dates, booleans,
/// blanks, then text.
pub fn plan_cell(value: Option<&CellValue>, locale: &Locale) -> PlannedCell {
    match value {
        Some(CellValue::Int(i)) => PlannedCell::Number(*i as f64),
        Some(CellValue::Number(n)) => PlannedCell::Number(*n),
        Some(v @ CellValue::Date(_)) => PlannedCell::Date {
            serial: v.as_serial_number().unwrap_or_default(),
            format: locale.date_format.clone(),
        },
        Some(v @ CellValue::DateTime(_)) => PlannedCell::Date {
            serial: v.as_serial_number().unwrap_or_default(),
            format: locale.datetime_format.clone(),
        },
        Some(CellValue::Boolean(b)) => PlannedCell::Boolean(*b),
        None | Some(CellValue::Empty) => PlannedCell::Blank,
        Some(other) => PlannedCell::Text(locale.format_text(other)),
    }
}

/// One cell per table column, blank where the row stores nothing.
pub fn plan_row(row: &Row, width: usize, locale: &Locale) -> Vec<PlannedCell> {
    (0..width).map(|k| plan_cell(row.get_index(k), locale)).collect()
}

/// Closes the sink on every exit path.
struct OpenSink<K: SheetSink>(K);

impl<K: SheetSink> Deref for OpenSink<K> {
    type Target = K;

    fn deref(&self) -> &K {
        &self.0
    }
}

impl<K: SheetSink> DerefMut for OpenSink<K> {
    fn deref_mut(&mut self) -> &mut K {
        &mut self.0
    }
}

impl<K: SheetSink> Drop for OpenSink<K> {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn row_style<K: SheetSink>(
    sink: &mut K,
    cache: &StyleCache<K::Color, K::Style>,
    row: &Row,
) -> Option<K::Style> {
    let style = row.style;
    if style.is_default() {
        return None;
    }
    let key = StyleKey {
        foreground: sink.resolve_color(style.foreground.unwrap_or(Color::BLACK)),
        background: style.background.map(|c| sink.resolve_color(c)),
        bold: style.bold,
    };
    Some(cache.get_or_create(key.clone(), || sink.create_style(&key)))
}

/// Write `table` through an opened sink and persist it.
pub(crate) fn write_table<K: SheetSink>(
    sink: K,
    path: &Path,
    table: &Table,
    auto_resize: bool,
    locale: &Locale,
    default_sheet_name: &str,
) -> Result<()> {
    let mut sink = OpenSink(sink);
    let cache = StyleCache::<K::Color, K::Style>::new();

    let sheet_name = table
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(default_sheet_name);
    sink.set_sheet_name(sheet_name)?;

    let width = table.columns.len();
    let mut offset = 0;
    if width > 0 {
        let key = sink.header_style();
        let style = cache.get_or_create(key.clone(), || sink.create_style(&key));
        sink.write_header(&table.columns, Some(&style))?;
        offset = 1;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let cells = plan_row(row, width, locale);
        let style = row_style(&mut *sink, &cache, row);
        sink.write_row(i + offset, &cells, style.as_ref())?;
    }

    if auto_resize {
        for column in 0..width {
            sink.autosize_column(column)?;
        }
    }

    sink.save()?;
    #[cfg(feature = "tracing")]
    tracing::debug!(
        path = %path.display(),
        sheet = sheet_name,
        rows = table.rows.len(),
        styles = cache.len(),
        "table written"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = path;
    sink.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use sheetmap_common::{CellErrorKind, ColumnSet};
    use std::sync::Arc;

    #[test]
    fn value_policy_precedence() {
        let l = Locale::invariant();
        assert_eq!(plan_cell(Some(&CellValue::Int(3)), &l), PlannedCell::Number(3.0));
        assert_eq!(plan_cell(Some(&CellValue::Boolean(true)), &l), PlannedCell::Boolean(true));
        assert_eq!(plan_cell(None, &l), PlannedCell::Blank);
        assert_eq!(plan_cell(Some(&CellValue::Empty), &l), PlannedCell::Blank);
        assert_eq!(
            plan_cell(Some(&CellValue::Date(NaiveDate::from_ymd_opt(1900, 3, 1).unwrap())), &l),
            PlannedCell::Date {
                serial: 61.0,
                format: "yyyy-mm-dd".into()
            }
        );
        assert_eq!(
            plan_cell(Some(&CellValue::Time(NaiveTime::from_hms_opt(8, 5, 0).unwrap())), &l),
            PlannedCell::Text("08:05:00".into())
        );
        assert_eq!(
            plan_cell(Some(&CellValue::Error(CellErrorKind::Div)), &l),
            PlannedCell::Text("#DIV/0!".into())
        );
    }

    #[test]
    fn sparse_row_keeps_positions() {
        let columns = Arc::new(ColumnSet::new(["A", "B", "C"]));
        let mut row = Row::new(columns);
        row.set("A", 1);
        row.set("C", "c");
        let cells = plan_row(&row, 3, &Locale::invariant());
        assert_eq!(
            cells,
            vec![
                PlannedCell::Number(1.0),
                PlannedCell::Blank,
                PlannedCell::Text("c".into())
            ]
        );
    }
}
