use chrono::Timelike;
use sheetmap_common::CellValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Formatting conventions used when writing cells.
///
/// `date_format` and `datetime_format` are spreadsheet number-format codes
/// attached to date cells. `time_format` is a `chrono` pattern: time-of-day
/// values are written as text, with `decimal_separator` before any
/// milliseconds. Numbers are always written as numeric cells.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locale {
    pub name: String,
    pub decimal_separator: char,
    pub date_format: String,
    pub datetime_format: String,
    pub time_format: String,
}

impl Locale {
    /// Culture-neutral formatting: ISO dates, `.` as decimal separator.
    pub fn invariant() -> Self {
        Self {
            name: String::new(),
            decimal_separator: '.',
            date_format: "yyyy-mm-dd".to_string(),
            datetime_format: "yyyy-mm-dd hh:mm:ss".to_string(),
            time_format: "%H:%M:%S".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    /// Text rendering for values that are not written natively.
    pub fn format_text(&self, value: &CellValue) -> String {
        match value {
            CellValue::Text(s) => s.clone(),
            CellValue::Time(t) => {
                let mut out = t.format(&self.time_format).to_string();
                let millis = t.nanosecond() / 1_000_000;
                if millis != 0 {
                    out.push(self.decimal_separator);
                    out.push_str(&format!("{millis:03}"));
                }
                out
            }
            other => other.to_string(),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::invariant()
    }
}

/// Settings shared by every read and write of one reader/writer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkbookConfig {
    /// Zero-based index of the sheet that is read.
    pub sheet_index: usize,
    /// Name of the written sheet when the table has none.
    pub default_sheet_name: String,
    pub locale: Locale,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            sheet_index: 0,
            default_sheet_name: "sheet1".to_string(),
            locale: Locale::invariant(),
        }
    }
}

impl WorkbookConfig {
    pub fn with_sheet_index(mut self, index: usize) -> Self {
        self.sheet_index = index;
        self
    }

    pub fn with_default_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.default_sheet_name = name.into();
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}
