use chrono::{Duration as ChronoDur, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt::{self, Display};

use crate::CellErrorKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ───────────────────── Excel date-serial utilities ───────────────────
Excel's serial date system:
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom – doesn't exist, but Excel thinks it does)
  Serial 61 = 1900-03-01
Base date = 1899-12-31 so that serial 1 = base + 1 day = 1900-01-01.
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(d) => d,
        None => panic!("invalid calendar constant"),
    }
}

/// Base date for the 1900 date system. Serial 1 = base + 1 day = 1900-01-01.
const EXCEL_EPOCH: NaiveDate = ymd(1899, 12, 31);
const PHANTOM_LEAP_CUTOFF: NaiveDate = ymd(1900, 3, 1);
const PHANTOM_LEAP_DAY: NaiveDate = ymd(1900, 2, 28);

pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - EXCEL_EPOCH).num_days();
    // Dates on or after 1900-03-01 get +1 to account for phantom Feb 29
    let serial_days = if dt.date() >= PHANTOM_LEAP_CUTOFF {
        days + 1
    } else {
        days
    };

    let secs_in_day = dt.time().num_seconds_from_midnight() as f64;
    serial_days as f64 + secs_in_day / 86_400.0
}

pub fn date_to_serial(date: &NaiveDate) -> f64 {
    datetime_to_serial(&date.and_time(NaiveTime::default()))
}

/// Inverse of [`datetime_to_serial`]. Returns `None` for serials outside
/// chrono's representable range.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let frac_secs = (serial.fract() * 86_400.0).round() as i64;

    // Serial 60 is phantom 1900-02-29; map to 1900-02-28
    let date = if days == 60 {
        PHANTOM_LEAP_DAY
    } else {
        let offset = if days < 60 { days } else { days - 1 };
        EXCEL_EPOCH.checked_add_signed(ChronoDur::try_days(offset)?)?
    };

    let time = NaiveTime::from_num_seconds_from_midnight_opt(frac_secs.rem_euclid(86_400) as u32, 0)
        .unwrap_or_default();
    Some(date.and_time(time))
}

/// A single spreadsheet cell value.
///
/// Absence of a cell is not a value: APIs return `Option<&CellValue>` and use
/// `None` for "no cell was present". [`CellValue::Empty`] is an explicit null.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Error(CellErrorKind),
    Empty,
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        use CellValue::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Int(_) | Number(_), Int(_) | Number(_)) => self.as_f64() == other.as_f64(),
            (Text(a), Text(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Error(a), Error(b)) => a == b,
            (Empty, Empty) => true,
            _ => false,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::DateTime(dt) => write!(f, "{dt}"),
            CellValue::Time(t) => write!(f, "{t}"),
            CellValue::Error(e) => write!(f, "{e}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Number(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer view of a numeric cell; floats qualify only when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                Some(*n as i64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_serial_number(&self) -> Option<f64> {
        match self {
            CellValue::Date(d) => Some(date_to_serial(d)),
            CellValue::DateTime(dt) => Some(datetime_to_serial(dt)),
            CellValue::Time(t) => Some(t.num_seconds_from_midnight() as f64 / 86_400.0),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Build a `Date` or `DateTime` from an Excel serial number, `Number` if
    /// the serial cannot be represented.
    pub fn from_serial_number(serial: f64) -> Self {
        match serial_to_datetime(serial) {
            Some(dt) if dt.time() == NaiveTime::default() => CellValue::Date(dt.date()),
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Number(serial),
        }
    }

    /// Short name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Int(_) => "integer",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Boolean(_) => "boolean",
            CellValue::Date(_) => "date",
            CellValue::DateTime(_) => "datetime",
            CellValue::Time(_) => "time",
            CellValue::Error(_) => "error",
            CellValue::Empty => "empty",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_roundtrip_skips_phantom_leap_day() {
        let d = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap();
        assert_eq!(date_to_serial(&d), 61.0);
        assert_eq!(
            CellValue::from_serial_number(61.0),
            CellValue::Date(NaiveDate::from_ymd_opt(1900, 3, 1).unwrap())
        );
        assert_eq!(
            CellValue::from_serial_number(60.0),
            CellValue::Date(NaiveDate::from_ymd_opt(1900, 2, 28).unwrap())
        );
    }

    #[test]
    fn serial_keeps_time_of_day() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let serial = datetime_to_serial(&dt);
        assert_eq!(serial.fract(), 0.5);
        assert_eq!(CellValue::from_serial_number(serial), CellValue::DateTime(dt));
    }

    #[test]
    fn int_and_number_compare_by_magnitude() {
        assert_eq!(CellValue::Int(1), CellValue::Number(1.0));
        assert_ne!(CellValue::Int(1), CellValue::Number(1.5));
        assert_ne!(CellValue::Int(1), CellValue::Text("1".into()));
        assert_eq!(CellValue::Number(3.0).as_i64(), Some(3));
        assert_eq!(CellValue::Number(3.25).as_i64(), None);
    }

    #[test]
    fn non_finite_serial_stays_numeric() {
        assert!(matches!(
            CellValue::from_serial_number(f64::NAN),
            CellValue::Number(_)
        ));
    }
}
