//! Cell value coercion for the import pipeline
//!
//! Every sheet column has a declared field type; raw cells arrive as
//! whatever the spreadsheet application stored (text, floats, serial
//! date numbers) and are coerced here. Serial dates count days from
//! 1899-12-30; times are day fractions.

use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Declared type of a sheet column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    BigInt,
    Float,
    Boolean,
    Date,
    Time,
    Timestamp,
}

/// A coerced cell value ready for binding
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

/// Base of the spreadsheet serial date system. Day 1 is 1900-01-01, and
/// the off-by-two base absorbs the phantom 1900-02-29.
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("static date")
}

/// Convert a serial day count to a calendar date
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    let days = serial.floor() as i64;
    // Serial 0 and negatives are not meaningful calendar dates here
    if days <= 0 {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::days(days))
}

/// Convert a day fraction to a time of day
pub fn fraction_to_time(fraction: f64) -> Option<NaiveTime> {
    if !(0.0..1.0).contains(&fraction) {
        return None;
    }
    let seconds = (fraction * 86_400.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds.min(86_399), 0)
}

/// Convert a serial date-time to a timestamp
pub fn serial_to_timestamp(serial: f64) -> Option<NaiveDateTime> {
    let date = serial_to_date(serial)?;
    let time = fraction_to_time(serial.fract())?;
    Some(date.and_time(time))
}

/// Coerce one cell to the declared type
///
/// Empty cells become Null. Returns a human-readable message on
/// mismatch; the caller records it against the row.
pub fn coerce(cell: &Data, ty: FieldType) -> Result<Coerced, String> {
    if matches!(cell, Data::Empty) {
        return Ok(Coerced::Null);
    }

    match ty {
        FieldType::Text => coerce_text(cell),
        FieldType::Integer | FieldType::BigInt => coerce_integer(cell),
        FieldType::Float => coerce_float(cell),
        FieldType::Boolean => coerce_boolean(cell),
        FieldType::Date => coerce_date(cell),
        FieldType::Time => coerce_time(cell),
        FieldType::Timestamp => coerce_timestamp(cell),
    }
}

fn coerce_text(cell: &Data) -> Result<Coerced, String> {
    let text = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Whole floats render without the trailing .0 Excel adds
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        other => return Err(format!("expected text, found {:?}", other)),
    };

    if text.is_empty() {
        Ok(Coerced::Null)
    } else {
        Ok(Coerced::Text(text))
    }
}

fn coerce_integer(cell: &Data) -> Result<Coerced, String> {
    match cell {
        Data::Int(i) => Ok(Coerced::Integer(*i)),
        Data::Float(f) if f.fract() == 0.0 => Ok(Coerced::Integer(*f as i64)),
        Data::Float(f) => Err(format!("expected integer, found {}", f)),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Coerced::Null);
            }
            trimmed
                .parse::<i64>()
                .map(Coerced::Integer)
                .map_err(|_| format!("expected integer, found '{}'", trimmed))
        }
        other => Err(format!("expected integer, found {:?}", other)),
    }
}

fn coerce_float(cell: &Data) -> Result<Coerced, String> {
    match cell {
        Data::Int(i) => Ok(Coerced::Float(*i as f64)),
        Data::Float(f) => Ok(Coerced::Float(*f)),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Coerced::Null);
            }
            trimmed
                .parse::<f64>()
                .map(Coerced::Float)
                .map_err(|_| format!("expected number, found '{}'", trimmed))
        }
        other => Err(format!("expected number, found {:?}", other)),
    }
}

fn coerce_boolean(cell: &Data) -> Result<Coerced, String> {
    match cell {
        Data::Bool(b) => Ok(Coerced::Boolean(*b)),
        Data::Int(0) => Ok(Coerced::Boolean(false)),
        Data::Int(1) => Ok(Coerced::Boolean(true)),
        Data::Float(f) if *f == 0.0 => Ok(Coerced::Boolean(false)),
        Data::Float(f) if *f == 1.0 => Ok(Coerced::Boolean(true)),
        Data::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(Coerced::Null),
            "true" | "yes" | "y" | "1" => Ok(Coerced::Boolean(true)),
            "false" | "no" | "n" | "0" => Ok(Coerced::Boolean(false)),
            other => Err(format!("expected boolean, found '{}'", other)),
        },
        other => Err(format!("expected boolean, found {:?}", other)),
    }
}

fn coerce_date(cell: &Data) -> Result<Coerced, String> {
    match cell {
        Data::DateTime(dt) => serial_to_date(dt.as_f64())
            .map(Coerced::Date)
            .ok_or_else(|| format!("serial {} is not a valid date", dt.as_f64())),
        Data::Int(i) => serial_to_date(*i as f64)
            .map(Coerced::Date)
            .ok_or_else(|| format!("serial {} is not a valid date", i)),
        Data::Float(f) => serial_to_date(*f)
            .map(Coerced::Date)
            .ok_or_else(|| format!("serial {} is not a valid date", f)),
        Data::DateTimeIso(s) => parse_date_text(s),
        Data::String(s) => {
            if s.trim().is_empty() {
                return Ok(Coerced::Null);
            }
            parse_date_text(s)
        }
        other => Err(format!("expected date, found {:?}", other)),
    }
}

fn parse_date_text(s: &str) -> Result<Coerced, String> {
    let trimmed = s.trim();
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(Coerced::Date(date));
        }
    }
    // ISO date-times degrade to their date component
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Coerced::Date(dt.date()));
    }
    Err(format!("expected date, found '{}'", trimmed))
}

fn coerce_time(cell: &Data) -> Result<Coerced, String> {
    match cell {
        Data::DateTime(dt) => {
            let value = dt.as_f64();
            fraction_to_time(value.fract())
                .map(Coerced::Time)
                .ok_or_else(|| format!("serial {} is not a valid time", value))
        }
        Data::Float(f) => fraction_to_time(f.fract())
            .map(Coerced::Time)
            .ok_or_else(|| format!("serial {} is not a valid time", f)),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Coerced::Null);
            }
            for format in ["%H:%M:%S", "%H:%M"] {
                if let Ok(time) = NaiveTime::parse_from_str(trimmed, format) {
                    return Ok(Coerced::Time(time));
                }
            }
            Err(format!("expected time, found '{}'", trimmed))
        }
        other => Err(format!("expected time, found {:?}", other)),
    }
}

fn coerce_timestamp(cell: &Data) -> Result<Coerced, String> {
    match cell {
        Data::DateTime(dt) => serial_to_timestamp(dt.as_f64())
            .map(Coerced::Timestamp)
            .ok_or_else(|| format!("serial {} is not a valid timestamp", dt.as_f64())),
        Data::Float(f) => serial_to_timestamp(*f)
            .map(Coerced::Timestamp)
            .ok_or_else(|| format!("serial {} is not a valid timestamp", f)),
        Data::DateTimeIso(s) => parse_timestamp_text(s),
        Data::String(s) => {
            if s.trim().is_empty() {
                return Ok(Coerced::Null);
            }
            parse_timestamp_text(s)
        }
        other => Err(format!("expected timestamp, found {:?}", other)),
    }
}

fn parse_timestamp_text(s: &str) -> Result<Coerced, String> {
    let trimmed = s.trim();
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Coerced::Timestamp(dt));
        }
    }
    Err(format!("expected timestamp, found '{}'", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_date_conversion() {
        // 2026-03-02 is serial 46083 (days from 1899-12-30)
        assert_eq!(
            serial_to_date(46083.0),
            NaiveDate::from_ymd_opt(2026, 3, 2)
        );
        // Day 1 of the serial system
        assert_eq!(serial_to_date(1.0), NaiveDate::from_ymd_opt(1899, 12, 31));
        assert_eq!(serial_to_date(0.0), None);
    }

    #[test]
    fn test_fraction_to_time() {
        assert_eq!(
            fraction_to_time(0.5),
            NaiveTime::from_hms_opt(12, 0, 0)
        );
        assert_eq!(
            fraction_to_time(0.75),
            NaiveTime::from_hms_opt(18, 0, 0)
        );
        assert_eq!(fraction_to_time(0.0), NaiveTime::from_hms_opt(0, 0, 0));
    }

    #[test]
    fn test_serial_timestamp_combines_both() {
        let ts = serial_to_timestamp(46083.5).unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(ts.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn test_boolean_spellings() {
        for truthy in ["Yes", "y", "TRUE", "1"] {
            assert_eq!(
                coerce(&Data::String(truthy.to_string()), FieldType::Boolean),
                Ok(Coerced::Boolean(true))
            );
        }
        for falsy in ["No", "n", "false", "0"] {
            assert_eq!(
                coerce(&Data::String(falsy.to_string()), FieldType::Boolean),
                Ok(Coerced::Boolean(false))
            );
        }
        assert!(coerce(&Data::String("maybe".to_string()), FieldType::Boolean).is_err());
    }

    #[test]
    fn test_integer_rejects_fractions() {
        assert_eq!(
            coerce(&Data::Float(5.0), FieldType::Integer),
            Ok(Coerced::Integer(5))
        );
        assert!(coerce(&Data::Float(5.5), FieldType::Integer).is_err());
    }

    #[test]
    fn test_date_from_text_formats() {
        let expected = Coerced::Date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(
            coerce(&Data::String("2026-03-02".to_string()), FieldType::Date),
            Ok(expected.clone())
        );
        assert_eq!(
            coerce(&Data::String("02/03/2026".to_string()), FieldType::Date),
            Ok(expected)
        );
    }

    #[test]
    fn test_empty_cells_are_null() {
        assert_eq!(coerce(&Data::Empty, FieldType::Text), Ok(Coerced::Null));
        assert_eq!(
            coerce(&Data::String("  ".to_string()), FieldType::Integer),
            Ok(Coerced::Null)
        );
    }
}
