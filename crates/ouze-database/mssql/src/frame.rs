/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
//! Conversion of tiberius rows into polars frames

use crate::repository::{RepositoryError, RepositoryResult, ResultSet};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use tiberius::{ColumnData, FromSql, Row};

/// One decoded SQL value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
  Date(NaiveDate),
  DateTime(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
  Bool,
  Int,
  Float,
  Text,
  Date,
  DateTime,
}

impl Cell {
  fn kind(&self) -> Option<Kind> {
    match self {
      Cell::Null => None,
      Cell::Bool(_) => Some(Kind::Bool),
      Cell::Int(_) => Some(Kind::Int),
      Cell::Float(_) => Some(Kind::Float),
      Cell::Text(_) => Some(Kind::Text),
      Cell::Date(_) => Some(Kind::Date),
      Cell::DateTime(_) => Some(Kind::DateTime),
    }
  }
}

fn epoch() -> NaiveDate {
  NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Decode a single column value
pub fn decode(data: ColumnData<'static>) -> RepositoryResult<Cell> {
  let cell = match data {
    ColumnData::U8(v) => v.map(|x| Cell::Int(x as i64)),
    ColumnData::I16(v) => v.map(|x| Cell::Int(x as i64)),
    ColumnData::I32(v) => v.map(|x| Cell::Int(x as i64)),
    ColumnData::I64(v) => v.map(Cell::Int),
    ColumnData::F32(v) => v.map(|x| Cell::Float(x as f64)),
    ColumnData::F64(v) => v.map(Cell::Float),
    ColumnData::Bit(v) => v.map(Cell::Bool),
    ColumnData::String(v) => v.map(|s| Cell::Text(s.into_owned())),
    ColumnData::Guid(v) => v.map(|g| Cell::Text(g.to_string())),
    ColumnData::Binary(v) => {
      v.map(|b| Cell::Text(b.iter().map(|byte| format!("{byte:02x}")).collect()))
    }
    ColumnData::Numeric(v) => {
      v.map(|n| Cell::Float(n.value() as f64 / 10f64.powi(n.scale() as i32)))
    }
    ColumnData::Xml(v) => v.map(|x| Cell::Text(x.into_owned().into_string())),
    ref temporal @ ColumnData::Date(_) => NaiveDate::from_sql(temporal)?.map(Cell::Date),
    ref temporal @ (ColumnData::DateTime(_)
    | ColumnData::SmallDateTime(_)
    | ColumnData::DateTime2(_)) => NaiveDateTime::from_sql(temporal)?.map(Cell::DateTime),
    ref temporal @ ColumnData::DateTimeOffset(_) => {
      chrono::DateTime::<chrono::Utc>::from_sql(temporal)?.map(|dt| Cell::DateTime(dt.naive_utc()))
    }
    ref temporal @ ColumnData::Time(_) => {
      NaiveTime::from_sql(temporal)?.map(|t| Cell::Text(t.to_string()))
    }
  };
  Ok(cell.unwrap_or(Cell::Null))
}

/// Build a typed polars column from decoded cells.
///
/// The column type follows the first non-null cell. Integers inside a float
/// column are widened; any other mix is a conversion error.
pub fn cells_to_column(name: &str, cells: Vec<Cell>) -> RepositoryResult<Column> {
  let mut kind: Option<Kind> = None;
  for cell in &cells {
    match (kind, cell.kind()) {
      (_, None) => {}
      (None, Some(k)) => kind = Some(k),
      (Some(Kind::Int), Some(Kind::Float)) => kind = Some(Kind::Float),
      (Some(Kind::Float), Some(Kind::Int)) => {}
      (Some(a), Some(b)) if a == b => {}
      (Some(a), Some(b)) => {
        return Err(RepositoryError::ConversionError(format!(
          "column '{name}' mixes {a:?} and {b:?} values"
        )))
      }
    }
  }

  let len = cells.len();
  let column = match kind {
    None => Column::full_null(name.into(), len, &DataType::String),
    Some(Kind::Bool) => Column::new(
      name.into(),
      cells.into_iter().map(|c| if let Cell::Bool(b) = c { Some(b) } else { None }).collect::<Vec<_>>(),
    ),
    Some(Kind::Int) => Column::new(
      name.into(),
      cells.into_iter().map(|c| if let Cell::Int(i) = c { Some(i) } else { None }).collect::<Vec<_>>(),
    ),
    Some(Kind::Float) => Column::new(
      name.into(),
      cells
        .into_iter()
        .map(|c| match c {
          Cell::Float(f) => Some(f),
          Cell::Int(i) => Some(i as f64),
          _ => None,
        })
        .collect::<Vec<_>>(),
    ),
    Some(Kind::Text) => Column::new(
      name.into(),
      cells.into_iter().map(|c| if let Cell::Text(s) = c { Some(s) } else { None }).collect::<Vec<_>>(),
    ),
    Some(Kind::Date) => {
      let days: Vec<Option<i32>> = cells
        .into_iter()
        .map(|c| if let Cell::Date(d) = c { Some((d - epoch()).num_days() as i32) } else { None })
        .collect();
      Column::new(name.into(), days).cast(&DataType::Date)?
    }
    Some(Kind::DateTime) => {
      let millis: Vec<Option<i64>> = cells
        .into_iter()
        .map(|c| if let Cell::DateTime(dt) = c { Some(dt.and_utc().timestamp_millis()) } else { None })
        .collect();
      Column::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
    }
  };

  Ok(column)
}

/// Convert a result set into a frame. An empty result set gives an empty frame.
pub fn rows_to_dataframe(rows: Vec<Row>) -> RepositoryResult<DataFrame> {
  let names: Vec<String> = match rows.first() {
    Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
    None => return Ok(DataFrame::empty()),
  };

  let mut columns: Vec<Vec<Cell>> = names.iter().map(|_| Vec::with_capacity(rows.len())).collect();
  for row in rows {
    for (idx, data) in row.into_iter().enumerate() {
      let cell = decode(data)?;
      if let Some(column) = columns.get_mut(idx) {
        column.push(cell);
      }
    }
  }

  let columns = names
    .iter()
    .zip(columns)
    .map(|(name, cells)| cells_to_column(name, cells))
    .collect::<RepositoryResult<Vec<Column>>>()?;

  Ok(DataFrame::new(columns)?)
}

/// Zero-row frame that still carries the result set's column names
pub fn empty_frame(columns: &[String]) -> RepositoryResult<DataFrame> {
  let columns = columns
    .iter()
    .map(|name| Column::full_null(name.as_str().into(), 0, &DataType::String))
    .collect::<Vec<_>>();
  Ok(DataFrame::new(columns)?)
}

/// Frame of a result set; a set without rows gives a zero-height frame
pub fn result_set_to_dataframe(set: ResultSet<Row>) -> RepositoryResult<DataFrame> {
  if set.rows.is_empty() {
    return empty_frame(&set.columns);
  }
  rows_to_dataframe(set.rows)
}

/// Date column from calendar dates
pub fn date_column(name: &str, dates: &[NaiveDate]) -> PolarsResult<Column> {
  let days: Vec<i32> = dates.iter().map(|d| (*d - epoch()).num_days() as i32).collect();
  Column::new(name.into(), days).cast(&DataType::Date)
}

/// Read a date column back into calendar dates
pub fn column_dates(column: &Column) -> PolarsResult<Vec<Option<NaiveDate>>> {
  let dates = column.cast(&DataType::Date)?;
  let days = dates.cast(&DataType::Int32)?;
  Ok(
    days
      .i32()?
      .into_iter()
      .map(|d| d.map(|d| epoch() + chrono::Duration::days(d as i64)))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::borrow::Cow;
  use tiberius::IntoSql;

  #[test]
  fn test_decode_integers_and_nulls() {
    assert_eq!(decode(ColumnData::I32(Some(4118))).unwrap(), Cell::Int(4118));
    assert_eq!(decode(ColumnData::U8(Some(7))).unwrap(), Cell::Int(7));
    assert_eq!(decode(ColumnData::I64(None)).unwrap(), Cell::Null);
  }

  #[test]
  fn test_decode_date() {
    let date = NaiveDate::from_ymd_opt(2025, 10, 18).unwrap();
    assert_eq!(decode(date.into_sql()).unwrap(), Cell::Date(date));
  }

  #[test]
  fn test_decode_text() {
    let cell = decode(ColumnData::String(Some(Cow::Owned("ROBÔ".to_string())))).unwrap();
    assert_eq!(cell, Cell::Text("ROBÔ".to_string()));
  }

  #[test]
  fn test_int_column_widens_to_float() {
    let col = cells_to_column("ATRASO", vec![Cell::Int(10), Cell::Float(2.5), Cell::Null]).unwrap();
    assert_eq!(col.dtype(), &DataType::Float64);
    assert_eq!(col.f64().unwrap().get(0), Some(10.0));
    assert_eq!(col.null_count(), 1);
  }

  #[test]
  fn test_mixed_column_is_rejected() {
    let err = cells_to_column("CPF", vec![Cell::Int(1), Cell::Text("x".to_string())]).unwrap_err();
    assert!(matches!(err, RepositoryError::ConversionError(_)));
  }

  #[test]
  fn test_all_null_column_is_text() {
    let col = cells_to_column("OBS", vec![Cell::Null, Cell::Null]).unwrap();
    assert_eq!(col.dtype(), &DataType::String);
    assert_eq!(col.len(), 2);
  }

  #[test]
  fn test_date_column_roundtrip() {
    let d1 = NaiveDate::from_ymd_opt(2025, 10, 4).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();
    let col = date_column("DATA", &[d1, d2]).unwrap();
    assert_eq!(col.dtype(), &DataType::Date);
    assert_eq!(column_dates(&col).unwrap(), vec![Some(d1), Some(d2)]);
  }

  #[test]
  fn test_datetime_cells_become_datetime_column() {
    let dt = NaiveDate::from_ymd_opt(2025, 10, 4).unwrap().and_hms_opt(8, 30, 0).unwrap();
    let col = cells_to_column("instante", vec![Cell::DateTime(dt)]).unwrap();
    assert_eq!(col.dtype(), &DataType::Datetime(TimeUnit::Milliseconds, None));
    let dates = column_dates(&col).unwrap();
    assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2025, 10, 4)]);
  }

  #[test]
  fn test_result_set_without_rows_keeps_columns() {
    let set = ResultSet { columns: vec!["OPERADOR".to_string(), "TEMPO".to_string()], rows: Vec::new() };
    let df = result_set_to_dataframe(set).unwrap();
    assert_eq!(df.height(), 0);
    assert_eq!(df.width(), 2);
    assert!(df.column("OPERADOR").is_ok());
    assert!(df.column("TEMPO").is_ok());
  }

  #[test]
  fn test_empty_result_set_is_empty_frame() {
    let df = rows_to_dataframe(Vec::new()).unwrap();
    assert_eq!(df.height(), 0);
    assert_eq!(df.width(), 0);
  }
}
