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
//! Column access helpers shared by the transforms

use crate::{LoaderError, LoaderResult};
use polars::prelude::*;

pub(crate) fn require<'a>(df: &'a DataFrame, name: &str) -> LoaderResult<&'a Column> {
  df.column(name).map_err(|_| LoaderError::InvalidData(format!("missing column '{name}'")))
}

/// Numeric view of a column. Text is parsed, so `"011"` reads as 11;
/// anything unparseable becomes null.
pub(crate) fn float_values(df: &DataFrame, name: &str) -> LoaderResult<Vec<Option<f64>>> {
  let column = require(df, name)?;
  let column = match column.dtype() {
    DataType::String => {
      let trimmed: Vec<Option<String>> =
        column.str()?.into_iter().map(|v| v.map(|s| s.trim().to_string())).collect();
      Column::new(name.into(), trimmed).cast(&DataType::Float64)?
    }
    _ => column.cast(&DataType::Float64)?,
  };
  Ok(column.f64()?.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
}

/// Integer view of a column; fractional values are truncated
pub(crate) fn int_values(df: &DataFrame, name: &str) -> LoaderResult<Vec<Option<i64>>> {
  Ok(
    float_values(df, name)?
      .into_iter()
      .map(|v| v.filter(|x| x.is_finite()).map(|x| x as i64))
      .collect(),
  )
}

/// Text version of a key column. Floats holding whole numbers lose the
/// trailing `.0` so `12345678901.0` and `12345678901` match.
pub(crate) fn text_column(column: &Column) -> LoaderResult<Column> {
  let text = match column.dtype() {
    DataType::Float32 | DataType::Float64 => {
      column.cast(&DataType::Int64)?.cast(&DataType::String)?
    }
    _ => column.cast(&DataType::String)?,
  };
  Ok(text)
}
