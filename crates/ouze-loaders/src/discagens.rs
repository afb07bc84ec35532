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
//! Dialing-attempt enrichment and extract

use crate::columns::int_values;
use crate::csv_writer::write_csv;
use crate::{DataLoader, LoaderContext, LoaderResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use ouze_core::types::{estado_por_ddd, Operacao, OUTROS};
use ouze_database_mssql::queries::discagens_query;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn};

/// Campaign group column of the dialer extract
pub const GRUPO_COLUMN: &str = "GrupoPrincipal";

/// Default area-code column
pub const DDD_COLUMN: &str = "ddd";

/// Tag each attempt with the operation of its campaign group (`OPERACAO`)
pub fn add_operacao(mut df: DataFrame) -> LoaderResult<DataFrame> {
  let labels: Vec<&str> = int_values(&df, GRUPO_COLUMN)?
    .into_iter()
    .map(|grupo| grupo.map(Operacao::from_grupo).unwrap_or(Operacao::Outros).label())
    .collect();
  df.with_column(Column::new("OPERACAO".into(), labels))?;
  Ok(df)
}

/// Map the area code in `column` to a state (`ESTADO`)
pub fn add_estado_por_ddd(mut df: DataFrame, column: &str) -> LoaderResult<DataFrame> {
  let labels: Vec<&str> = int_values(&df, column)?
    .into_iter()
    .map(|ddd| ddd.map(estado_por_ddd).unwrap_or(OUTROS))
    .collect();
  df.with_column(Column::new("ESTADO".into(), labels))?;
  Ok(df)
}

/// Standard treatment of the dialer extract
pub fn tratar_base_discagens(df: DataFrame) -> LoaderResult<DataFrame> {
  let df = add_operacao(df)?;
  add_estado_por_ddd(df, DDD_COLUMN)
}

#[derive(Debug, Clone)]
pub struct DiscagensLoaderInput {
  pub start: NaiveDate,
  pub end: NaiveDate,
  /// Where to write the extract; the frame is only returned when absent
  pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct DiscagensLoaderOutput {
  pub data: DataFrame,
  pub rows_written: Option<usize>,
}

/// Fetches dialing attempts, enriches them and optionally writes a CSV
pub struct DiscagensLoader;

#[async_trait]
impl DataLoader for DiscagensLoader {
  type Input = DiscagensLoaderInput;
  type Output = DiscagensLoaderOutput;

  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output> {
    self.validate_input(&input).await?;
    info!("Loading dialing attempts {} to {}", input.start, input.end);

    let raw = context.executor.fetch(&discagens_query(input.start, input.end)).await?;
    if raw.height() == 0 {
      warn!("No dialing attempts between {} and {}", input.start, input.end);
      return Ok(DiscagensLoaderOutput { data: raw, rows_written: None });
    }

    let mut data = tratar_base_discagens(raw)?;
    let rows_written = match &input.output {
      Some(path) => Some(write_csv(&mut data, path, &context.config)?),
      None => None,
    };

    info!("Dialing attempts loaded: {} rows", data.height());
    Ok(DiscagensLoaderOutput { data, rows_written })
  }

  async fn validate_input(&self, input: &Self::Input) -> LoaderResult<()> {
    if input.end < input.start {
      return Err(crate::LoaderError::InvalidData(format!(
        "end date {} is before start date {}",
        input.end, input.start
      )));
    }
    Ok(())
  }

  fn name(&self) -> &'static str {
    "discagens_loader"
  }
}
