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
//! Mailing-history enrichment: product and delinquency bands

use crate::columns::{float_values, int_values};
use crate::csv_writer::write_csv;
use crate::{DataLoader, LoaderContext, LoaderError, LoaderResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use ouze_core::types::{FaixaAtraso, Produto};
use ouze_database_mssql::queries::mailing_hist_query;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn};

pub const ATRASO_COLUMN: &str = "ATRASO";

/// Tag each row with the product of its `(COD_CLI, COD_CAR)` pair (`PRODUTO`)
pub fn add_produto(mut df: DataFrame) -> LoaderResult<DataFrame> {
  let clientes = int_values(&df, "COD_CLI")?;
  let carteiras = int_values(&df, "COD_CAR")?;

  let labels: Vec<&str> = clientes
    .into_iter()
    .zip(carteiras)
    .map(|pair| match pair {
      (Some(cli), Some(car)) => Produto::from_codes(cli, car).label(),
      _ => Produto::Outros.label(),
    })
    .collect();

  df.with_column(Column::new("PRODUTO".into(), labels))?;
  Ok(df)
}

/// Bucket the days past due in `column` into `FX_ATRASO`. Nulls stay null.
pub fn add_faixa_atraso(mut df: DataFrame, column: &str) -> LoaderResult<DataFrame> {
  let labels: Vec<Option<&str>> = float_values(&df, column)?
    .into_iter()
    .map(|dias| dias.and_then(FaixaAtraso::from_dias).map(|f| f.label()))
    .collect();
  df.with_column(Column::new("FX_ATRASO".into(), labels))?;
  Ok(df)
}

/// Standard treatment of the mailing history
pub fn tratar_base_mailing_hist(df: DataFrame) -> LoaderResult<DataFrame> {
  let df = add_produto(df)?;
  add_faixa_atraso(df, ATRASO_COLUMN)
}

/// Caller-defined bands with upper-inclusive edges.
///
/// Band `i` holds values in `(edges[i], edges[i + 1]]`. Values at or below
/// the first edge or above the last one fall outside every band.
#[derive(Debug, Clone, PartialEq)]
pub struct Faixas {
  edges: Vec<f64>,
  labels: Vec<String>,
}

impl Faixas {
  pub fn new(edges: Vec<f64>, labels: Vec<String>) -> LoaderResult<Self> {
    if edges.len() < 2 {
      return Err(LoaderError::InvalidData("at least two band edges are required".to_string()));
    }
    if labels.len() != edges.len() - 1 {
      return Err(LoaderError::InvalidData(format!(
        "{} edges need {} labels, got {}",
        edges.len(),
        edges.len() - 1,
        labels.len()
      )));
    }
    if edges.iter().any(|e| e.is_nan()) || edges.windows(2).any(|w| w[0] >= w[1]) {
      return Err(LoaderError::InvalidData("band edges must be strictly ascending".to_string()));
    }
    Ok(Self { edges, labels })
  }

  pub fn classify(&self, value: f64) -> Option<&str> {
    if value.is_nan() {
      return None;
    }
    self
      .edges
      .windows(2)
      .position(|w| value > w[0] && value <= w[1])
      .and_then(|idx| self.labels.get(idx))
      .map(String::as_str)
  }

  pub fn labels(&self) -> &[String] {
    &self.labels
  }
}

/// Band `column` with `faixas` into `new_name` (default `FX_<column>`)
pub fn add_faixa_customizada(
  mut df: DataFrame,
  column: &str,
  faixas: &Faixas,
  new_name: Option<&str>,
) -> LoaderResult<DataFrame> {
  let target = new_name.map(str::to_string).unwrap_or_else(|| format!("FX_{column}"));
  let labels: Vec<Option<&str>> = float_values(&df, column)?
    .into_iter()
    .map(|v| v.and_then(|v| faixas.classify(v)))
    .collect();
  df.with_column(Column::new(target.as_str().into(), labels))?;
  Ok(df)
}

#[derive(Debug, Clone)]
pub struct MailingHistLoaderInput {
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct MailingHistLoaderOutput {
  pub data: DataFrame,
  pub rows_written: Option<usize>,
}

/// Fetches the mailing history and tags product and delinquency band
pub struct MailingHistLoader;

#[async_trait]
impl DataLoader for MailingHistLoader {
  type Input = MailingHistLoaderInput;
  type Output = MailingHistLoaderOutput;

  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output> {
    self.validate_input(&input).await?;
    info!("Loading mailing history {} to {}", input.start, input.end);

    let raw = context.executor.fetch(&mailing_hist_query(input.start, input.end)).await?;
    if raw.height() == 0 {
      warn!("Mailing history is empty between {} and {}", input.start, input.end);
      return Ok(MailingHistLoaderOutput { data: raw, rows_written: None });
    }

    let mut data = tratar_base_mailing_hist(raw)?;
    let rows_written = match &input.output {
      Some(path) => Some(write_csv(&mut data, path, &context.config)?),
      None => None,
    };

    info!("Mailing history loaded: {} rows", data.height());
    Ok(MailingHistLoaderOutput { data, rows_written })
  }

  async fn validate_input(&self, input: &Self::Input) -> LoaderResult<()> {
    if input.end < input.start {
      return Err(LoaderError::InvalidData(format!(
        "end date {} is before start date {}",
        input.end, input.start
      )));
    }
    Ok(())
  }

  fn name(&self) -> &'static str {
    "mailing_hist_loader"
  }
}
