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
//! Robot-dialer (Trestto) reconciliation against the mailing history
//!
//! Raw robot aggregates are consolidated per CPF and day, joined to the
//! segment (`PRODUTO`, `FX_ATRASO`) the CPF had in that day's mailing base,
//! and summed per segment twice: once as effort (raw sums) and once as reach
//! (each metric counted at most once per CPF-day).

use crate::columns::{require, text_column};
use crate::csv_writer::write_csv;
use crate::mailing_hist::tratar_base_mailing_hist;
use crate::{DataLoader, LoaderContext, LoaderError, LoaderResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use ouze_database_mssql::queries::{mailing_hist_query, trestto_query};
use polars::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Robot metrics, in output order
pub const METRICS: &[&str] = &["DISCAGEM", "ALO", "CPC", "CPCA", "PROMESSA"];

const DAY_KEYS: [&str; 2] = ["DATA", "CPF"];
const SEGMENT_KEYS: [&str; 3] = ["DATA", "PRODUTO", "FX_ATRASO"];

fn cols(names: &[&str]) -> Vec<Expr> {
  names.iter().map(|n| col(*n)).collect()
}

/// Row counts at each reconciliation step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationStats {
  pub raw_rows: usize,
  pub consolidated_rows: usize,
  pub mailing_rows: usize,
  pub joined_rows: usize,
  /// CPF-days that appear under more than one segment in the mailing base
  pub multi_segment_keys: usize,
}

#[derive(Debug, Clone)]
pub struct TresttoReconciliation {
  /// Metric sums per day, product and delinquency band
  pub esforco: DataFrame,
  /// Number of CPF-days with each metric above zero, per segment
  pub unicos: DataFrame,
  pub stats: ReconciliationStats,
}

/// Date-typed `DATA` and text `CPF`
fn normalize_keys(df: &DataFrame) -> LoaderResult<DataFrame> {
  let mut df = df.clone();
  let data = require(&df, "DATA")?.cast(&DataType::Date)?;
  let cpf = text_column(require(&df, "CPF")?)?;
  df.with_column(data)?;
  df.with_column(cpf)?;
  Ok(df)
}

/// Reconcile robot dialing aggregates with the treated mailing history
pub fn reconcile_trestto(
  discagens: &DataFrame,
  mailing: &DataFrame,
) -> LoaderResult<TresttoReconciliation> {
  for metric in METRICS {
    require(discagens, metric)?;
  }
  for name in ["PRODUTO", "FX_ATRASO"] {
    require(mailing, name)?;
  }

  let raw = normalize_keys(discagens)?;
  let mailing = normalize_keys(mailing)?;
  let mut stats = ReconciliationStats { raw_rows: raw.height(), ..Default::default() };
  info!("Before consolidation - Trestto: {}", stats.raw_rows);

  let consolidated = raw
    .lazy()
    .with_columns(METRICS.iter().map(|m| col(*m).cast(DataType::Int64)).collect::<Vec<_>>())
    .group_by(cols(&DAY_KEYS))
    .agg(METRICS.iter().map(|m| col(*m).sum()).collect::<Vec<_>>())
    .collect()?;
  stats.consolidated_rows = consolidated.height();
  stats.mailing_rows = mailing.height();
  info!("After consolidation - Trestto: {}", stats.consolidated_rows);
  info!("Mailing: {}", stats.mailing_rows);

  let segments = mailing
    .lazy()
    .select(cols(&["DATA", "CPF", "PRODUTO", "FX_ATRASO"]))
    .unique_stable(None, UniqueKeepStrategy::First)
    .collect()?;

  stats.multi_segment_keys = segments
    .clone()
    .lazy()
    .group_by(cols(&DAY_KEYS))
    .agg([len().alias("n")])
    .filter(col("n").gt(lit(1u32)))
    .collect()?
    .height();
  if stats.multi_segment_keys > 0 {
    warn!(
      "{} CPF-days map to more than one segment; their metrics count once per segment",
      stats.multi_segment_keys
    );
  }

  let joined = consolidated
    .lazy()
    .join(segments.lazy(), cols(&DAY_KEYS), cols(&DAY_KEYS), JoinArgs::new(JoinType::Inner))
    .collect()?;
  stats.joined_rows = joined.height();
  info!("After join: {}", stats.joined_rows);

  // Rows without a band (null ATRASO) belong to no segment
  let joined = joined
    .lazy()
    .filter(
      SEGMENT_KEYS
        .iter()
        .map(|k| col(*k).is_not_null())
        .fold(lit(true), |acc, e| acc.and(e)),
    )
    .collect()?;
  if joined.height() < stats.joined_rows {
    warn!("{} joined rows without a segment were left out", stats.joined_rows - joined.height());
  }

  let sums = || METRICS.iter().map(|m| col(*m).sum()).collect::<Vec<_>>();

  let esforco = joined
    .clone()
    .lazy()
    .group_by(cols(&SEGMENT_KEYS))
    .agg(sums())
    .sort(SEGMENT_KEYS, SortMultipleOptions::default())
    .collect()?;

  let unicos = joined
    .lazy()
    .with_columns(
      METRICS
        .iter()
        .map(|m| when(col(*m).gt(lit(0i64))).then(lit(1i64)).otherwise(lit(0i64)).alias(*m))
        .collect::<Vec<_>>(),
    )
    .group_by(cols(&SEGMENT_KEYS))
    .agg(sums())
    .sort(SEGMENT_KEYS, SortMultipleOptions::default())
    .collect()?;

  Ok(TresttoReconciliation { esforco, unicos, stats })
}

#[derive(Debug, Clone)]
pub struct TresttoLoaderInput {
  pub start: NaiveDate,
  pub end: NaiveDate,
  /// Directory for the effort and reach extracts
  pub output_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct TresttoLoaderOutput {
  pub reconciliation: TresttoReconciliation,
  pub files: Vec<PathBuf>,
}

/// File names of the effort and reach extracts for a period
pub fn trestto_file_names(start: NaiveDate, end: NaiveDate) -> (String, String) {
  let period = format!("{}_{}", start.format("%Y%m%d"), end.format("%Y%m%d"));
  (format!("TRESTTO_ESFORCO_{period}.csv"), format!("TRESTTO_UNICOS_{period}.csv"))
}

/// Fetches robot aggregates and the mailing base and reconciles them
pub struct TresttoLoader;

#[async_trait]
impl DataLoader for TresttoLoader {
  type Input = TresttoLoaderInput;
  type Output = TresttoLoaderOutput;

  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output> {
    self.validate_input(&input).await?;
    info!("Reconciling robot dialing {} to {}", input.start, input.end);

    let discagens = context.executor.fetch(&trestto_query(input.start, input.end)).await?;
    let mailing = context.executor.fetch(&mailing_hist_query(input.start, input.end)).await?;
    if discagens.height() == 0 || mailing.height() == 0 {
      return Err(LoaderError::InvalidData(format!(
        "nothing to reconcile: {} robot rows, {} mailing rows",
        discagens.height(),
        mailing.height()
      )));
    }

    let mailing = tratar_base_mailing_hist(mailing)?;
    let mut reconciliation = reconcile_trestto(&discagens, &mailing)?;

    let mut files = Vec::new();
    if let Some(dir) = &input.output_dir {
      let (esforco_name, unicos_name) = trestto_file_names(input.start, input.end);
      let esforco_path = dir.join(esforco_name);
      let unicos_path = dir.join(unicos_name);
      write_csv(&mut reconciliation.esforco, &esforco_path, &context.config)?;
      write_csv(&mut reconciliation.unicos, &unicos_path, &context.config)?;
      files.push(esforco_path);
      files.push(unicos_path);
    }

    Ok(TresttoLoaderOutput { reconciliation, files })
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
    "trestto_loader"
  }
}
