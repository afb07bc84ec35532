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
//! Incremental backfill of the operational-times extracts
//!
//! The destination directory is the only state: the newest
//! `TEMPOS_OPERACIONAIS_<YYYYMMDD>_TRCWO.csv` found there is the last
//! processed date, and every day after it up to the target is extracted in
//! order. Failures are recorded per date and never stop the run.

use crate::csv_writer::write_csv;
use crate::execution_report::ExecutionReport;
use crate::{DataLoader, LoaderContext, LoaderError, LoaderResult};
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use ouze_database_mssql::queries::{month_bounds, render_tempos_template};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

static EXTRACT_NAME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^TEMPOS_OPERACIONAIS_(\d{8})_TRCWO\.csv$").unwrap());

/// Extract file name for a date
pub fn extract_file_name(date: NaiveDate) -> String {
  format!("TEMPOS_OPERACIONAIS_{}_TRCWO.csv", date.format("%Y%m%d"))
}

/// Date encoded in an extract file name, `None` for any other name
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
  let caps = EXTRACT_NAME.captures(name)?;
  NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y%m%d").ok()
}

/// Newest extract date in `dir`. A missing or unreadable directory, or one
/// without extracts, gives `None`.
pub fn last_processed_date(dir: &Path) -> Option<NaiveDate> {
  let entries = match fs::read_dir(dir) {
    Ok(entries) => entries,
    Err(e) => {
      warn!("Cannot read output directory {}: {}", dir.display(), e);
      return None;
    }
  };

  let mut csv_files = 0usize;
  let mut dates = Vec::new();
  for entry in entries.flatten() {
    if !entry.path().is_file() {
      continue;
    }
    let name = entry.file_name();
    let Some(name) = name.to_str() else { continue };
    if !name.to_ascii_lowercase().ends_with(".csv") {
      continue;
    }
    csv_files += 1;
    if let Some(date) = date_from_file_name(name) {
      dates.push(date);
    }
  }

  let last = dates.iter().max().copied();
  match last {
    Some(date) => info!(
      "Last processed date: {} ({} csv files, {} extracts)",
      date.format("%d/%m/%Y"),
      csv_files,
      dates.len()
    ),
    None if csv_files == 0 => info!("No csv files in {}", dir.display()),
    None => warn!("No extract with a valid date among {} csv files", csv_files),
  }
  last
}

/// Local date of yesterday, the default target
pub fn yesterday() -> NaiveDate {
  Local::now().date_naive() - Duration::days(1)
}

/// Dates still to extract, ascending, weekends included.
///
/// After `last` up to and including `target`. Without a last date the run
/// starts at `backfill_start` when given, otherwise it covers `target` only.
pub fn pending_dates(
  last: Option<NaiveDate>,
  target: NaiveDate,
  backfill_start: Option<NaiveDate>,
) -> Vec<NaiveDate> {
  let first = match (last, backfill_start) {
    (Some(last), _) => last + Duration::days(1),
    (None, Some(start)) => start,
    (None, None) => target,
  };
  first.iter_days().take_while(|d| *d <= target).collect()
}

#[derive(Debug, Clone)]
pub struct TemposLoaderInput {
  pub sql_path: PathBuf,
  pub output_dir: PathBuf,
  pub target: NaiveDate,
  pub backfill_start: Option<NaiveDate>,
}

/// Runs the incremental backfill and returns the execution report
pub struct TemposLoader;

impl TemposLoader {
  /// Extract one date and record its outcome
  pub async fn process_date(
    &self,
    context: &LoaderContext,
    input: &TemposLoaderInput,
    date: NaiveDate,
    report: &mut ExecutionReport,
  ) {
    let template = match tokio::fs::read_to_string(&input.sql_path).await {
      Ok(template) => template,
      Err(e) => {
        error!("Cannot read template {}: {}", input.sql_path.display(), e);
        report.record_error(date, 0, format!("Erro ao ler query: {e}"));
        return;
      }
    };

    let (first, last) = month_bounds(date);
    debug!("@DT_INI = {first}, @DT_FIM = {last}, @DT = @DT2 = {date}");
    let sql = render_tempos_template(&template, date);

    let mut df = match context.executor.fetch(&sql).await {
      Ok(df) => df,
      Err(e) => {
        error!("Query failed for {}: {}", date, e);
        report.record_error(date, 0, format!("Erro na consulta: {e}"));
        return;
      }
    };

    if df.height() == 0 {
      warn!("No rows for {}, no file written", date);
      report.record_no_data(date);
      return;
    }

    let path = input.output_dir.join(extract_file_name(date));
    match write_csv(&mut df, &path, &context.config) {
      Ok(rows) => {
        info!("Saved {} rows to {}", rows, path.display());
        report.record_success(date, rows, path);
      }
      Err(e) => {
        error!("Cannot save {}: {}", path.display(), e);
        report.record_error(date, df.height(), format!("Erro ao salvar CSV: {e}"));
      }
    }
  }
}

#[async_trait]
impl DataLoader for TemposLoader {
  type Input = TemposLoaderInput;
  type Output = ExecutionReport;

  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output> {
    self.validate_input(&input).await?;
    info!("Operational times backfill, target {}", input.target.format("%d/%m/%Y"));
    info!("Checking {}", input.output_dir.display());

    let last = last_processed_date(&input.output_dir);
    let dates = pending_dates(last, input.target, input.backfill_start);
    let mut report = ExecutionReport::new(input.target, last);

    if dates.is_empty() {
      info!("Extracts are up to date");
      report.finish();
      return Ok(report);
    }

    if let (Some(first), Some(final_date)) = (dates.first(), dates.last()) {
      info!("{} pending dates: {} to {}", dates.len(), first, final_date);
    }

    let progress = if context.config.show_progress && dates.len() > 1 {
      let pb = ProgressBar::new(dates.len() as u64);
      pb.set_style(
        ProgressStyle::default_bar()
          .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
          .map_err(|e| LoaderError::ConfigurationError(e.to_string()))?
          .progress_chars("##-"),
      );
      pb.set_message("Extracting operational times");
      Some(pb)
    } else {
      None
    };

    for date in dates {
      if let Some(pb) = &progress {
        pb.set_message(date.format("%d/%m/%Y").to_string());
      }
      info!("Processing {}", date.format("%d/%m/%Y (%A)"));
      self.process_date(context, &input, date, &mut report).await;
      if let Some(pb) = &progress {
        pb.inc(1);
      }
    }

    if let Some(pb) = progress {
      pb.finish_with_message("Backfill complete");
    }

    report.finish();
    Ok(report)
  }

  async fn validate_input(&self, input: &Self::Input) -> LoaderResult<()> {
    if let Some(start) = input.backfill_start {
      if start > input.target {
        return Err(LoaderError::InvalidData(format!(
          "backfill start {} is after target {}",
          start, input.target
        )));
      }
    }
    Ok(())
  }

  fn name(&self) -> &'static str {
    "tempos_loader"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::execution_report::ExecutionStatus;
  use crate::LoaderConfig;
  use mockall::mock;
  use mockall::predicate::function;
  use ouze_database_mssql::{QueryExecutor, RepositoryError, RepositoryResult};
  use polars::prelude::*;
  use pretty_assertions::assert_eq;
  use std::sync::Arc;
  use tempfile::TempDir;

  mock! {
    pub Executor {}

    #[async_trait]
    impl QueryExecutor for Executor {
      async fn fetch(&self, sql: &str) -> RepositoryResult<DataFrame>;
      fn target(&self) -> String;
    }
  }

  const TEMPLATE: &str = "\
DECLARE @DT_INI AS DATE = '2025-01-01'
DECLARE @DT_FIM AS DATE = '2025-01-31'
DECLARE @DT     AS DATE = '2025-01-01'
DECLARE @DT2    AS DATE = '2025-01-01'
SELECT * FROM TEMPOS";

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
  }

  fn setup() -> (TempDir, TemposLoaderInput) {
    let dir = TempDir::new().unwrap();
    let sql_path = dir.path().join("tempos.sql");
    fs::write(&sql_path, TEMPLATE).unwrap();
    let output_dir = dir.path().join("out");
    fs::create_dir(&output_dir).unwrap();
    let input = TemposLoaderInput { sql_path, output_dir, target: day(18), backfill_start: None };
    (dir, input)
  }

  fn context(executor: MockExecutor) -> LoaderContext {
    let config = LoaderConfig { show_progress: false, ..LoaderConfig::default() };
    LoaderContext::new(Arc::new(executor), config)
  }

  fn rows(n: usize) -> DataFrame {
    df!("OPERADOR" => vec!["ana"; n], "TEMPO" => vec![60i64; n]).unwrap()
  }

  #[test]
  fn test_file_name_round_trip() {
    let name = extract_file_name(day(5));
    assert_eq!(name, "TEMPOS_OPERACIONAIS_20251005_TRCWO.csv");
    assert_eq!(date_from_file_name(&name), Some(day(5)));
  }

  #[test]
  fn test_file_name_pattern_is_anchored() {
    assert_eq!(date_from_file_name("TEMPOS_OPERACIONAIS_20251005_TRCWO.csv.bak"), None);
    assert_eq!(date_from_file_name("old_TEMPOS_OPERACIONAIS_20251005_TRCWO.csv"), None);
    assert_eq!(date_from_file_name("TEMPOS_OPERACIONAIS_20251399_TRCWO.csv"), None);
    assert_eq!(date_from_file_name("TEMPOS_OPERACIONAIS_2025100_TRCWO.csv"), None);
  }

  #[test]
  fn test_last_processed_date_scans_directory() {
    let dir = TempDir::new().unwrap();
    for name in [
      "TEMPOS_OPERACIONAIS_20251003_TRCWO.csv",
      "TEMPOS_OPERACIONAIS_20251010_TRCWO.csv",
      "TEMPOS_OPERACIONAIS_20251012_TRCWO.csv.tmp",
      "relatorio.csv",
      "notes.txt",
    ] {
      fs::write(dir.path().join(name), "x").unwrap();
    }
    assert_eq!(last_processed_date(dir.path()), Some(day(10)));
  }

  #[test]
  fn test_last_processed_date_ignores_directories() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(extract_file_name(day(10))), "x").unwrap();
    fs::create_dir(dir.path().join(extract_file_name(day(16)))).unwrap();
    assert_eq!(last_processed_date(dir.path()), Some(day(10)));
  }

  #[test]
  fn test_last_processed_date_missing_or_empty() {
    let dir = TempDir::new().unwrap();
    assert_eq!(last_processed_date(dir.path()), None);
    assert_eq!(last_processed_date(&dir.path().join("nope")), None);
  }

  #[test]
  fn test_pending_dates_include_weekends() {
    // 2025-10-17 is a Friday
    let dates = pending_dates(Some(day(17)), day(20), None);
    assert_eq!(dates, vec![day(18), day(19), day(20)]);
  }

  #[test]
  fn test_pending_dates_edge_cases() {
    assert!(pending_dates(Some(day(18)), day(18), None).is_empty());
    assert!(pending_dates(Some(day(20)), day(18), None).is_empty());
    assert_eq!(pending_dates(None, day(18), None), vec![day(18)]);
    assert_eq!(pending_dates(None, day(18), Some(day(16))), vec![day(16), day(17), day(18)]);
    // The last processed date wins over the configured start
    assert_eq!(pending_dates(Some(day(17)), day(18), Some(day(1))), vec![day(18)]);
  }

  #[test]
  fn test_yesterday_is_before_today() {
    assert!(yesterday() < Local::now().date_naive());
  }

  #[tokio::test]
  async fn test_backfill_writes_one_file_per_date() {
    let (_dir, input) = setup();
    fs::write(input.output_dir.join(extract_file_name(day(15))), "x").unwrap();

    let mut executor = MockExecutor::new();
    executor
      .expect_fetch()
      .with(function(|sql: &str| sql.contains("DECLARE @DT_INI AS DATE = '2025-10-01'")))
      .times(3)
      .returning(|_| Ok(rows(2)));

    let report = TemposLoader.load(&context(executor), input.clone()).await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.last_processed, Some(day(15)));
    assert!(report.outcomes.iter().all(|o| o.status == ExecutionStatus::Success));
    assert_eq!(report.totals().total_rows, 6);
    for d in [16, 17, 18] {
      assert!(input.output_dir.join(extract_file_name(day(d))).exists());
    }
    assert_eq!(last_processed_date(&input.output_dir), Some(day(18)));
  }

  #[tokio::test]
  async fn test_empty_result_is_no_data_without_file() {
    let (_dir, input) = setup();
    let mut executor = MockExecutor::new();
    executor.expect_fetch().times(1).returning(|_| Ok(DataFrame::empty()));

    let report = TemposLoader.load(&context(executor), input.clone()).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].status, ExecutionStatus::NoData);
    assert!(!input.output_dir.join(extract_file_name(day(18))).exists());
  }

  #[tokio::test]
  async fn test_query_error_does_not_stop_later_dates() {
    let (_dir, mut input) = setup();
    input.backfill_start = Some(day(16));

    let mut executor = MockExecutor::new();
    executor
      .expect_fetch()
      .times(3)
      .returning(|sql| {
        if sql.contains("DECLARE @DT     AS DATE = '2025-10-16'") {
          Err(RepositoryError::QueryError("deadlock".to_string()))
        } else {
          Ok(rows(1))
        }
      });

    let report = TemposLoader.load(&context(executor), input.clone()).await.unwrap();

    let statuses: Vec<ExecutionStatus> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
      statuses,
      vec![ExecutionStatus::Error, ExecutionStatus::Success, ExecutionStatus::Success]
    );
    assert!(report.outcomes[0].message.as_deref().unwrap_or("").contains("deadlock"));
    assert!(!input.output_dir.join(extract_file_name(day(16))).exists());
    assert!(input.output_dir.join(extract_file_name(day(17))).exists());
  }

  #[tokio::test]
  async fn test_write_failure_is_error_with_fetched_rows() {
    let (dir, mut input) = setup();
    // A regular file where the output directory should be
    input.output_dir = dir.path().join("blocked");
    fs::write(&input.output_dir, "x").unwrap();
    input.target = day(17);
    input.backfill_start = Some(day(16));

    let mut executor = MockExecutor::new();
    executor.expect_fetch().times(2).returning(|_| Ok(rows(2)));

    let report = TemposLoader.load(&context(executor), input).await.unwrap();

    assert_eq!(report.outcomes.len(), 2);
    for outcome in &report.outcomes {
      assert_eq!(outcome.status, ExecutionStatus::Error);
      assert_eq!(outcome.rows, 2);
      assert!(outcome.file.is_none());
      assert!(outcome.message.as_deref().unwrap_or("").contains("Erro ao salvar CSV"));
    }
    assert_eq!(report.totals().errors, 2);
  }

  #[tokio::test]
  async fn test_up_to_date_runs_no_query() {
    let (_dir, input) = setup();
    fs::write(input.output_dir.join(extract_file_name(day(18))), "x").unwrap();

    let mut executor = MockExecutor::new();
    executor.expect_fetch().never();

    let report = TemposLoader.load(&context(executor), input).await.unwrap();
    assert!(report.is_up_to_date());
    assert!(report.finished_at.is_some());
  }

  #[tokio::test]
  async fn test_missing_template_is_error_per_date() {
    let (_dir, mut input) = setup();
    input.sql_path = input.sql_path.with_file_name("missing.sql");

    let mut executor = MockExecutor::new();
    executor.expect_fetch().never();

    let report = TemposLoader.load(&context(executor), input).await.unwrap();
    assert_eq!(report.totals().errors, 1);
  }

  #[tokio::test]
  async fn test_backfill_start_after_target_is_rejected() {
    let (_dir, mut input) = setup();
    input.backfill_start = Some(day(19));
    let executor = MockExecutor::new();
    let result = TemposLoader.load(&context(executor), input).await;
    assert!(matches!(result, Err(LoaderError::InvalidData(_))));
  }
}
