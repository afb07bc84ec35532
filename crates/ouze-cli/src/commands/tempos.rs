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
use crate::config::Config;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use ouze_database_mssql::{QueryExecutor, SqlServerExecutor};
use ouze_loaders::tempos_loader::yesterday;
use ouze_loaders::{DataLoader, LoaderConfig, LoaderContext, TemposLoader, TemposLoaderInput};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct TemposArgs {
  /// SQL template with the DECLARE @DT lines
  #[arg(long)]
  sql_path: Option<PathBuf>,

  /// Directory of the dated extracts
  #[arg(long)]
  output_dir: Option<PathBuf>,

  /// Last date to extract (defaults to yesterday)
  #[arg(long)]
  target_date: Option<NaiveDate>,

  /// First date when the directory has no extract yet
  #[arg(long)]
  backfill_start: Option<NaiveDate>,

  /// Print the execution report as JSON
  #[arg(long)]
  json: bool,

  /// Hide the progress bar
  #[arg(long)]
  no_progress: bool,
}

fn build_input(args: &TemposArgs, config: &Config) -> TemposLoaderInput {
  TemposLoaderInput {
    sql_path: args.sql_path.clone().unwrap_or_else(|| config.tempos.sql_path.clone()),
    output_dir: args.output_dir.clone().unwrap_or_else(|| config.tempos.output_dir.clone()),
    target: args.target_date.unwrap_or_else(yesterday),
    backfill_start: args.backfill_start.or(config.tempos.backfill_start),
  }
}

pub async fn execute(args: TemposArgs, config: Config) -> Result<()> {
  let input = build_input(&args, &config);

  let executor = SqlServerExecutor::new(config.tempos.database.clone());
  info!("Using {}", executor.target());

  let loader_config = LoaderConfig { show_progress: !args.no_progress, ..LoaderConfig::default() };
  let context = LoaderContext::new(Arc::new(executor), loader_config);

  let report = TemposLoader.load(&context, input).await?;

  if args.json {
    println!("{}", report.to_json()?);
  } else {
    println!("{report}");
  }

  if report.has_errors() {
    warn!("{} date(s) failed; they will be retried on the next run", report.totals().errors);
  }
  Ok(())
}
