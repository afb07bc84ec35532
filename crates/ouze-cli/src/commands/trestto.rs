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
use super::{reporting_context, DatabaseArgs};
use crate::config::Config;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use ouze_loaders::{DataLoader, TresttoLoader, TresttoLoaderInput};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct TresttoArgs {
  /// First day (YYYY-MM-DD)
  #[arg(long)]
  start: NaiveDate,

  /// Last day (YYYY-MM-DD), inclusive
  #[arg(long)]
  end: NaiveDate,

  /// Directory for the effort and reach extracts; prints them when omitted
  #[arg(long)]
  output_dir: Option<PathBuf>,

  #[command(flatten)]
  db: DatabaseArgs,
}

pub async fn execute(args: TresttoArgs, config: Config) -> Result<()> {
  let context = reporting_context(args.db, &config)?;
  let loader = TresttoLoader;
  info!("Running {}", loader.name());

  let output = loader
    .load(
      &context,
      TresttoLoaderInput { start: args.start, end: args.end, output_dir: args.output_dir },
    )
    .await?;

  let stats = &output.reconciliation.stats;
  info!(
    "Robot rows {}, consolidated {}, mailing {}, joined {}",
    stats.raw_rows, stats.consolidated_rows, stats.mailing_rows, stats.joined_rows
  );

  if output.files.is_empty() {
    println!("ESFORCO\n{}", output.reconciliation.esforco);
    println!("UNICOS\n{}", output.reconciliation.unicos);
  } else {
    for file in &output.files {
      info!("Wrote {}", file.display());
    }
  }
  Ok(())
}
