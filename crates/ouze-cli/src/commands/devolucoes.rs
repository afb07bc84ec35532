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
use clap::Args;
use ouze_loaders::{DataLoader, DevolucoesLoader, DevolucoesLoaderInput};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct DevolucoesArgs {
  /// CSV destination; prints a preview when omitted
  #[arg(short, long)]
  output: Option<PathBuf>,

  #[command(flatten)]
  db: DatabaseArgs,
}

pub async fn execute(args: DevolucoesArgs, config: Config) -> Result<()> {
  let context = reporting_context(args.db, &config)?;
  let loader = DevolucoesLoader;
  info!("Running {}", loader.name());

  let output = loader.load(&context, DevolucoesLoaderInput { output: args.output }).await?;

  match output.rows_written {
    Some(rows) => info!("{} rows written", rows),
    None => println!("{}", output.data.head(Some(20))),
  }
  Ok(())
}
