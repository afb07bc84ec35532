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
pub mod devolucoes;
pub mod discagens;
pub mod mailing;
pub mod tempos;
pub mod trestto;

use crate::config::Config;
use anyhow::Result;
use clap::Args;
use ouze_database_mssql::{QueryExecutor, SqlServerExecutor};
use ouze_loaders::{LoaderConfig, LoaderContext};
use std::sync::Arc;
use tracing::info;

/// Connection flags of the reporting jobs
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
  /// SQL Server host, HOST\INSTANCE or HOST,PORT
  #[arg(long, env = "OUZE_DB_SERVER")]
  pub server: Option<String>,

  /// Database name
  #[arg(long, env = "OUZE_DB_DATABASE")]
  pub database: Option<String>,
}

/// Loader context on the reporting database
pub fn reporting_context(db: DatabaseArgs, config: &Config) -> Result<LoaderContext> {
  let database = config.reporting_database(db.server, db.database)?;
  let executor = SqlServerExecutor::new(database);
  info!("Using {}", executor.target());
  Ok(LoaderContext::new(Arc::new(executor), LoaderConfig::default()))
}
