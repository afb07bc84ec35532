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
//! Query execution abstraction
//!
//! Loaders talk to the database only through [`QueryExecutor`], which turns
//! a SQL batch into a [`DataFrame`]. [`SqlServerExecutor`] is the real
//! implementation: one session per call, closed before returning.

use crate::connection::{establish_connection, odbc_connection_string, MssqlClient};
use crate::frame::result_set_to_dataframe;
use async_trait::async_trait;
use futures::TryStreamExt;
use log::error;
use ouze_core::DatabaseConfig;
use polars::prelude::{DataFrame, PolarsError};
use thiserror::Error;
use tiberius::{QueryItem, Row};

/// Database repository errors
#[derive(Error, Debug)]
pub enum RepositoryError {
  #[error("Connection error: {0}")]
  ConnectionError(String),

  #[error("Database query error: {0}")]
  QueryError(String),

  #[error("Result conversion error: {0}")]
  ConversionError(String),

  #[error("Configuration error: {0}")]
  ConfigError(String),
}

impl From<tiberius::error::Error> for RepositoryError {
  fn from(err: tiberius::error::Error) -> Self {
    match err {
      tiberius::error::Error::Io { .. } | tiberius::error::Error::Tls(_) => {
        RepositoryError::ConnectionError(err.to_string())
      }
      tiberius::error::Error::Conversion(_) => RepositoryError::ConversionError(err.to_string()),
      _ => RepositoryError::QueryError(err.to_string()),
    }
  }
}

impl From<std::io::Error> for RepositoryError {
  fn from(err: std::io::Error) -> Self {
    RepositoryError::ConnectionError(err.to_string())
  }
}

impl From<PolarsError> for RepositoryError {
  fn from(err: PolarsError) -> Self {
    RepositoryError::ConversionError(err.to_string())
  }
}

impl From<ouze_core::Error> for RepositoryError {
  fn from(err: ouze_core::Error) -> Self {
    RepositoryError::ConfigError(err.to_string())
  }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Runs SQL and hands the result back as a frame
#[async_trait]
pub trait QueryExecutor: Send + Sync {
  /// Execute a batch and return its last result set. A batch that produces
  /// no rows yields an empty frame, not an error.
  async fn fetch(&self, sql: &str) -> RepositoryResult<DataFrame>;

  /// Short description of the target, for logs
  fn target(&self) -> String {
    "query executor".to_string()
  }
}

/// Column names and rows of one statement's output
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet<R> {
  pub columns: Vec<String>,
  pub rows: Vec<R>,
}

/// Keeps the last result set of a batch, including one without rows.
///
/// Each metadata token opens a new set; rows go to the set opened last.
#[derive(Debug)]
pub struct LastResultSet<R> {
  current: Option<ResultSet<R>>,
}

impl<R> Default for LastResultSet<R> {
  fn default() -> Self {
    Self { current: None }
  }
}

impl<R> LastResultSet<R> {
  pub fn start(&mut self, columns: Vec<String>) {
    self.current = Some(ResultSet { columns, rows: Vec::new() });
  }

  pub fn push(&mut self, row: R) {
    self
      .current
      .get_or_insert_with(|| ResultSet { columns: Vec::new(), rows: Vec::new() })
      .rows
      .push(row);
  }

  /// `None` when the batch produced no result set at all
  pub fn finish(self) -> Option<ResultSet<R>> {
    self.current
  }
}

async fn last_result_set(
  client: &mut MssqlClient,
  sql: &str,
) -> Result<Option<ResultSet<Row>>, tiberius::error::Error> {
  let mut stream = client.simple_query(sql).await?;
  let mut last = LastResultSet::default();
  while let Some(item) = stream.try_next().await? {
    match item {
      QueryItem::Metadata(meta) => {
        last.start(meta.columns().iter().map(|c| c.name().to_string()).collect())
      }
      QueryItem::Row(row) => last.push(row),
    }
  }
  Ok(last.finish())
}

/// Executor backed by a fresh SQL Server session per query
#[derive(Debug, Clone)]
pub struct SqlServerExecutor {
  config: DatabaseConfig,
}

impl SqlServerExecutor {
  pub fn new(config: DatabaseConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &DatabaseConfig {
    &self.config
  }
}

#[async_trait]
impl QueryExecutor for SqlServerExecutor {
  async fn fetch(&self, sql: &str) -> RepositoryResult<DataFrame> {
    let mut client = establish_connection(&self.config).await?;

    // DECLARE/SET statements do not produce result sets; the SELECT we want
    // is the last one, even when it returns no rows.
    let result_set = last_result_set(&mut client, sql).await.map_err(|e| {
      error!("Query failed on {}: {}", self.config.server, e);
      RepositoryError::from(e)
    })?;

    client.close().await?;

    match result_set {
      Some(set) => result_set_to_dataframe(set),
      None => Ok(DataFrame::empty()),
    }
  }

  fn target(&self) -> String {
    odbc_connection_string(&self.config)
  }
}
