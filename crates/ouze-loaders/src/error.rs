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
use ouze_database_mssql::RepositoryError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LoaderError {
  #[error("Database error: {0}")]
  DatabaseError(String),

  #[error("IO error: {0}")]
  IoError(String),

  #[error("Transform error: {0}")]
  TransformError(String),

  #[error("Duplicate keys in {table}: {keys}")]
  DuplicateKeys { table: String, keys: String },

  #[error("Serialization error: {0}")]
  SerializationError(String),

  #[error("Invalid data: {0}")]
  InvalidData(String),

  #[error("Configuration error: {0}")]
  ConfigurationError(String),
}

// Implement conversions manually
impl From<RepositoryError> for LoaderError {
  fn from(err: RepositoryError) -> Self {
    match err {
      RepositoryError::ConfigError(msg) => LoaderError::ConfigurationError(msg),
      other => LoaderError::DatabaseError(other.to_string()),
    }
  }
}

impl From<std::io::Error> for LoaderError {
  fn from(err: std::io::Error) -> Self {
    LoaderError::IoError(err.to_string())
  }
}

impl From<PolarsError> for LoaderError {
  fn from(err: PolarsError) -> Self {
    LoaderError::TransformError(err.to_string())
  }
}

impl From<serde_json::Error> for LoaderError {
  fn from(err: serde_json::Error) -> Self {
    LoaderError::SerializationError(err.to_string())
  }
}

impl From<ouze_core::Error> for LoaderError {
  fn from(err: ouze_core::Error) -> Self {
    LoaderError::ConfigurationError(err.to_string())
  }
}

pub type LoaderResult<T> = Result<T, LoaderError>;
