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
//! Base traits and types for data loaders

use crate::LoaderResult;
use async_trait::async_trait;
use ouze_database_mssql::QueryExecutor;
use std::sync::Arc;

/// Configuration for data loaders
#[derive(Debug, Clone)]
pub struct LoaderConfig {
  /// Enable progress bars for multi-date runs
  pub show_progress: bool,

  /// Field separator of the CSV extracts
  pub csv_separator: u8,

  /// Prefix extracts with a UTF-8 byte order mark
  pub include_bom: bool,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self { show_progress: true, csv_separator: b';', include_bom: true }
  }
}

/// Shared context for all loaders
pub struct LoaderContext {
  pub executor: Arc<dyn QueryExecutor>,
  pub config: LoaderConfig,
}

impl LoaderContext {
  pub fn new(executor: Arc<dyn QueryExecutor>, config: LoaderConfig) -> Self {
    Self { executor, config }
  }

  pub fn with_config(mut self, config: LoaderConfig) -> Self {
    self.config = config;
    self
  }
}

/// Base trait for all data loaders
#[async_trait]
pub trait DataLoader: Send + Sync {
  /// The type of data this loader processes
  type Input;

  /// The result type after loading
  type Output;

  /// Load data from the given input
  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output>;

  /// Validate input before loading
  async fn validate_input(&self, _input: &Self::Input) -> LoaderResult<()> {
    Ok(())
  }

  /// Get loader name for logging/tracking
  fn name(&self) -> &'static str;
}
