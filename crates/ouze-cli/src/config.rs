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
use anyhow::{Context, Result};
use ouze_core::{DatabaseConfig, TemposConfig};

#[derive(Debug, Clone)]
pub struct Config {
  pub tempos: TemposConfig,
}

impl Config {
  pub fn from_env() -> Result<Self> {
    let tempos = TemposConfig::from_env().context("Invalid operational-times configuration")?;
    Ok(Self { tempos })
  }

  /// Connection of the reporting jobs. Only those jobs need it, so a missing
  /// server does not stop `ouze tempos`.
  pub fn reporting_database(
    &self,
    server: Option<String>,
    database: Option<String>,
  ) -> Result<DatabaseConfig> {
    match (server, database) {
      (Some(server), Some(database)) => {
        let mut config = self.tempos.database.clone();
        config.driver = std::env::var("OUZE_DB_DRIVER")
          .unwrap_or_else(|_| ouze_core::config::DEFAULT_REPORTING_DRIVER.to_string());
        config.server = server;
        config.database = database;
        Ok(config)
      }
      _ => DatabaseConfig::reporting_from_env()
        .context("Set OUZE_DB_SERVER and OUZE_DB_DATABASE or pass --server and --database"),
    }
  }
}
