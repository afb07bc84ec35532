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
//! Configuration management for the reporting jobs

use crate::error::{Error, Result};
use chrono::NaiveDate;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Driver used by the reporting jobs when `OUZE_DB_DRIVER` is not set
pub const DEFAULT_REPORTING_DRIVER: &str = "ODBC Driver 17 for SQL Server";

/// Connection defaults of the operational-times backfill
pub const DEFAULT_TEMPOS_DRIVER: &str = "SQL Server";
pub const DEFAULT_TEMPOS_SERVER: &str = r"TRC-DC-BDM\BD";
pub const DEFAULT_TEMPOS_DATABASE: &str = "SRC";

/// Network locations of the operational-times template and extracts
pub const DEFAULT_TEMPOS_SQL_PATH: &str =
  r"\\trc-dc-ad\Planejamento\MIS\CARTEIRAS\Renner\Tempos\Retorno_tempos_renner - TRCWO.sql";
pub const DEFAULT_TEMPOS_OUTPUT_DIR: &str =
  r"\\trc-dc-ad\Planejamento\MIS\CARTEIRAS\Renner\Tempos\tempos WO";

/// SQL Server login. When absent the connection uses integrated security.
#[derive(Clone, Deserialize, Serialize)]
pub struct SqlCredentials {
  pub user: String,
  #[serde(skip_serializing)]
  pub password: String,
}

impl fmt::Debug for SqlCredentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SqlCredentials").field("user", &self.user).field("password", &"***").finish()
  }
}

/// Where and how to open a database session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
  /// ODBC driver name, kept for the rendered connection string
  pub driver: String,

  /// `HOST`, `HOST\INSTANCE` or `HOST,PORT`
  pub server: String,

  /// Database (catalog) name
  pub database: String,

  /// Optional SQL login
  pub credentials: Option<SqlCredentials>,
}

impl DatabaseConfig {
  /// Build a config from two named environment variables holding the
  /// server and database names. The driver comes from `OUZE_DB_DRIVER`.
  pub fn from_env_vars(server_var: &str, database_var: &str) -> Result<Self> {
    dotenv().ok();

    let server = env::var(server_var)
      .map_err(|_| Error::Config(format!("{server_var} environment variable not set")))?;
    let database = env::var(database_var)
      .map_err(|_| Error::Config(format!("{database_var} environment variable not set")))?;
    let driver =
      env::var("OUZE_DB_DRIVER").unwrap_or_else(|_| DEFAULT_REPORTING_DRIVER.to_string());

    Ok(Self { driver, server, database, credentials: credentials_from_env() })
  }

  /// Connection used by the discagens / mailing / trestto / devolucoes jobs
  pub fn reporting_from_env() -> Result<Self> {
    Self::from_env_vars("OUZE_DB_SERVER", "OUZE_DB_DATABASE")
  }

  /// Connection used by the operational-times backfill
  pub fn tempos_from_env() -> Self {
    dotenv().ok();

    Self {
      driver: env::var("TEMPOS_DB_DRIVER").unwrap_or_else(|_| DEFAULT_TEMPOS_DRIVER.to_string()),
      server: env::var("TEMPOS_DB_SERVER").unwrap_or_else(|_| DEFAULT_TEMPOS_SERVER.to_string()),
      database: env::var("TEMPOS_DB_DATABASE")
        .unwrap_or_else(|_| DEFAULT_TEMPOS_DATABASE.to_string()),
      credentials: credentials_from_env(),
    }
  }
}

fn credentials_from_env() -> Option<SqlCredentials> {
  match (env::var("MSSQL_USER"), env::var("MSSQL_PASSWORD")) {
    (Ok(user), Ok(password)) if !user.is_empty() => Some(SqlCredentials { user, password }),
    _ => None,
  }
}

/// Settings of the operational-times incremental backfill
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemposConfig {
  pub database: DatabaseConfig,

  /// SQL template carrying the `DECLARE @DT…` lines
  pub sql_path: PathBuf,

  /// Directory holding the dated CSV extracts
  pub output_dir: PathBuf,

  /// First date to backfill when the output directory holds no extract yet
  pub backfill_start: Option<NaiveDate>,
}

impl TemposConfig {
  /// Load configuration from environment variables
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let sql_path =
      env::var("TEMPOS_SQL_PATH").unwrap_or_else(|_| DEFAULT_TEMPOS_SQL_PATH.to_string());
    let output_dir =
      env::var("TEMPOS_OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_TEMPOS_OUTPUT_DIR.to_string());

    let backfill_start = match env::var("TEMPOS_BACKFILL_START") {
      Ok(raw) if !raw.trim().is_empty() => {
        Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
          Error::Config(format!("Invalid TEMPOS_BACKFILL_START '{}': {e}", raw.trim()))
        })?)
      }
      _ => None,
    };

    Ok(Self {
      database: DatabaseConfig::tempos_from_env(),
      sql_path: PathBuf::from(sql_path),
      output_dir: PathBuf::from(output_dir),
      backfill_start,
    })
  }
}
