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
//! Session setup for SQL Server
//!
//! A [`DatabaseConfig`] names a driver, a server and a database. The driver
//! only matters for the ODBC-style string we log; the session itself is
//! opened with tiberius over a tokio TCP stream.

use crate::repository::{RepositoryError, RepositoryResult};
use ouze_core::DatabaseConfig;
use tiberius::{AuthMethod, Client, Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

pub type MssqlClient = Client<Compat<TcpStream>>;

const APPLICATION_NAME: &str = "ouze";

/// Parsed form of the `server` setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
  pub host: String,
  pub instance: Option<String>,
  pub port: Option<u16>,
}

impl ServerAddress {
  /// Accepts `HOST`, `HOST\INSTANCE`, `HOST,PORT` and an optional `tcp:` prefix.
  pub fn parse(server: &str) -> RepositoryResult<Self> {
    let server = server.trim();
    let server = server.strip_prefix("tcp:").unwrap_or(server);
    if server.is_empty() {
      return Err(RepositoryError::ConfigError("empty server name".to_string()));
    }

    let (rest, port) = match server.split_once(',') {
      Some((host, port)) => {
        let port = port
          .trim()
          .parse::<u16>()
          .map_err(|_| RepositoryError::ConfigError(format!("invalid port in '{server}'")))?;
        (host.trim(), Some(port))
      }
      None => (server, None),
    };

    let (host, instance) = match rest.split_once('\\') {
      Some((host, instance)) if !instance.is_empty() => (host, Some(instance.to_string())),
      Some((host, _)) => (host, None),
      None => (rest, None),
    };

    Ok(Self { host: host.to_string(), instance, port })
  }
}

/// ODBC-style connection string, as the reporting scripts always wrote it
pub fn odbc_connection_string(config: &DatabaseConfig) -> String {
  match &config.credentials {
    Some(creds) => format!(
      "DRIVER={{{}}};SERVER={};DATABASE={};UID={};PWD=***;",
      config.driver, config.server, config.database, creds.user
    ),
    None => format!(
      "DRIVER={{{}}};SERVER={};DATABASE={};Trusted_Connection=yes;",
      config.driver, config.server, config.database
    ),
  }
}

/// Translate our settings into a tiberius config
pub fn tiberius_config(config: &DatabaseConfig) -> RepositoryResult<Config> {
  let address = ServerAddress::parse(&config.server)?;

  let mut tds = Config::new();
  tds.host(&address.host);
  if let Some(port) = address.port {
    tds.port(port);
  }
  if let Some(instance) = &address.instance {
    tds.instance_name(instance);
  }
  tds.database(&config.database);
  tds.application_name(APPLICATION_NAME);
  tds.trust_cert();

  let auth = match &config.credentials {
    Some(creds) => AuthMethod::sql_server(&creds.user, &creds.password),
    None => integrated_auth()?,
  };
  tds.authentication(auth);

  Ok(tds)
}

#[cfg(windows)]
fn integrated_auth() -> RepositoryResult<AuthMethod> {
  Ok(AuthMethod::Integrated)
}

#[cfg(not(windows))]
fn integrated_auth() -> RepositoryResult<AuthMethod> {
  Err(RepositoryError::ConfigError(
    "integrated security needs Windows; set MSSQL_USER and MSSQL_PASSWORD".to_string(),
  ))
}

/// Open a new session. Named instances are resolved through SQL Browser.
pub async fn establish_connection(config: &DatabaseConfig) -> RepositoryResult<MssqlClient> {
  let tds = tiberius_config(config)?;

  let tcp = TcpStream::connect_named(&tds).await.map_err(|e| {
    RepositoryError::ConnectionError(format!("Failed to reach {}: {}", config.server, e))
  })?;
  tcp.set_nodelay(true)?;

  Client::connect(tds, tcp.compat_write()).await.map_err(|e| {
    RepositoryError::ConnectionError(format!(
      "Failed to open session on {}/{}: {}",
      config.server, config.database, e
    ))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use ouze_core::SqlCredentials;

  fn config(server: &str) -> DatabaseConfig {
    DatabaseConfig {
      driver: "ODBC Driver 17 for SQL Server".to_string(),
      server: server.to_string(),
      database: "SRC".to_string(),
      credentials: None,
    }
  }

  #[test]
  fn test_parse_named_instance() {
    let addr = ServerAddress::parse(r"TRC-DC-BDM\BD").unwrap();
    assert_eq!(addr.host, "TRC-DC-BDM");
    assert_eq!(addr.instance.as_deref(), Some("BD"));
    assert_eq!(addr.port, None);
  }

  #[test]
  fn test_parse_host_and_port() {
    let addr = ServerAddress::parse("tcp:db01,1433").unwrap();
    assert_eq!(addr.host, "db01");
    assert_eq!(addr.instance, None);
    assert_eq!(addr.port, Some(1433));
  }

  #[test]
  fn test_parse_rejects_bad_input() {
    assert!(ServerAddress::parse("").is_err());
    assert!(ServerAddress::parse("db01,abc").is_err());
  }

  #[test]
  fn test_odbc_string_trusted() {
    let s = odbc_connection_string(&config(r"TRC-DC-BDM\BD"));
    assert_eq!(
      s,
      r"DRIVER={ODBC Driver 17 for SQL Server};SERVER=TRC-DC-BDM\BD;DATABASE=SRC;Trusted_Connection=yes;"
    );
  }

  #[test]
  fn test_odbc_string_hides_password() {
    let mut cfg = config("db01");
    cfg.credentials =
      Some(SqlCredentials { user: "relatorios".to_string(), password: "s3cret".to_string() });
    let s = odbc_connection_string(&cfg);
    assert!(s.contains("UID=relatorios"));
    assert!(!s.contains("s3cret"));
  }

  #[test]
  fn test_tiberius_config_with_sql_login() {
    let mut cfg = config("db01,1433");
    cfg.credentials =
      Some(SqlCredentials { user: "relatorios".to_string(), password: "s3cret".to_string() });
    let tds = tiberius_config(&cfg).unwrap();
    assert_eq!(tds.get_addr(), "db01:1433");
  }
}
