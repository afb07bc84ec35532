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
//! Devolution registry treatment and portfolio descriptions

use crate::csv_writer::write_csv;
use crate::mailing_hist::add_produto;
use crate::{DataLoader, LoaderContext, LoaderError, LoaderResult};
use async_trait::async_trait;
use ouze_database_mssql::queries::cad_devf_query;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::{info, warn};

pub const DESC_CAR_COLUMN: &str = "DESC_CAR";

fn portfolio_keys() -> [Expr; 2] {
  [col("COD_CLI"), col("COD_CAR")]
}

fn cast_keys(lf: LazyFrame) -> LazyFrame {
  lf.with_columns([
    col("COD_CLI").cast(DataType::Int64),
    col("COD_CAR").cast(DataType::Int64),
  ])
}

/// Standard treatment of the devolution registry
pub fn tratar_base_devolucoes(df: DataFrame) -> LoaderResult<DataFrame> {
  add_produto(df)
}

/// Distinct `(COD_CLI, COD_CAR, DESC_CAR)` rows of the registry. Fails when a
/// portfolio carries more than one description.
pub fn portfolio_table(registry: &DataFrame) -> LoaderResult<DataFrame> {
  for name in ["COD_CLI", "COD_CAR", DESC_CAR_COLUMN] {
    if registry.column(name).is_err() {
      return Err(LoaderError::InvalidData(format!("registry is missing column '{name}'")));
    }
  }

  let portfolios = cast_keys(registry.clone().lazy())
    .select([col("COD_CLI"), col("COD_CAR"), col(DESC_CAR_COLUMN)])
    .unique_stable(None, UniqueKeepStrategy::First)
    .collect()?;

  let duplicated = portfolios
    .clone()
    .lazy()
    .group_by(portfolio_keys())
    .agg([len().alias("n")])
    .filter(col("n").gt(lit(1u32)))
    .sort(["COD_CLI", "COD_CAR"], SortMultipleOptions::default())
    .collect()?;

  if duplicated.height() > 0 {
    let cli = duplicated.column("COD_CLI")?.i64()?.get(0);
    let car = duplicated.column("COD_CAR")?.i64()?.get(0);
    return Err(LoaderError::DuplicateKeys {
      table: "CAD_CAR".to_string(),
      keys: format!(
        "{} portfolio(s) with several descriptions, first ({}, {})",
        duplicated.height(),
        cli.map(|v| v.to_string()).unwrap_or_default(),
        car.map(|v| v.to_string()).unwrap_or_default()
      ),
    });
  }

  Ok(portfolios)
}

/// Many-to-one left join of the portfolio description on `(COD_CLI, COD_CAR)`.
///
/// Rows without a matching portfolio keep a null `DESC_CAR`; the row count
/// never changes.
pub fn attach_descricao_carteira(df: DataFrame, registry: &DataFrame) -> LoaderResult<DataFrame> {
  let portfolios = portfolio_table(registry)?;
  let rows_before = df.height();

  let mut left = df;
  if left.column(DESC_CAR_COLUMN).is_ok() {
    left = left.drop(DESC_CAR_COLUMN)?;
  }

  let joined = cast_keys(left.lazy())
    .join(portfolios.lazy(), portfolio_keys(), portfolio_keys(), JoinArgs::new(JoinType::Left))
    .collect()?;

  if joined.height() != rows_before {
    return Err(LoaderError::TransformError(format!(
      "portfolio join changed row count from {} to {}",
      rows_before,
      joined.height()
    )));
  }
  Ok(joined)
}

#[derive(Debug, Clone, Default)]
pub struct DevolucoesLoaderInput {
  pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct DevolucoesLoaderOutput {
  pub data: DataFrame,
  pub rows_written: Option<usize>,
}

/// Fetches the devolution registry and tags its product
pub struct DevolucoesLoader;

#[async_trait]
impl DataLoader for DevolucoesLoader {
  type Input = DevolucoesLoaderInput;
  type Output = DevolucoesLoaderOutput;

  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output> {
    info!("Loading devolution registry");

    let raw = context.executor.fetch(&cad_devf_query()).await?;
    if raw.height() == 0 {
      warn!("Devolution registry query returned no rows");
      return Ok(DevolucoesLoaderOutput { data: raw, rows_written: None });
    }

    // Validates that every portfolio has a single description
    let portfolios = portfolio_table(&raw)?;
    info!("Devolution registry covers {} portfolios", portfolios.height());

    let mut data = tratar_base_devolucoes(raw)?;
    let rows_written = match &input.output {
      Some(path) => Some(write_csv(&mut data, path, &context.config)?),
      None => None,
    };

    info!("Devolution registry loaded: {} rows", data.height());
    Ok(DevolucoesLoaderOutput { data, rows_written })
  }

  fn name(&self) -> &'static str {
    "devolucoes_loader"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn registry() -> DataFrame {
    df!(
      "CPF_DEV" => ["1", "2", "3"],
      "COD_CLI" => [198i64, 198, 196],
      "COD_CAR" => [1i64, 1, 3],
      "DESC_CAR" => ["AGENDA NEG 1", "AGENDA NEG 1", "EQUIP 3"]
    )
    .unwrap()
  }

  #[test]
  fn test_portfolio_table_is_distinct() {
    let portfolios = portfolio_table(&registry()).unwrap();
    assert_eq!(portfolios.height(), 2);
  }

  #[test]
  fn test_duplicate_portfolio_description_is_rejected() {
    let registry = df!(
      "COD_CLI" => [198i64, 198],
      "COD_CAR" => [2i64, 2],
      "DESC_CAR" => ["AGENDA NEG 2", "AGENDA NEGATIVA 2"]
    )
    .unwrap();
    let err = portfolio_table(&registry).unwrap_err();
    assert!(matches!(err, LoaderError::DuplicateKeys { .. }));
    assert!(err.to_string().contains("(198, 2)"));
  }

  #[test]
  fn test_attach_descricao_carteira_left_join() {
    let mailing = df!(
      "CPF" => ["10", "20", "30"],
      "COD_CLI" => [196i64, 198, 228],
      "COD_CAR" => [3i64, 1, 2]
    )
    .unwrap();

    let joined = attach_descricao_carteira(mailing, &registry()).unwrap();
    assert_eq!(joined.height(), 3);

    let sorted = joined.sort(["CPF"], SortMultipleOptions::default()).unwrap();
    let desc: Vec<Option<&str>> = sorted.column(DESC_CAR_COLUMN).unwrap().str().unwrap().into_iter().collect();
    assert_eq!(desc, vec![Some("EQUIP 3"), Some("AGENDA NEG 1"), None]);
  }

  #[test]
  fn test_attach_replaces_existing_description() {
    let joined = attach_descricao_carteira(registry(), &registry()).unwrap();
    assert_eq!(joined.height(), 3);
    assert!(joined.column("DESC_CAR_right").is_err());
  }

  #[test]
  fn test_registry_without_description_is_invalid() {
    let registry = df!("COD_CLI" => [1i64], "COD_CAR" => [1i64]).unwrap();
    assert!(matches!(portfolio_table(&registry), Err(LoaderError::InvalidData(_))));
  }

  #[test]
  fn test_tratar_base_devolucoes_adds_produto() {
    let df = tratar_base_devolucoes(registry()).unwrap();
    let produtos: Vec<Option<&str>> = df.column("PRODUTO").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(produtos, vec![Some("Agenda Negativa"), Some("Agenda Negativa"), Some("Equipamentos")]);
  }
}
