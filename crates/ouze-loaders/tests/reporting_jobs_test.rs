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
//! End-to-end runs of the reporting loaders against an in-memory executor

use async_trait::async_trait;
use chrono::NaiveDate;
use ouze_database_mssql::{date_column, QueryExecutor, RepositoryError, RepositoryResult};
use ouze_loaders::devolucoes::attach_descricao_carteira;
use ouze_loaders::prelude::*;
use ouze_loaders::trestto::trestto_file_names;
use ouze_loaders::{
  DevolucoesLoader, DevolucoesLoaderInput, DiscagensLoader, DiscagensLoaderInput,
  MailingHistLoader, MailingHistLoaderInput, TresttoLoader, TresttoLoaderInput,
};
use polars::prelude::*;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Answers each query by the table it reads and remembers what it ran
#[derive(Default)]
struct TableExecutor {
  queries: Mutex<Vec<String>>,
}

fn day(d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
}

fn discagens_frame() -> DataFrame {
  DataFrame::new(vec![
    date_column("DATA", &[day(1), day(1), day(2)]).unwrap(),
    Column::new("CPF".into(), ["111", "222", "111"]),
    Column::new("ddd".into(), [11i64, 85, 0]),
    Column::new("GrupoPrincipal".into(), [4118i64, 4636, 1]),
  ])
  .unwrap()
}

fn mailing_frame() -> DataFrame {
  DataFrame::new(vec![
    date_column("DATA", &[day(1), day(1), day(2)]).unwrap(),
    Column::new("CONTRATO".into(), ["C1", "C2", "C1"]),
    Column::new("CPF".into(), [111i64, 222, 111]),
    Column::new("ATRASO".into(), [10i64, 45, 11]),
    Column::new("COD_CLI".into(), [228i64, 196, 228]),
    Column::new("COD_CAR".into(), [2i64, 4, 2]),
  ])
  .unwrap()
}

fn trestto_frame() -> DataFrame {
  DataFrame::new(vec![
    date_column("DATA", &[day(1), day(1), day(1), day(2)]).unwrap(),
    Column::new("CPF".into(), ["111", "111", "222", "111"]),
    Column::new("SUBSTATUSURA".into(), ["A", "B", "A", "A"]),
    Column::new("TIPO".into(), ["ROBÔ"; 4]),
    Column::new("DISCAGEM".into(), [2i64, 3, 1, 1]),
    Column::new("ALO".into(), [1i64, 0, 0, 0]),
    Column::new("CPC".into(), [0i64, 1, 0, 0]),
    Column::new("CPCA".into(), [0i64, 0, 0, 0]),
    Column::new("PROMESSA".into(), [0i64, 1, 0, 0]),
  ])
  .unwrap()
}

fn registry_frame() -> DataFrame {
  df!(
    "CPF_DEV" => ["111", "222"],
    "CONTRATO_FIN" => ["C1", "C2"],
    "COD_CLI" => [228i64, 196],
    "COD_CAR" => [2i64, 4],
    "DESC_CAR" => ["API 2", "EQUIPAMENTOS 4"]
  )
  .unwrap()
}

#[async_trait]
impl QueryExecutor for TableExecutor {
  async fn fetch(&self, sql: &str) -> RepositoryResult<DataFrame> {
    self.queries.lock().unwrap().push(sql.to_string());
    if sql.contains("DISCAGENS_TRESTTO") {
      Ok(trestto_frame())
    } else if sql.contains("MAILING_HIST") {
      Ok(mailing_frame())
    } else if sql.contains("CAD_DEVF") {
      Ok(registry_frame())
    } else if sql.contains("OPENQUERY") {
      Ok(discagens_frame())
    } else {
      Err(RepositoryError::QueryError(format!("unexpected query: {sql}")))
    }
  }
}

fn context(executor: Arc<TableExecutor>) -> LoaderContext {
  LoaderContext::new(executor, LoaderConfig { show_progress: false, ..LoaderConfig::default() })
}

#[tokio::test]
async fn discagens_job_writes_enriched_extract() {
  let dir = TempDir::new().unwrap();
  let output = dir.path().join("discagens.csv");
  let executor = Arc::new(TableExecutor::default());

  let result = DiscagensLoader
    .load(
      &context(executor.clone()),
      DiscagensLoaderInput { start: day(1), end: day(2), output: Some(output.clone()) },
    )
    .await
    .unwrap();

  assert_eq!(result.rows_written, Some(3));
  let text = fs::read_to_string(&output).unwrap();
  let mut lines = text.trim_start_matches('\u{feff}').lines();
  assert_eq!(lines.next(), Some("DATA;CPF;ddd;GrupoPrincipal;OPERACAO;ESTADO"));
  assert_eq!(lines.next(), Some("2025-10-01;111;11;4118;ATIVO;SP"));
  assert_eq!(lines.next(), Some("2025-10-01;222;85;4636;AGV NEGOCIADORA;CE"));
  assert_eq!(lines.next(), Some("2025-10-02;111;0;1;Outros;Outros"));

  let queries = executor.queries.lock().unwrap();
  assert!(queries[0].contains("totalinfo_2025_10"));
}

#[tokio::test]
async fn discagens_job_rejects_inverted_range() {
  let executor = Arc::new(TableExecutor::default());
  let result = DiscagensLoader
    .load(
      &context(executor.clone()),
      DiscagensLoaderInput { start: day(2), end: day(1), output: None },
    )
    .await;
  assert!(matches!(result, Err(LoaderError::InvalidData(_))));
  assert!(executor.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn trestto_job_reconciles_and_writes_both_extracts() {
  let dir = TempDir::new().unwrap();
  let executor = Arc::new(TableExecutor::default());

  let output = TresttoLoader
    .load(
      &context(executor),
      TresttoLoaderInput { start: day(1), end: day(2), output_dir: Some(dir.path().to_path_buf()) },
    )
    .await
    .unwrap();

  let stats = &output.reconciliation.stats;
  assert_eq!(stats.raw_rows, 4);
  assert_eq!(stats.consolidated_rows, 3);
  assert_eq!(stats.joined_rows, 3);

  let esforco = &output.reconciliation.esforco;
  let discagem: Vec<Option<i64>> = esforco.column("DISCAGEM").unwrap().i64().unwrap().into_iter().collect();
  // 2025-10-01 API 0-30 (111: 2+3), 2025-10-01 Equipamentos 31-60 (222), 2025-10-02 API 0-30
  assert_eq!(discagem, vec![Some(5), Some(1), Some(1)]);

  let unicos = &output.reconciliation.unicos;
  let promessa: Vec<Option<i64>> = unicos.column("PROMESSA").unwrap().i64().unwrap().into_iter().collect();
  assert_eq!(promessa, vec![Some(1), Some(0), Some(0)]);

  let (esforco_name, unicos_name) = trestto_file_names(day(1), day(2));
  assert_eq!(output.files, vec![dir.path().join(esforco_name), dir.path().join(unicos_name)]);
  assert!(output.files.iter().all(|f| f.exists()));
}

#[tokio::test]
async fn mailing_and_devolucoes_jobs_share_portfolios() {
  let executor = Arc::new(TableExecutor::default());
  let ctx = context(executor);

  let mailing = MailingHistLoader
    .load(&ctx, MailingHistLoaderInput { start: day(1), end: day(2), output: None })
    .await
    .unwrap();
  let devolucoes =
    DevolucoesLoader.load(&ctx, DevolucoesLoaderInput::default()).await.unwrap();

  let joined = attach_descricao_carteira(mailing.data, &devolucoes.data).unwrap();
  assert_eq!(joined.height(), 3);

  let desc: Vec<Option<&str>> = joined.column("DESC_CAR").unwrap().str().unwrap().into_iter().collect();
  assert!(desc.iter().all(|d| d.is_some()));

  let bands: Vec<Option<&str>> = joined.column("FX_ATRASO").unwrap().str().unwrap().into_iter().collect();
  assert!(bands.contains(&Some("31-60")));
}
