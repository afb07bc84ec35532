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
//! SQL builders for the reporting jobs
//!
//! Pure string formatting: nothing here touches the database.

use chrono::{Datelike, Duration, NaiveDate};
use ouze_core::types::Produto;
use ouze_core::{DIALER_CAMPAIGNS, DIALER_LINKED_SERVER, SQL_DATE_FORMAT};
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

fn sql_date(date: NaiveDate) -> String {
  date.format(SQL_DATE_FORMAT).to_string()
}

fn join_codes(codes: &[i64]) -> String {
  codes.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
}

/// Monthly dialer table for the month of `start`: `totalinfo_<YYYY>_<MM>`
pub fn source_table_for(start: NaiveDate) -> String {
  format!("totalinfo_{}_{:02}", start.year(), start.month())
}

/// Dialing attempts between two dates, read through the dialer's linked server.
///
/// The table is picked from the start date only; a range crossing a month
/// boundary still reads the start month's table.
pub fn discagens_query(start: NaiveDate, end: NaiveDate) -> String {
  let table = source_table_for(start);
  format!(
    r#"
    SELECT
        *
    FROM OPENQUERY ({linked},'
    SELECT
        DATE(A.instante) DATA,
        A.id,
        A.chave1 AS CONTRATO,
        A.Chave3 AS CPF,
        A.ddd,
        A.fone,
        A.GrupoPrincipal,
        A.UltCodSigRecPublica,
        A.ResultadoClassificacao,
        A.MotivoEncerramentoBilhete,
        A.Instante200OKPub,
        A.Agente,
        A.tempoconversacao_ms
    FROM {table} A
    WHERE A.GrupoPrincipal IN (SELECT G.id_grupo FROM grupo G WHERE G.ID_CAMPANHA IN ({campaigns}))
    ')
    WHERE DATA BETWEEN '{start}' AND '{end}'
    "#,
    linked = DIALER_LINKED_SERVER,
    table = table,
    campaigns = join_codes(DIALER_CAMPAIGNS),
    start = sql_date(start),
    end = sql_date(end),
  )
}

/// Daily delinquency snapshots of the reported clients
pub fn mailing_hist_query(start: NaiveDate, end: NaiveDate) -> String {
  format!(
    r#"
    SELECT
        DATA,
        CONTRATO,
        CPF,
        ATRASO,
        COD_CLI,
        COD_CAR
    FROM MAILING_HIST
    WHERE DATA BETWEEN '{start}' AND '{end}'
    AND COD_CLI IN ({clients})
    "#,
    start = sql_date(start),
    end = sql_date(end),
    clients = join_codes(&Produto::client_codes()),
  )
}

/// Current devolution registry with portfolio descriptions
pub fn cad_devf_query() -> String {
  let filter = Produto::RULES
    .iter()
    .map(|(_, cli, cars)| format!("(D.COD_CLI = {cli} AND D.COD_CAR IN ({}))", join_codes(cars)))
    .collect::<Vec<_>>()
    .join("\n       OR ");

  format!(
    r#"
    SELECT
        D.CPF_DEV,
        D.CONTRATO_FIN,
        D.VALORPRIN_FIN,
        D.VALOR_FIN,
        D.DTDEVOL_FIN,
        D.ATRASO_FIN,
        D.COD_CLI,
        D.COD_CAR,
        D.STATCONT_FIN,
        C.DESC_CAR
    FROM CAD_DEVF D
    INNER JOIN CAD_CAR C WITH (NOLOCK) ON D.COD_CLI = C.COD_CLI AND D.COD_CAR = C.COD_CAR
    WHERE {filter}
    "#
  )
}

/// Robot-dialer daily aggregates
pub fn trestto_query(start: NaiveDate, end: NaiveDate) -> String {
  format!(
    r#"
    SELECT
        DATA,
        CPF,
        SUBSTATUSURA,
        'ROBÔ' TIPO,
        DISCAGEM,
        ALO,
        CPC,
        CPCA,
        PROMESSA
    FROM DISCAGENS_TRESTTO
    WHERE DATA BETWEEN '{start}' AND '{end}'
    "#,
    start = sql_date(start),
    end = sql_date(end),
  )
}

/// First and last calendar day of the month containing `date`
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
  let first = date.with_day(1).unwrap_or(date);
  let next_month = if first.month() == 12 {
    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
  } else {
    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
  };
  let last = next_month.map(|n| n - Duration::days(1)).unwrap_or(date);
  (first, last)
}

static DT_INI: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"DECLARE @DT_INI AS DATE = '\d{4}-\d{2}-\d{2}'").unwrap());
static DT_FIM: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"DECLARE @DT_FIM AS DATE = '\d{4}-\d{2}-\d{2}'").unwrap());
static DT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"DECLARE @DT\s+AS DATE = '\d{4}-\d{2}-\d{2}'").unwrap());
static DT2: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"DECLARE @DT2\s+AS DATE = '\d{4}-\d{2}-\d{2}'").unwrap());

/// Point the operational-times template at `date`.
///
/// Rewrites `@DT_INI`/`@DT_FIM` to the month bounds and `@DT`/`@DT2` to the
/// date itself. Any date already present in those declarations is replaced,
/// so a template saved after an earlier run still works.
pub fn render_tempos_template(template: &str, date: NaiveDate) -> String {
  let (first, last) = month_bounds(date);
  let day = sql_date(date);

  let sql = DT_INI.replace_all(
    template,
    NoExpand(&format!("DECLARE @DT_INI AS DATE = '{}'", sql_date(first))),
  );
  let sql =
    DT_FIM.replace_all(&sql, NoExpand(&format!("DECLARE @DT_FIM AS DATE = '{}'", sql_date(last))));
  let sql = DT.replace_all(&sql, NoExpand(&format!("DECLARE @DT     AS DATE = '{day}'")));
  let sql = DT2.replace_all(&sql, NoExpand(&format!("DECLARE @DT2    AS DATE = '{day}'")));
  sql.into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn test_source_table_is_zero_padded() {
    assert_eq!(source_table_for(date(2025, 3, 15)), "totalinfo_2025_03");
    assert_eq!(source_table_for(date(2025, 11, 1)), "totalinfo_2025_11");
  }

  #[test]
  fn test_discagens_query_contains_dates_and_table() {
    let sql = discagens_query(date(2025, 9, 1), date(2025, 9, 30));
    assert!(sql.contains("'2025-09-01'"));
    assert!(sql.contains("'2025-09-30'"));
    assert!(sql.contains("FROM totalinfo_2025_09 A"));
    assert!(sql.contains("OPENQUERY (EXPERT,"));
    assert!(sql.contains("G.ID_CAMPANHA IN (19, 30)"));
  }

  #[test]
  fn test_discagens_table_follows_start_date() {
    let sql = discagens_query(date(2024, 12, 31), date(2025, 1, 2));
    assert!(sql.contains("totalinfo_2024_12"));
    assert!(!sql.contains("totalinfo_2025_01"));
  }

  #[test]
  fn test_mailing_hist_query() {
    let sql = mailing_hist_query(date(2025, 10, 1), date(2025, 10, 7));
    assert!(sql.contains("FROM MAILING_HIST"));
    assert!(sql.contains("BETWEEN '2025-10-01' AND '2025-10-07'"));
    assert!(sql.contains("COD_CLI IN (196, 198, 228)"));
  }

  #[test]
  fn test_cad_devf_query_filters_product_portfolios() {
    let sql = cad_devf_query();
    assert!(sql.contains("(D.COD_CLI = 228 AND D.COD_CAR IN (2))"));
    assert!(sql.contains("(D.COD_CLI = 198 AND D.COD_CAR IN (1, 2, 3))"));
    assert!(sql.contains("(D.COD_CLI = 196 AND D.COD_CAR IN (1, 3, 4))"));
    assert!(sql.contains("C.DESC_CAR"));
  }

  #[test]
  fn test_trestto_query() {
    let sql = trestto_query(date(2025, 10, 1), date(2025, 10, 1));
    assert!(sql.contains("FROM DISCAGENS_TRESTTO"));
    assert!(sql.contains("'ROBÔ' TIPO"));
    assert!(sql.contains("BETWEEN '2025-10-01' AND '2025-10-01'"));
  }

  #[test]
  fn test_month_bounds() {
    assert_eq!(month_bounds(date(2025, 2, 14)), (date(2025, 2, 1), date(2025, 2, 28)));
    assert_eq!(month_bounds(date(2024, 2, 29)), (date(2024, 2, 1), date(2024, 2, 29)));
    assert_eq!(month_bounds(date(2025, 12, 31)), (date(2025, 12, 1), date(2025, 12, 31)));
  }

  #[test]
  fn test_render_tempos_template_rewrites_all_declarations() {
    let template = "\
DECLARE @DT_INI AS DATE = '2025-01-01'
DECLARE @DT_FIM AS DATE = '2025-01-31'
DECLARE @DT     AS DATE = '2025-01-15'
DECLARE @DT2    AS DATE = '2025-01-15'
SELECT * FROM TEMPOS WHERE DATA = @DT";

    let sql = render_tempos_template(template, date(2025, 10, 18));
    let expected = "\
DECLARE @DT_INI AS DATE = '2025-10-01'
DECLARE @DT_FIM AS DATE = '2025-10-31'
DECLARE @DT     AS DATE = '2025-10-18'
DECLARE @DT2    AS DATE = '2025-10-18'
SELECT * FROM TEMPOS WHERE DATA = @DT";
    assert_eq!(sql, expected);
  }

  #[test]
  fn test_render_tempos_template_tolerates_spacing() {
    let template = "DECLARE @DT AS DATE = '2020-01-01'\nDECLARE @DT2 AS DATE = '2020-01-01'";
    let sql = render_tempos_template(template, date(2025, 10, 5));
    assert!(sql.contains("DECLARE @DT     AS DATE = '2025-10-05'"));
    assert!(sql.contains("DECLARE @DT2    AS DATE = '2025-10-05'"));
  }

  #[test]
  fn test_render_tempos_template_leaves_other_text() {
    let template = "SELECT 1";
    assert_eq!(render_tempos_template(template, date(2025, 10, 5)), "SELECT 1");
  }
}
