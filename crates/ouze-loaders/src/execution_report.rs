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
//! Per-date record of an incremental run

use crate::LoaderResult;
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

const RULE_WIDTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
  /// File written
  Success,
  /// Query returned no rows, no file written
  NoData,
  /// Query or write failed
  Error,
}

impl ExecutionStatus {
  pub fn label(&self) -> &'static str {
    match self {
      ExecutionStatus::Success => "SUCESSO",
      ExecutionStatus::NoData => "SEM_DADOS",
      ExecutionStatus::Error => "ERRO",
    }
  }
}

impl fmt::Display for ExecutionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.label())
  }
}

/// Outcome of one pending date
#[derive(Debug, Clone, Serialize)]
pub struct DateOutcome {
  pub date: NaiveDate,
  pub status: ExecutionStatus,
  pub rows: usize,
  pub file: Option<PathBuf>,
  pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
  pub successes: usize,
  pub total_rows: usize,
  pub no_data: usize,
  pub errors: usize,
  pub dates_processed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
  pub started_at: DateTime<Local>,
  pub finished_at: Option<DateTime<Local>>,
  pub target: NaiveDate,
  pub last_processed: Option<NaiveDate>,
  pub outcomes: Vec<DateOutcome>,
}

impl ExecutionReport {
  pub fn new(target: NaiveDate, last_processed: Option<NaiveDate>) -> Self {
    Self { started_at: Local::now(), finished_at: None, target, last_processed, outcomes: Vec::new() }
  }

  pub fn record_success(&mut self, date: NaiveDate, rows: usize, file: PathBuf) {
    self.outcomes.push(DateOutcome {
      date,
      status: ExecutionStatus::Success,
      rows,
      file: Some(file),
      message: None,
    });
  }

  pub fn record_no_data(&mut self, date: NaiveDate) {
    self.outcomes.push(DateOutcome {
      date,
      status: ExecutionStatus::NoData,
      rows: 0,
      file: None,
      message: Some("Nenhum registro retornado".to_string()),
    });
  }

  /// `rows` is what had been fetched before the failure, if anything
  pub fn record_error(&mut self, date: NaiveDate, rows: usize, message: impl Into<String>) {
    self.outcomes.push(DateOutcome {
      date,
      status: ExecutionStatus::Error,
      rows,
      file: None,
      message: Some(message.into()),
    });
  }

  pub fn finish(&mut self) {
    self.finished_at = Some(Local::now());
  }

  pub fn duration_seconds(&self) -> f64 {
    let end = self.finished_at.unwrap_or_else(Local::now);
    (end - self.started_at).num_milliseconds() as f64 / 1000.0
  }

  pub fn is_up_to_date(&self) -> bool {
    self.outcomes.is_empty()
  }

  pub fn totals(&self) -> ReportTotals {
    let mut totals = ReportTotals { dates_processed: self.outcomes.len(), ..Default::default() };
    for outcome in &self.outcomes {
      match outcome.status {
        ExecutionStatus::Success => {
          totals.successes += 1;
          totals.total_rows += outcome.rows;
        }
        ExecutionStatus::NoData => totals.no_data += 1,
        ExecutionStatus::Error => totals.errors += 1,
      }
    }
    totals
  }

  pub fn has_errors(&self) -> bool {
    self.outcomes.iter().any(|o| o.status == ExecutionStatus::Error)
  }

  /// Pretty-printed JSON of the whole report
  pub fn to_json(&self) -> LoaderResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Plain-text report for the terminal
  pub fn render(&self) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    if self.is_up_to_date() {
      out.push_str(&format!("{rule}\nSISTEMA ATUALIZADO\n{rule}\n"));
      if let Some(last) = self.last_processed {
        out.push_str(&format!("Última data processada: {}\n", last.format("%d/%m/%Y")));
      }
      out.push_str("Não há datas pendentes para processar.\n");
      return out;
    }

    let end = self.finished_at.unwrap_or_else(Local::now);
    out.push_str(&format!("{rule}\nRELATÓRIO DE EXECUÇÃO\n{rule}\n"));
    out.push_str(&format!("Início: {}\n", self.started_at.format("%d/%m/%Y %H:%M:%S")));
    out.push_str(&format!("Fim: {}\n", end.format("%d/%m/%Y %H:%M:%S")));
    out.push_str(&format!("Duração: {:.2} segundos\n{rule}\n\n", self.duration_seconds()));

    out.push_str(&format!(
      "{:<15} {:<15} {:<12} {:<40} {}\n",
      "DATA", "STATUS", "REGISTROS", "ARQUIVO", "OBSERVAÇÃO"
    ));
    out.push_str(&format!("{}\n", "-".repeat(RULE_WIDTH)));

    for outcome in &self.outcomes {
      let file = outcome
        .file
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "-".to_string());
      out.push_str(&format!(
        "{:<15} {:<15} {:<12} {:<40} {}\n",
        outcome.date.format("%d/%m/%Y").to_string(),
        outcome.status.label(),
        outcome.rows,
        file,
        outcome.message.as_deref().unwrap_or("")
      ));
    }

    let totals = self.totals();
    out.push_str(&format!("{rule}\n\nRESUMO:\n"));
    out.push_str(&format!("   Arquivos gerados com sucesso: {}\n", totals.successes));
    if totals.successes > 0 {
      out.push_str(&format!("      Total de registros: {}\n", totals.total_rows));
    }
    if totals.no_data > 0 {
      out.push_str(&format!("   Datas sem dados (arquivo não criado): {}\n", totals.no_data));
    }
    if totals.errors > 0 {
      out.push_str(&format!("   Erros: {}\n", totals.errors));
    }
    out.push_str(&format!("   Total de datas processadas: {}\n", totals.dates_processed));
    out
  }
}

impl fmt::Display for ExecutionReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.render())
  }
}
