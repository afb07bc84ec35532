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
//! # ouze-loaders
//!
//! Reporting jobs built on top of the SQL Server executor: dataframe
//! enrichment for dialing, mailing and devolution data, robot-dialer
//! reconciliation, CSV export and the incremental operational-times backfill.
//!
//! ## Example
//!
//! ```ignore
//! use ouze_loaders::prelude::*;
//! use ouze_loaders::tempos_loader::{yesterday, TemposLoader, TemposLoaderInput};
//!
//! let context = LoaderContext::new(executor, LoaderConfig::default());
//! let report = TemposLoader.load(&context, TemposLoaderInput {
//!   sql_path: "tempos.sql".into(),
//!   output_dir: "out".into(),
//!   target: yesterday(),
//!   backfill_start: None,
//! }).await?;
//! println!("{report}");
//! ```

mod columns;
pub mod csv_writer;
pub mod devolucoes;
pub mod discagens;
pub mod error;
pub mod execution_report;
pub mod loader;
pub mod mailing_hist;
pub mod tempos_loader;
pub mod trestto;

pub use error::{LoaderError, LoaderResult};
pub use execution_report::{DateOutcome, ExecutionReport, ExecutionStatus, ReportTotals};
pub use loader::{DataLoader, LoaderConfig, LoaderContext};

// Re-export loaders
pub use devolucoes::{DevolucoesLoader, DevolucoesLoaderInput, DevolucoesLoaderOutput};
pub use discagens::{DiscagensLoader, DiscagensLoaderInput, DiscagensLoaderOutput};
pub use mailing_hist::{MailingHistLoader, MailingHistLoaderInput, MailingHistLoaderOutput};
pub use tempos_loader::{TemposLoader, TemposLoaderInput};
pub use trestto::{TresttoLoader, TresttoLoaderInput, TresttoLoaderOutput};

// Prelude for convenient imports
pub mod prelude {
  pub use crate::{
    DataLoader, ExecutionReport, ExecutionStatus, LoaderConfig, LoaderContext, LoaderError,
    LoaderResult,
  };
}
