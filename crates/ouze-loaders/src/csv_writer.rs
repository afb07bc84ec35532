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
//! CSV export of enriched frames
//!
//! Extracts are opened by spreadsheet users, so they carry a UTF-8 BOM and
//! use `;` as separator. Files are written next to their destination under a
//! `.tmp` name and renamed into place once complete.

use crate::{LoaderConfig, LoaderError, LoaderResult};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

fn tmp_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}

/// Write `df` to `path`, returning the number of data rows written
pub fn write_csv(df: &mut DataFrame, path: &Path, config: &LoaderConfig) -> LoaderResult<usize> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }

  let tmp = tmp_path(path);
  let written = write_to(df, &tmp, config).and_then(|rows| {
    fs::rename(&tmp, path)
      .map_err(|e| LoaderError::IoError(format!("rename to {} failed: {e}", path.display())))?;
    Ok(rows)
  });

  if written.is_err() {
    // Never leave a partial file behind
    let _ = fs::remove_file(&tmp);
  }

  let rows = written?;
  debug!("Wrote {} rows to {}", rows, path.display());
  Ok(rows)
}

fn write_to(df: &mut DataFrame, path: &Path, config: &LoaderConfig) -> LoaderResult<usize> {
  let mut file = File::create(path)?;
  CsvWriter::new(&mut file)
    .include_bom(config.include_bom)
    .include_header(true)
    .with_separator(config.csv_separator)
    .finish(df)?;
  file.flush()?;
  Ok(df.height())
}
