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
//! # ouze-core
//!
//! Configuration, errors and classification tables shared by the Ouze
//! reporting jobs.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DatabaseConfig, SqlCredentials, TemposConfig};
pub use error::{Error, Result};

/// Linked server that hosts the dialer's monthly `totalinfo_*` tables
pub const DIALER_LINKED_SERVER: &str = "EXPERT";

/// Dialer campaigns whose groups are extracted
pub const DIALER_CAMPAIGNS: &[i64] = &[19, 30];

/// Date format used inside SQL literals
pub const SQL_DATE_FORMAT: &str = "%Y-%m-%d";
