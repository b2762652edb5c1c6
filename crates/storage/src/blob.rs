// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filename-addressed storage for large job payloads.
//!
//! Blobs are named `{job_id}.{suffix}`. Job ids may contain characters that
//! are not valid in a single path component (`rpt/1`), so names are escaped
//! when mapped to files; the logical name stays unescaped.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rj_core::JobId;

/// Kind of offloaded payload; determines the blob suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlobKind {
    Pdf,
    RawDocument,
    Html,
    EmailHtml,
    CssInlining,
    ErrorInfo,
    Stdout,
    /// Output streamed while the job runs: one JSON string per line, appended
    RunOutput,
}

rj_core::simple_display! {
    BlobKind {
        Pdf => "pdf",
        RawDocument => "raw-document",
        Html => "html",
        EmailHtml => "email-html",
        CssInlining => "css-inlining",
        ErrorInfo => "error-info",
        Stdout => "stdout",
        RunOutput => "run-output",
    }
}

impl BlobKind {
    pub fn blob_name(self, job_id: &JobId) -> String {
        job_id.blob_name(self.as_str())
    }
}

/// Directory of blobs.
#[derive(Debug, Clone)]
pub struct BlobArea {
    dir: PathBuf,
}

impl BlobArea {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a blob atomically (temp file + rename).
    pub fn put(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path(name);
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)
    }

    /// Append to a blob, creating it when missing. Not synced.
    pub fn append(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let mut file = fs::OpenOptions::new().create(true).append(true).open(self.path(name))?;
        file.write_all(bytes)
    }

    /// Read a blob; `None` when it does not exist.
    pub fn get(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove a blob. Returns whether it existed.
    pub fn remove(&self, name: &str) -> io::Result<bool> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(escape(name))
    }
}

/// Percent-escape everything outside `[A-Za-z0-9._-]`.
fn escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
