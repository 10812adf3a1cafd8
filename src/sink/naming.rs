//! Rolled file naming
//!
//! A base path `dir/app.log` rolls to `dir/app_2024-01-02.log`. If that name
//! is taken the first free `dir/app_2024-01-02(1).log`, `(2)`, ... is used.
//! The name is always derived from the base path, never from a previously
//! rolled name, and an existing file is never reused.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::utils::file_date_suffix;

/// Split the file name at its last dot
///
/// A name that is only an extension, such as `.log`, has an empty stem.
fn split_base(base: &Path) -> (String, Option<String>) {
    let name = match base.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return ("log".to_string(), None),
    };

    match name.rfind('.') {
        Some(dot) => (name[..dot].to_string(), Some(name[dot + 1..].to_string())),
        None => (name, None),
    }
}

fn with_ext(name: String, ext: &Option<String>) -> String {
    match ext {
        Some(ext) => format!("{}.{}", name, ext),
        None => name,
    }
}

/// First unused rolled name for `base` on `date`
///
/// `exists` decides whether a candidate is taken, which keeps the naming
/// deterministic for a given set of existing files.
pub fn rolled_file_name<F>(base: &Path, date: NaiveDate, exists: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let (stem, ext) = split_base(base);
    let dated = format!("{}{}", stem, file_date_suffix(date));

    let candidate = base.with_file_name(with_ext(dated.clone(), &ext));
    if !exists(&candidate) {
        return candidate;
    }

    let mut version: u64 = 1;
    loop {
        let candidate = base.with_file_name(with_ext(format!("{}({})", dated, version), &ext));
        if !exists(&candidate) {
            return candidate;
        }
        version += 1;
    }
}

/// Parse `_YYYY-MM-DD` or `_YYYY-MM-DD(n)` into its date text and version
fn parse_roll_suffix(rest: &str) -> Option<(String, u64)> {
    let rest = rest.strip_prefix('_')?;
    let date = rest.get(..10)?;
    let tail = rest.get(10..)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;

    if tail.is_empty() {
        return Some((date.to_string(), 0));
    }

    let version = tail.strip_prefix('(')?.strip_suffix(')')?.parse().ok()?;
    Some((date.to_string(), version))
}

/// The base file and all files rolled from it, oldest first
///
/// Rolled files are ordered by date, then by collision counter; the base file
/// (if present) comes first.
pub fn list_rolled_files<P: AsRef<Path>>(base: P) -> io::Result<Vec<PathBuf>> {
    let base = base.as_ref();
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let (stem, ext) = split_base(base);
    let suffix = ext.as_ref().map(|e| format!(".{}", e)).unwrap_or_default();

    let mut rolled = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();

        let Some(middle) = name
            .strip_prefix(stem.as_str())
            .and_then(|rest| rest.strip_suffix(suffix.as_str()))
        else {
            continue;
        };

        if let Some(key) = parse_roll_suffix(middle) {
            rolled.push((key, base.with_file_name(&name)));
        }
    }

    rolled.sort_by(|a, b| a.0.cmp(&b.0));

    let mut files = Vec::with_capacity(rolled.len() + 1);
    if base.exists() {
        files.push(base.to_path_buf());
    }
    files.extend(rolled.into_iter().map(|(_, path)| path));
    Ok(files)
}
