//! Stored filename handling for uploads.

use std::{io, path::Path};

use tokio::fs::{File, OpenOptions};

/// Upper bound on `name_N.ext` candidates tried before giving up.
const MAX_CANDIDATES: usize = 10_000;

/// Reduce a client supplied filename to its final path component.
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return None;
    }
    Some(cleaned.to_string())
}

/// Whether `name` can be joined onto the upload directory as-is.
pub fn is_plain_name(name: &str) -> bool {
    sanitize_filename(name).as_deref() == Some(name)
}

/// Split into stem and extension (with its dot). Dot files have no extension.
pub fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// `name.ext` for `n == 0`, otherwise `name_n.ext`.
pub fn candidate(name: &str, n: usize) -> String {
    if n == 0 {
        return name.to_string();
    }
    let (stem, ext) = split_ext(name);
    format!("{stem}_{n}{ext}")
}

/// Claim the first free candidate name in `dir` by creating it exclusively.
/// Concurrent uploads of the same name therefore never share a file.
pub async fn reserve_unique(dir: &Path, name: &str) -> io::Result<(String, File)> {
    for n in 0..MAX_CANDIDATES {
        let stored = candidate(name, n);
        match OpenOptions::new().write(true).create_new(true).open(dir.join(&stored)).await {
            Ok(file) => return Ok((stored, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(io::ErrorKind::AlreadyExists, format!("no free name left for {name}")))
}
