//! Stateless line windows over a file, re-read on every request.

use crate::error::Result;
use crate::reader::read_lines;
use serde::Serialize;
use std::path::Path;

/// A contiguous slice `[offset, offset + limit)` of a file's current lines.
///
/// `total` is recomputed on every read and is advisory: the file may have
/// grown since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineWindow {
    pub lines: Vec<String>,
    pub total: usize,
    pub offset: usize,
    pub limit: i64,
}

/// Reads `path` and returns the requested window.
///
/// A negative offset behaves as zero, an offset past the end yields an empty
/// window, and a window running past the end is cut to the available tail.
pub async fn read_window<P: AsRef<Path>>(path: P, offset: i64, limit: i64) -> Result<LineWindow> {
    let lines = read_lines(path.as_ref()).await?;
    Ok(window(lines, offset, limit))
}

fn window(lines: Vec<String>, offset: i64, limit: i64) -> LineWindow {
    let total = lines.len();
    let (start, end) = window_bounds(total, offset, limit);

    let lines = lines.into_iter().skip(start).take(end - start).collect();
    LineWindow {
        lines,
        total,
        offset: start,
        limit,
    }
}

fn window_bounds(total: usize, offset: i64, limit: i64) -> (usize, usize) {
    let start = usize::try_from(offset.max(0)).unwrap_or(usize::MAX).min(total);
    let len = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    let end = start.saturating_add(len).min(total);
    (start, end)
}
