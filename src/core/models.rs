//! Core data models for a capture session

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Result of one successful download.
///
/// Created by the downloader, consumed by the session driver for reporting;
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DownloadOutcome {
    /// A fully written progressive file at the given local path.
    File(PathBuf),

    /// A saved HLS playlist plus the segment URLs extracted from it,
    /// in manifest order (duplicates preserved).
    Hls {
        playlist_path: PathBuf,
        segment_urls: Vec<String>,
    },
}

/// Terminal state of one download attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Succeeded,
    Exhausted,
}

/// A discovered HLS stream, kept for the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HlsStream {
    /// URL the playlist was fetched from.
    pub source_url: String,
    /// Local path of the saved playlist file.
    pub playlist_path: PathBuf,
    /// Absolute segment URLs in manifest order.
    pub segment_urls: Vec<String>,
}

/// Set of accepted video links with insertion-order iteration.
///
/// Membership is exact string equality; re-inserting an existing URL is a
/// no-op and does not disturb the order.
#[derive(Debug, Default)]
pub struct LinkSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a URL, returning true if it was not present before.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.seen.insert(url.to_string()) {
            self.ordered.push(url.to_string());
            true
        } else {
            false
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Iterates URLs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }
}

/// Mutable state of one capture run.
///
/// Created at session start, discarded at session end; all discovery-loop
/// side effects are confined to this struct.
#[derive(Debug)]
pub struct SessionContext {
    /// Accepted complete-video links, insertion-ordered.
    pub video_links: LinkSet,
    /// URLs whose download attempt sequence has completed (success or
    /// exhausted retries); guards against duplicate downloads.
    pub downloaded_urls: HashSet<String>,
    /// Monotonic counter used for collision-free local filenames.
    /// Starts at 1, incremented once per completed attempt sequence.
    pub file_counter: u64,
    /// Local paths of fully downloaded progressive files.
    pub video_files: Vec<PathBuf>,
    /// Discovered HLS streams.
    pub hls_streams: Vec<HlsStream>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            video_links: LinkSet::new(),
            downloaded_urls: HashSet::new(),
            file_counter: 1,
            video_files: Vec::new(),
            hls_streams: Vec::new(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
