//! Song types shared by the resolver and the external song-file parser
//!
//! The parser is an external collaborator: the adapter only depends on the
//! [`SongParser`] trait and the structured output it returns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Structured song object produced by a [`SongParser`]
///
/// `remote_source` and the media link slots are filled by the resolver after
/// parsing; a parser leaves them unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongMeta {
    pub artist: String,
    pub title: String,
    /// Header tags as read from the file, keys upper-cased
    pub headers: BTreeMap<String, String>,
    /// Body lines following the header block
    pub body: Vec<String>,
    /// Provenance tag naming the adapter that produced this song
    pub remote_source: Option<String>,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub cover: Option<String>,
    pub background: Option<String>,
}

impl SongMeta {
    pub fn header(&self, tag: &str) -> Option<&str> {
        self.headers.get(tag).map(String::as_str)
    }
}

/// Severity of a non-fatal parser finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// Non-fatal issue reported alongside a parsed song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongIssue {
    pub severity: IssueSeverity,
    pub message: String,
    /// 1-based line number in the song file, if known
    pub line: Option<usize>,
}

impl SongIssue {
    pub fn warning(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
            line,
        }
    }
}

/// Parser output: the song plus any warnings collected while parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSong {
    pub song: SongMeta,
    pub issues: Vec<SongIssue>,
}

/// Fatal parser failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("Cannot read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Missing #{tag} header in {path}")]
    MissingHeader { path: PathBuf, tag: String },

    #[error("Invalid song file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// External structured-song parser
///
/// Implementations read the song file written by the resolver and return the
/// structured song. Called on a blocking thread.
pub trait SongParser: Send + Sync {
    fn parse_file(&self, path: &Path) -> Result<ParsedSong, ParseError>;
}

/// Cached result of resolving one catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    /// Identifier inherited from the catalog record
    pub song_id: String,
    pub song: SongMeta,
    pub issues: Vec<SongIssue>,
}

impl ResolvedEntry {
    pub fn audio_link(&self) -> Option<&str> {
        self.song.audio.as_deref()
    }

    pub fn video_link(&self) -> Option<&str> {
        self.song.video.as_deref()
    }

    pub fn cover_link(&self) -> Option<&str> {
        self.song.cover.as_deref()
    }

    pub fn background_link(&self) -> Option<&str> {
        self.song.background.as_deref()
    }
}
