//! High-score persistence — a single integer in a text file.
//!
//! A missing file means "no score yet", not an error, and a write failure
//! degrades to a warning so a read-only disk never aborts the run.

use std::fmt;
use std::fs;
use std::path::Path;

/// Failure while writing the score file.
#[derive(Debug)]
pub enum HighScoreError {
    Io(std::io::Error),
}

impl From<std::io::Error> for HighScoreError {
    fn from(e: std::io::Error) -> Self {
        HighScoreError::Io(e)
    }
}

impl fmt::Display for HighScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighScoreError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for HighScoreError {}

/// Read the saved best score. Missing or unparseable files read as 0.
pub fn load(path: &Path) -> u32 {
    match fs::read_to_string(path) {
        Ok(text) => text
            .split_whitespace()
            .next()
            .and_then(|token| token.parse().ok())
            .unwrap_or(0),
        Err(_) => 0,
    }
}

/// Persist a score, overwriting any previous value.
pub fn save(path: &Path, score: u32) -> Result<(), HighScoreError> {
    fs::write(path, format!("{}\n", score))?;
    Ok(())
}

/// Persist `score` when it beats `best`; returns the new best either way.
/// Write failures are logged and swallowed.
pub fn record(path: &Path, score: u32, best: u32) -> u32 {
    if score > best {
        if let Err(e) = save(path, score) {
            log::warn!("could not write high score to {}: {}", path.display(), e);
        }
        score
    } else {
        best
    }
}
