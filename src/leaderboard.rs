use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MAX_PLAYER_NAME_CHARS;

const APP_DIR_NAME: &str = "snake-arcade";
const LEADERBOARD_FILE_NAME: &str = "leaderboard.json";

/// One finished game. Records are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub player_name: String,
    pub score: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("leaderboard data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("player name must be 1 to 20 characters")]
    InvalidName,
    #[error("leaderboard store is unavailable")]
    Unavailable,
}

/// Append-only score storage.
pub trait ScoreStore {
    fn append(&mut self, record: ScoreRecord) -> Result<(), LeaderboardError>;

    /// Every stored record, in no particular order.
    fn records(&self) -> Result<Vec<ScoreRecord>, LeaderboardError>;
}

/// Returns the platform-correct leaderboard file path.
#[must_use]
pub fn leaderboard_path() -> PathBuf {
    let mut base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push(APP_DIR_NAME);
    base.push(LEADERBOARD_FILE_NAME);
    base
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LeaderboardFile {
    scores: Vec<ScoreRecord>,
}

/// Stores records as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<LeaderboardFile, LeaderboardError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LeaderboardFile::default()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&raw)?)
    }
}

impl ScoreStore for JsonFileStore {
    fn append(&mut self, record: ScoreRecord) -> Result<(), LeaderboardError> {
        let mut file = self.load()?;
        file.scores.push(record);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn records(&self) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        Ok(self.load()?.scores)
    }
}

/// In-process store, optionally failing on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<ScoreRecord>,
    pub fail_appends: bool,
    pub fail_reads: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_records(records: Vec<ScoreRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }
}

impl ScoreStore for MemoryStore {
    fn append(&mut self, record: ScoreRecord) -> Result<(), LeaderboardError> {
        if self.fail_appends {
            return Err(LeaderboardError::Unavailable);
        }
        self.records.push(record);
        Ok(())
    }

    fn records(&self) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        if self.fail_reads {
            return Err(LeaderboardError::Unavailable);
        }
        Ok(self.records.clone())
    }
}

/// Trims `raw` and checks it is a usable player name.
pub fn validate_player_name(raw: &str) -> Result<String, LeaderboardError> {
    let name = raw.trim();
    let chars = name.chars().count();
    if chars == 0 || chars > MAX_PLAYER_NAME_CHARS {
        return Err(LeaderboardError::InvalidName);
    }
    Ok(name.to_owned())
}

/// Aggregates over every stored game.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct LeaderboardStats {
    pub total_games: usize,
    pub total_players: usize,
    pub highest_score: u32,
    /// Mean score rounded to the nearest integer.
    pub average_score: u32,
}

impl LeaderboardStats {
    #[must_use]
    pub fn from_records(records: &[ScoreRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let players: HashSet<&str> = records.iter().map(|r| r.player_name.as_str()).collect();
        let total: u64 = records.iter().map(|r| u64::from(r.score)).sum();
        let average = (total as f64 / records.len() as f64).round() as u32;

        Self {
            total_games: records.len(),
            total_players: players.len(),
            highest_score: records.iter().map(|r| r.score).max().unwrap_or(0),
            average_score: average,
        }
    }
}

/// What a submission attempt did.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SubmitOutcome {
    Saved,
    /// This game's score is already stored.
    AlreadySubmitted,
    /// Zero-point games are not recorded.
    Skipped,
}

/// Once-per-game submission plus ranked queries over a [`ScoreStore`].
#[derive(Debug)]
pub struct ScoreGateway<S> {
    store: S,
    submitted: bool,
}

impl<S: ScoreStore> ScoreGateway<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            submitted: false,
        }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn has_submitted(&self) -> bool {
        self.submitted
    }

    /// Arms the guard for the next game.
    pub fn reset(&mut self) {
        self.submitted = false;
    }

    /// Stores the final score of the current game at most once.
    ///
    /// On failure the guard is released so the caller may retry.
    pub fn submit(
        &mut self,
        player_name: &str,
        score: u32,
        at: DateTime<Utc>,
    ) -> Result<SubmitOutcome, LeaderboardError> {
        if self.submitted {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }
        if score == 0 {
            return Ok(SubmitOutcome::Skipped);
        }

        let player_name = validate_player_name(player_name)?;
        self.submitted = true;

        let record = ScoreRecord {
            player_name,
            score,
            created_at: at,
        };
        match self.store.append(record) {
            Ok(()) => {
                tracing::info!(score, "score submitted");
                Ok(SubmitOutcome::Saved)
            }
            Err(error) => {
                self.submitted = false;
                tracing::warn!(%error, "score submission failed");
                Err(error)
            }
        }
    }

    /// Every record, highest score first; ties keep the earlier game first.
    pub fn ranked(&self) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        let mut records = self.store.records()?;
        records.sort_by(|a, b| b.score.cmp(&a.score).then(a.created_at.cmp(&b.created_at)));
        Ok(records)
    }

    pub fn query_top(&self, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        self.query_page(0, n)
    }

    /// `limit` ranked records starting at rank `offset` (zero-based).
    pub fn query_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        Ok(self.ranked()?.into_iter().skip(offset).take(limit).collect())
    }

    pub fn query_all(&self) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        self.store.records()
    }

    pub fn stats(&self) -> Result<LeaderboardStats, LeaderboardError> {
        Ok(LeaderboardStats::from_records(&self.query_all()?))
    }
}
