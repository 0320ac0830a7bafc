//! Persisted high-score leaderboard.
//!
//! Append-only JSON-lines store: every completed, named run appends one
//! immutable record; there are no updates and no de-duplication. The reader
//! returns the top N ordered by score (desc), time taken (asc), then creation
//! timestamp (asc).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Result type for leaderboard operations
pub type LeaderboardResult<T> = Result<T, LeaderboardError>;

#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("score store is not configured: {0}")]
    NotConfigured(String),

    #[error("score store access failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("score record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Timestamp as persisted. Older records stored a raw seconds/nanoseconds
/// pair; newer ones an RFC3339 string. Both decode; anything else degrades to
/// an "N/A" display without failing the fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StoredTimestamp {
    Rfc3339(String),
    Epoch {
        seconds: i64,
        #[serde(default)]
        nanoseconds: u32,
    },
}

impl StoredTimestamp {
    pub fn now() -> Self {
        StoredTimestamp::Rfc3339(Utc::now().to_rfc3339())
    }

    /// Millisecond epoch value, None if unparseable
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            StoredTimestamp::Rfc3339(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp_millis()),
            StoredTimestamp::Epoch {
                seconds,
                nanoseconds,
            } => Some(seconds * 1000 + i64::from(*nanoseconds) / 1_000_000),
        }
    }

    /// Calendar date for display, "N/A" if unparseable
    pub fn display_date(&self) -> String {
        self.to_millis()
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms))
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// A score record as persisted on disk. Fields are defaulted so that partial
/// records from older writers still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredScore {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub time_taken_ms: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<StoredTimestamp>,
}

/// A score record prepared for display
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreEntry {
    pub id: String,
    pub name: String,
    pub score: u32,
    pub time_taken_ms: Option<u64>,
    /// Calendar date derived from the stored timestamp, "N/A" when unavailable
    pub date: String,
    pub timestamp_millis: Option<i64>,
}

impl From<StoredScore> for ScoreEntry {
    fn from(stored: StoredScore) -> Self {
        let (date, timestamp_millis) = match &stored.timestamp {
            Some(ts) => (ts.display_date(), ts.to_millis()),
            None => ("N/A".to_string(), None),
        };
        ScoreEntry {
            id: stored.id,
            name: stored
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            score: stored.score,
            time_taken_ms: stored.time_taken_ms,
            date,
            timestamp_millis,
        }
    }
}

/// Format a time-taken value as MM:SS; zero, negative, or absent renders "N/A"
pub fn format_time_taken(ms: Option<i64>) -> String {
    match ms {
        Some(ms) if ms > 0 => {
            let total_seconds = ms / 1000;
            format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
        }
        _ => "N/A".to_string(),
    }
}

/// Leaderboard ordering: score descending, then time taken ascending, then
/// timestamp ascending; missing tie-breaker values sort last among ties.
fn compare_entries(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| compare_options(a.time_taken_ms, b.time_taken_ms))
        .then_with(|| compare_options(a.timestamp_millis, b.timestamp_millis))
}

fn compare_options<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// File-backed score store
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    path: PathBuf,
}

impl LeaderboardStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store path from the environment, defaulting next to the binary
    pub fn from_env() -> Self {
        let path = std::env::var("LEADERBOARD_PATH")
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|_| "leaderboard_scores.jsonl".to_string());
        Self::new(path)
    }

    fn check_configured(&self) -> LeaderboardResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(LeaderboardError::NotConfigured(
                "LEADERBOARD_PATH is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Append one immutable score record for a completed run
    pub async fn append(
        &self,
        name: &str,
        score: u32,
        time_taken_ms: u64,
    ) -> LeaderboardResult<ScoreEntry> {
        self.check_configured()?;

        let stored = StoredScore {
            id: ulid::Ulid::new().to_string(),
            name: Some(name.to_string()),
            score,
            time_taken_ms: Some(time_taken_ms),
            timestamp: Some(StoredTimestamp::now()),
        };

        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(id = %stored.id, score, "Score persisted");
        Ok(stored.into())
    }

    /// Top `limit` entries in leaderboard order. A missing store file is an
    /// empty leaderboard; corrupt records are logged and skipped.
    pub async fn top(&self, limit: usize) -> LeaderboardResult<Vec<ScoreEntry>> {
        self.check_configured()?;

        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries: Vec<ScoreEntry> = Vec::new();
        for (line_no, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredScore>(line) {
                Ok(stored) => entries.push(stored.into()),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = line_no + 1,
                        "Skipping corrupt score record: {}",
                        e
                    );
                }
            }
        }

        entries.sort_by(compare_entries);
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LeaderboardStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LeaderboardStore::new(dir.path().join("scores.jsonl"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_append_then_top_roundtrip() {
        let (_dir, store) = store();

        store.append("Alice", 1600, 65_000).await.unwrap();
        let top = store.top(10).await.unwrap();

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Alice");
        assert_eq!(top[0].score, 1600);
        assert_eq!(top[0].time_taken_ms, Some(65_000));
        assert_ne!(top[0].date, "N/A");
        assert!(top[0].timestamp_millis.is_some());
    }

    #[tokio::test]
    async fn test_ordering_score_then_time_then_timestamp() {
        let (_dir, store) = store();

        store.append("slow-low", 50, 1000).await.unwrap();
        store.append("fast-high", 80, 500).await.unwrap();
        store.append("slow-high", 80, 900).await.unwrap();

        let top = store.top(10).await.unwrap();
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["fast-high", "slow-high", "slow-low"]);
    }

    #[tokio::test]
    async fn test_timestamp_breaks_remaining_ties() {
        let (_dir, store) = store();

        let first = store.append("earlier", 80, 500).await.unwrap();
        let second = store.append("later", 80, 500).await.unwrap();
        assert!(first.timestamp_millis <= second.timestamp_millis);

        let top = store.top(10).await.unwrap();
        assert_eq!(top[0].name, "earlier");
        assert_eq!(top[1].name, "later");
    }

    #[tokio::test]
    async fn test_top_limits_result_count() {
        let (_dir, store) = store();
        for i in 0..15 {
            store.append(&format!("p{}", i), i * 10, 1000).await.unwrap();
        }

        let top = store.top(10).await.unwrap();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].score, 140);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_leaderboard() {
        let (_dir, store) = store();
        assert!(store.top(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let (_dir, store) = store();
        store.append("Alice", 100, 1000).await.unwrap();

        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(store.path.clone())
            .await
            .unwrap();
        file.write_all(b"{ not json }\n").await.unwrap();
        file.flush().await.unwrap();

        store.append("Bob", 200, 1000).await.unwrap();

        let top = store.top(10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Bob");
    }

    #[tokio::test]
    async fn test_legacy_epoch_timestamp_and_missing_fields() {
        let (_dir, store) = store();

        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(store.path.clone())
            .await
            .unwrap();
        // Seconds/nanoseconds pair, no name
        file.write_all(
            b"{\"id\": \"legacy1\", \"score\": 300, \"time_taken_ms\": 42000, \
              \"timestamp\": {\"seconds\": 1700000000, \"nanoseconds\": 500000000}}\n",
        )
        .await
        .unwrap();
        // No timestamp at all
        file.write_all(b"{\"id\": \"legacy2\", \"name\": \"Carol\", \"score\": 200}\n")
            .await
            .unwrap();
        file.flush().await.unwrap();

        let top = store.top(10).await.unwrap();
        assert_eq!(top.len(), 2);

        let legacy = top.iter().find(|e| e.id == "legacy1").unwrap();
        assert_eq!(legacy.name, "Anonymous");
        assert_eq!(legacy.timestamp_millis, Some(1_700_000_000_500));
        assert_ne!(legacy.date, "N/A");

        let bare = top.iter().find(|e| e.id == "legacy2").unwrap();
        assert_eq!(bare.date, "N/A");
        assert!(bare.timestamp_millis.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_store_is_a_distinct_error() {
        let store = LeaderboardStore::new("");
        let err = store.top(10).await.unwrap_err();
        assert!(matches!(err, LeaderboardError::NotConfigured(_)));
        let err = store.append("x", 1, 1).await.unwrap_err();
        assert!(matches!(err, LeaderboardError::NotConfigured(_)));
    }

    #[test]
    fn test_format_time_taken() {
        assert_eq!(format_time_taken(None), "N/A");
        assert_eq!(format_time_taken(Some(0)), "N/A");
        assert_eq!(format_time_taken(Some(-5)), "N/A");
        assert_eq!(format_time_taken(Some(65_000)), "01:05");
        assert_eq!(format_time_taken(Some(600_000)), "10:00");
        assert_eq!(format_time_taken(Some(999)), "00:00");
    }

    #[test]
    fn test_unparseable_rfc3339_degrades_to_na() {
        let ts = StoredTimestamp::Rfc3339("not a date".to_string());
        assert!(ts.to_millis().is_none());
        assert_eq!(ts.display_date(), "N/A");
    }
}
