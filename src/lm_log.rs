//! Flow invocation log.
//!
//! Every flow the CLI runs appends one entry to `lm_log.jsonl` next to the
//! idea store:
//!
//! ```jsonl
//! {"schema_version":1,"ts":1707900000000,"seq":1,"flow":"refine-idea","duration_ms":4200,"outcome":"success",...}
//! {"schema_version":1,"ts":1707900060000,"seq":2,"flow":"translate","duration_ms":900,"outcome":"failed",...}
//! ```
//!
//! With `--verbose`, full prompts and responses are stored in
//! `lm_log/NNN_<flow>_prompt.txt` and `lm_log/NNN_<flow>_response.txt`.
use crate::util::{now_epoch_ms, truncate_string};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const LM_LOG_SCHEMA_VERSION: u32 = 1;
const PROMPT_PREVIEW_BYTES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LmOutcome {
    Success,
    Failed,
}

impl std::fmt::Display for LmOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmLogEntry {
    pub schema_version: u32,

    /// Unix timestamp in milliseconds when the entry was written.
    pub ts: u64,

    /// Position in the log (1-indexed).
    pub seq: u32,

    pub flow: String,

    pub duration_ms: u64,

    pub outcome: LmOutcome,

    /// Failure message as shown to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Parse or validation reason behind a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// First ~500 bytes of the prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_preview: Option<String>,
}

/// Locations of the log file and the verbose content directory.
#[derive(Debug, Clone)]
pub struct LmLogPaths {
    root: PathBuf,
}

impl LmLogPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Log alongside the store file.
    pub fn beside(store_path: &Path) -> Self {
        let root = store_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("lm_log.jsonl")
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join("lm_log")
    }
}

/// Builder for log entries with timing.
pub struct LmLogBuilder {
    start: Instant,
    seq: u32,
    flow: String,
    duration: Option<Duration>,
    prompt_preview: Option<String>,
}

impl LmLogBuilder {
    pub fn new(seq: u32, flow: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            seq,
            flow: flow.into(),
            duration: None,
            prompt_preview: None,
        }
    }

    /// Record a duration measured by the caller instead of the builder's clock.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_prompt_preview(mut self, prompt: &str) -> Self {
        let preview = if prompt.len() > PROMPT_PREVIEW_BYTES {
            format!("{}...", truncate_string(prompt, PROMPT_PREVIEW_BYTES))
        } else {
            prompt.to_string()
        };
        self.prompt_preview = Some(preview);
        self
    }

    pub fn success(self) -> LmLogEntry {
        self.build(LmOutcome::Success, None, None)
    }

    pub fn failed(self, error: impl Into<String>, detail: Option<String>) -> LmLogEntry {
        self.build(LmOutcome::Failed, Some(error.into()), detail)
    }

    fn build(self, outcome: LmOutcome, error: Option<String>, detail: Option<String>) -> LmLogEntry {
        LmLogEntry {
            schema_version: LM_LOG_SCHEMA_VERSION,
            ts: now_epoch_ms(),
            seq: self.seq,
            flow: self.flow,
            duration_ms: self
                .duration
                .unwrap_or_else(|| self.start.elapsed())
                .as_millis() as u64,
            outcome,
            error,
            detail,
            prompt_preview: self.prompt_preview,
        }
    }
}

/// Append an entry to the log file.
pub fn append_lm_log(paths: &LmLogPaths, entry: &LmLogEntry) -> Result<()> {
    let log_path = paths.log_path();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("create directory for lm_log")?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open lm_log for append: {}", log_path.display()))?;

    let line = serde_json::to_string(entry).context("serialize lm_log entry")?;
    writeln!(file, "{line}").context("write lm_log entry")?;
    Ok(())
}

/// Store the full prompt and response for one entry.
pub fn store_lm_content(
    paths: &LmLogPaths,
    seq: u32,
    flow: &str,
    prompt: &str,
    response: &str,
) -> Result<()> {
    let content_dir = paths.content_dir();
    fs::create_dir_all(&content_dir).context("create lm_log directory")?;

    let prompt_path = content_dir.join(format!("{seq:03}_{flow}_prompt.txt"));
    let response_path = content_dir.join(format!("{seq:03}_{flow}_response.txt"));

    fs::write(&prompt_path, prompt)
        .with_context(|| format!("write prompt: {}", prompt_path.display()))?;
    fs::write(&response_path, response)
        .with_context(|| format!("write response: {}", response_path.display()))?;
    Ok(())
}

/// Load all entries, skipping corrupt lines.
pub fn load_lm_log(paths: &LmLogPaths) -> Result<Vec<LmLogEntry>> {
    let log_path = paths.log_path();
    if !log_path.exists() {
        return Ok(Vec::new());
    }

    let file =
        File::open(&log_path).with_context(|| format!("open lm_log: {}", log_path.display()))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read line {} of lm_log", line_num + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LmLogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                tracing::warn!(line = line_num + 1, %err, "skip corrupt lm_log entry");
            }
        }
    }

    Ok(entries)
}

pub fn next_sequence_number(paths: &LmLogPaths) -> Result<u32> {
    let entries = load_lm_log(paths)?;
    let max_seq = entries.iter().map(|entry| entry.seq).max().unwrap_or(0);
    Ok(max_seq + 1)
}
