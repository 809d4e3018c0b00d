//! Shared test infrastructure for integration tests.
//!
//! A [`TestFixture`] owns a temp directory holding the idea store, the
//! invocation log, and staged model replies. The binary runs against
//! `tests/mock-lm.sh`, which answers each prompt with the staged reply for
//! the response key the prompt asks for.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub struct TestFixture {
    temp_dir: TempDir,
}

/// Exit status and decoded streams of one run.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }
}

impl From<Output> for RunResult {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

impl TestFixture {
    pub fn setup() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        std::fs::create_dir_all(temp_dir.path().join("responses")).expect("create responses dir");
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.root().join("data").join("ideas.json")
    }

    pub fn lm_log_path(&self) -> PathBuf {
        self.root().join("data").join("lm_log.jsonl")
    }

    /// Stage the reply for prompts asking for `key`.
    pub fn respond(&self, key: &str, reply: &Value) {
        let path = self.root().join("responses").join(format!("{key}.json"));
        std::fs::write(path, reply.to_string()).expect("stage reply");
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, contents).expect("write fixture file");
        path
    }

    fn lm_command(&self) -> String {
        let script = manifest_dir().join("tests").join("mock-lm.sh");
        format!(
            "sh '{}' '{}'",
            script.display(),
            self.root().join("responses").display()
        )
    }

    /// Build a command with the mock model and an isolated environment.
    pub fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_incubator"));
        command
            .env("XDG_CONFIG_HOME", self.root().join("config"))
            .env("XDG_DATA_HOME", self.root().join("xdg-data"))
            .env_remove("INCUBATOR_LM_COMMAND")
            .env_remove("INCUBATOR_LOG")
            .arg("--store")
            .arg(self.store_path());
        command
    }

    pub fn run(&self, args: &[&str]) -> RunResult {
        let mut command = self.command();
        command
            .current_dir(self.root())
            .arg("--lm")
            .arg(self.lm_command())
            .args(args);
        command.output().expect("run incubator").into()
    }

    pub fn lm_log(&self) -> Vec<Value> {
        let Ok(text) = std::fs::read_to_string(self.lm_log_path()) else {
            return Vec::new();
        };
        text.lines()
            .map(|line| serde_json::from_str(line).expect("lm_log line is JSON"))
            .collect()
    }
}
