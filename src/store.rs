//! Flat JSON store for saved ideas.
//!
//! The whole store is one file rewritten atomically on every save. Flows
//! never touch it; the CLI decides what gets persisted.
use crate::flows::{BusinessProposal, DevelopmentGuide, IdeaRefinement, SafetyAnalysis};
use crate::util::now_epoch_ms;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedIdea {
    pub id: String,
    pub title: String,
    pub original_idea: String,
    pub created_at_epoch_ms: u64,
    pub refinement: IdeaRefinement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<SafetyAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide: Option<DevelopmentGuide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal: Option<BusinessProposal>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreFile {
    schema_version: u32,
    #[serde(default)]
    ideas: Vec<SavedIdea>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    schema_version: u32,
    ideas: &'a [SavedIdea],
}

/// Saved ideas backed by a JSON file.
#[derive(Debug)]
pub struct IdeaStore {
    path: PathBuf,
    ideas: Vec<SavedIdea>,
}

impl IdeaStore {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                ideas: Vec::new(),
            });
        }
        let bytes = fs::read(path).with_context(|| format!("read store {}", path.display()))?;
        let file: StoreFile = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse store {}", path.display()))?;
        if file.schema_version != STORE_SCHEMA_VERSION {
            return Err(anyhow!(
                "unsupported store schema_version {} (expected {})",
                file.schema_version,
                STORE_SCHEMA_VERSION
            ));
        }
        Ok(Self {
            path: path.to_path_buf(),
            ideas: file.ideas,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ideas(&self) -> &[SavedIdea] {
        &self.ideas
    }

    pub fn get(&self, id: &str) -> Option<&SavedIdea> {
        self.ideas.iter().find(|idea| idea.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SavedIdea> {
        self.ideas.iter_mut().find(|idea| idea.id == id)
    }

    /// Like [`IdeaStore::get`], but a missing id is an error.
    pub fn require(&self, id: &str) -> Result<&SavedIdea> {
        self.get(id).ok_or_else(|| anyhow!("no saved idea with id {id:?}"))
    }

    pub fn require_mut(&mut self, id: &str) -> Result<&mut SavedIdea> {
        self.get_mut(id)
            .ok_or_else(|| anyhow!("no saved idea with id {id:?}"))
    }

    /// Add a refined idea and return its new id.
    pub fn insert(
        &mut self,
        title: &str,
        original_idea: &str,
        refinement: IdeaRefinement,
    ) -> String {
        let created_at_epoch_ms = now_epoch_ms();
        let id = self.unique_id(created_at_epoch_ms);
        self.ideas.push(SavedIdea {
            id: id.clone(),
            title: title.to_string(),
            original_idea: original_idea.to_string(),
            created_at_epoch_ms,
            refinement,
            safety: None,
            guide: None,
            proposal: None,
        });
        id
    }

    pub fn remove(&mut self, id: &str) -> Option<SavedIdea> {
        let index = self.ideas.iter().position(|idea| idea.id == id)?;
        Some(self.ideas.remove(index))
    }

    fn unique_id(&self, created_at_epoch_ms: u64) -> String {
        let base = format!("idea-{created_at_epoch_ms}");
        let mut id = base.clone();
        let mut suffix = 1;
        while self.get(&id).is_some() {
            suffix += 1;
            id = format!("{base}-{suffix}");
        }
        id
    }

    /// Persist the store, replacing the file atomically.
    pub fn save(&self) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).with_context(|| format!("create {}", parent.display()))?;

        let file = StoreFileRef {
            schema_version: STORE_SCHEMA_VERSION,
            ideas: &self.ideas,
        };
        let bytes = serde_json::to_vec_pretty(&file).context("serialize store")?;
        let mut staged = tempfile::NamedTempFile::new_in(&parent)
            .with_context(|| format!("stage store in {}", parent.display()))?;
        staged.write_all(&bytes).context("write staged store")?;
        staged.write_all(b"\n").context("write staged store")?;
        staged
            .persist(&self.path)
            .with_context(|| format!("replace store {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), ideas = self.ideas.len(), "store saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
