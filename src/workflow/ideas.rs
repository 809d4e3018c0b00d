use super::Session;
use crate::cli::IdeasCommand;
use crate::store::SavedIdea;
use anyhow::{anyhow, Result};
use serde::Serialize;

/// One line of `ideas list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdeaSummary<'a> {
    id: &'a str,
    title: &'a str,
    created_at_epoch_ms: u64,
    market_potential_score: u8,
    has_safety: bool,
    has_guide: bool,
    has_proposal: bool,
}

impl<'a> From<&'a SavedIdea> for IdeaSummary<'a> {
    fn from(idea: &'a SavedIdea) -> Self {
        Self {
            id: &idea.id,
            title: &idea.title,
            created_at_epoch_ms: idea.created_at_epoch_ms,
            market_potential_score: idea.refinement.market_potential_score,
            has_safety: idea.safety.is_some(),
            has_guide: idea.guide.is_some(),
            has_proposal: idea.proposal.is_some(),
        }
    }
}

pub fn run_ideas(session: &Session, command: IdeasCommand) -> Result<()> {
    match command {
        IdeasCommand::List => {
            let store = session.open_store()?;
            let summaries: Vec<IdeaSummary<'_>> =
                store.ideas().iter().map(IdeaSummary::from).collect();
            session.print(&summaries)
        }
        IdeasCommand::Show { id } => {
            let store = session.open_store()?;
            session.print(store.require(&id)?)
        }
        IdeasCommand::Delete { id } => {
            let mut store = session.open_store()?;
            let removed = store
                .remove(&id)
                .ok_or_else(|| anyhow!("no saved idea with id {id:?}"))?;
            store.save()?;
            session.print(&serde_json::json!({ "deleted": removed.id }))
        }
    }
}
