//! Command handlers.
//!
//! Each handler builds a flow input from its arguments (and the saved idea
//! when `--idea-id` is given), runs the flow once, records the invocation,
//! and prints the result as JSON.
mod ideas;
mod knowledge;

pub use ideas::run_ideas;

use crate::cli::{
    ChatArgs, GlobalArgs, GuideArgs, ImageArgs, InitConfigArgs, ProposalArgs, RefineArgs, RunArgs,
    SafetyArgs, TranslateArgs,
};
use crate::config::{
    build_model_client, default_config, default_config_path, default_store_path, load_config,
    resolve_model_source, validate_config, write_config, IncubatorConfig, LM_COMMAND_ENV,
};
use crate::flows::{
    run_flow, run_named, AnalyzeImage, AnalyzeImageInput, AnalyzeSafety, AnalyzeSafetyInput,
    ChatFlow, ChatInput, ChatMessage, Flow, FlowError, FlowKind, FlowRun, GenerateGuide,
    GenerateGuideInput, GenerateProposal, GenerateProposalInput, KnowledgeEntry, RefineIdea,
    RefineIdeaInput, Translate, TranslateInput,
};
use crate::lm::{InlineMedia, ModelClient};
use crate::lm_log::{
    append_lm_log, next_sequence_number, store_lm_content, LmLogBuilder, LmLogEntry, LmLogPaths,
};
use crate::store::IdeaStore;
use crate::util::{display_path, headline};
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const TITLE_MAX_BYTES: usize = 60;

/// Resolved settings for one CLI invocation.
pub struct Session {
    global: GlobalArgs,
    config: IncubatorConfig,
    store_path: PathBuf,
    log_paths: LmLogPaths,
}

impl Session {
    pub fn load(global: GlobalArgs) -> Result<Self> {
        let config = load_config(global.config.as_deref())?;
        let store_path = global
            .store
            .clone()
            .or_else(|| config.store_path.clone())
            .unwrap_or_else(default_store_path);
        let log_paths = LmLogPaths::beside(&store_path);
        Ok(Self {
            global,
            config,
            store_path,
            log_paths,
        })
    }

    fn verbose(&self) -> bool {
        self.global.verbose || self.config.verbose_log
    }

    fn client(&self) -> Result<Box<dyn ModelClient>> {
        let source = resolve_model_source(
            self.global.lm.as_deref(),
            &self.config,
            std::env::var(LM_COMMAND_ENV).ok(),
        )?;
        tracing::debug!(?source, "model source resolved");
        build_model_client(&source)
    }

    pub(crate) fn open_store(&self) -> Result<IdeaStore> {
        IdeaStore::open(&self.store_path)
    }

    pub(crate) fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        let text = if self.global.compact {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        }
        .context("serialize output")?;
        println!("{text}");
        Ok(())
    }

    /// Run one flow and record it in the invocation log.
    fn invoke<F: Flow>(
        &self,
        flow: &mut F,
        client: &dyn ModelClient,
        input: &F::Input,
    ) -> Result<F::Output> {
        self.logged(F::NAME, || run_flow(flow, client, input))
    }

    fn logged<T>(
        &self,
        flow: &str,
        call: impl FnOnce() -> Result<FlowRun<T>, FlowError>,
    ) -> Result<T> {
        let seq = next_sequence_number(&self.log_paths).unwrap_or_else(|err| {
            tracing::warn!(%err, "read lm_log failed; numbering from 1");
            1
        });
        let builder = LmLogBuilder::new(seq, flow);
        match call() {
            Ok(run) => {
                let entry = builder
                    .with_duration(run.duration)
                    .with_prompt_preview(&run.prompt)
                    .success();
                self.record(&entry);
                if self.verbose() {
                    if let Err(err) =
                        store_lm_content(&self.log_paths, seq, flow, &run.prompt, &run.raw_response)
                    {
                        tracing::warn!(%err, "store lm content failed");
                    }
                }
                Ok(run.output)
            }
            Err(err) => {
                let entry = builder.failed(err.to_string(), err.detail().map(str::to_string));
                self.record(&entry);
                Err(err.into())
            }
        }
    }

    fn record(&self, entry: &LmLogEntry) {
        if let Err(err) = append_lm_log(&self.log_paths, entry) {
            tracing::warn!(%err, "append lm_log failed");
        }
    }
}

pub fn run_refine(session: &Session, args: RefineArgs) -> Result<()> {
    let client = session.client()?;
    let mut rng = rand::thread_rng();
    let input = RefineIdeaInput {
        idea: args.idea.clone(),
    };
    let refinement = session.invoke(&mut RefineIdea::new(&mut rng), client.as_ref(), &input)?;
    if !args.save {
        return session.print(&refinement);
    }

    let mut store = session.open_store()?;
    let title = args
        .title
        .clone()
        .unwrap_or_else(|| headline(&args.idea, TITLE_MAX_BYTES));
    let safety_input = AnalyzeSafetyInput {
        idea: refinement.refined_idea.clone(),
    };
    let id = store.insert(&title, &args.idea, refinement);

    let safety = session.invoke(&mut AnalyzeSafety, client.as_ref(), &safety_input);
    let saved = store.require_mut(&id)?;
    let safety_err = match safety {
        Ok(analysis) => {
            saved.safety = Some(analysis);
            None
        }
        Err(err) => Some(err),
    };
    store.save()?;
    if let Some(err) = safety_err {
        return Err(err.context(format!("idea {id} saved without a safety analysis")));
    }
    let cwd = std::env::current_dir().ok();
    eprintln!("saved {id} to {}", display_path(store.path(), cwd.as_deref()));
    session.print(store.require(&id)?)
}

pub fn run_guide(session: &Session, args: GuideArgs) -> Result<()> {
    let mut store = match args.idea_id.as_deref() {
        Some(_) => Some(session.open_store()?),
        None => None,
    };
    let saved = match (&store, args.idea_id.as_deref()) {
        (Some(store), Some(id)) => Some(store.require(id)?),
        _ => None,
    };
    let input = GenerateGuideInput {
        refined_idea: pick(args.refined_idea, saved.map(|idea| &idea.refinement.refined_idea))?,
        associated_concepts: if args.concepts.is_empty() {
            saved
                .map(|idea| idea.refinement.associated_concepts.clone())
                .unwrap_or_default()
        } else {
            args.concepts
        },
        target_audience: args.audience,
        tech_stack_suggestion: args.tech_stack,
    };

    let client = session.client()?;
    let guide = session.invoke(&mut GenerateGuide, client.as_ref(), &input)?;
    if let (Some(store), Some(id)) = (store.as_mut(), args.idea_id.as_deref()) {
        store.require_mut(id)?.guide = Some(guide.clone());
        store.save()?;
    }
    session.print(&guide)
}

pub fn run_proposal(session: &Session, args: ProposalArgs) -> Result<()> {
    let mut store = match args.idea_id.as_deref() {
        Some(_) => Some(session.open_store()?),
        None => None,
    };
    let saved = match (&store, args.idea_id.as_deref()) {
        (Some(store), Some(id)) => Some(store.require(id)?),
        _ => None,
    };
    let refinement = saved.map(|idea| &idea.refinement);
    let input = GenerateProposalInput {
        refined_idea: pick(args.refined_idea, refinement.map(|r| &r.refined_idea))?,
        market_potential_score: args
            .score
            .or_else(|| refinement.map(|r| r.market_potential_score)),
        swot_snippet: args
            .swot
            .or_else(|| refinement.map(|r| r.swot_snippet.clone())),
        competitor_teaser: args
            .competitors
            .or_else(|| refinement.map(|r| r.competitor_teaser.clone())),
        associated_concepts: if args.concepts.is_empty() {
            refinement
                .map(|r| r.associated_concepts.clone())
                .unwrap_or_default()
        } else {
            args.concepts
        },
        funding_goal: args.funding_goal,
    };

    let client = session.client()?;
    let proposal = session.invoke(&mut GenerateProposal, client.as_ref(), &input)?;
    if let (Some(store), Some(id)) = (store.as_mut(), args.idea_id.as_deref()) {
        store.require_mut(id)?.proposal = Some(proposal.clone());
        store.save()?;
    }
    session.print(&proposal)
}

pub fn run_safety(session: &Session, args: SafetyArgs) -> Result<()> {
    let mut store = match args.idea_id.as_deref() {
        Some(_) => Some(session.open_store()?),
        None => None,
    };
    let saved = match (&store, args.idea_id.as_deref()) {
        (Some(store), Some(id)) => Some(store.require(id)?),
        _ => None,
    };
    let input = AnalyzeSafetyInput {
        idea: pick(args.idea, saved.map(|idea| &idea.refinement.refined_idea))?,
    };

    let client = session.client()?;
    let analysis = session.invoke(&mut AnalyzeSafety, client.as_ref(), &input)?;
    if let (Some(store), Some(id)) = (store.as_mut(), args.idea_id.as_deref()) {
        store.require_mut(id)?.safety = Some(analysis.clone());
        store.save()?;
    }
    session.print(&analysis)
}

pub fn run_image(session: &Session, args: ImageArgs) -> Result<()> {
    let bytes = fs::read(&args.image)
        .with_context(|| format!("read image {}", args.image.display()))?;
    let mime_type = match args.mime {
        Some(mime) => mime,
        None => mime_guess::from_path(&args.image)
            .first_or_octet_stream()
            .to_string(),
    };
    let input = AnalyzeImageInput {
        photo_data_uri: InlineMedia::from_bytes(mime_type, &bytes).to_data_uri(),
        user_question: args.question,
    };

    let client = session.client()?;
    let insights = session.invoke(&mut AnalyzeImage, client.as_ref(), &input)?;
    session.print(&insights)
}

pub fn run_translate(session: &Session, args: TranslateArgs) -> Result<()> {
    let input = TranslateInput {
        text: args.text,
        target_language: args.target_language,
    };
    let client = session.client()?;
    let translation = session.invoke(&mut Translate, client.as_ref(), &input)?;
    session.print(&translation)
}

pub fn run_chat(session: &Session, args: ChatArgs) -> Result<()> {
    let history: Vec<ChatMessage> = match args.history.as_deref() {
        Some(path) => read_json_file(path, "chat history")?,
        None => Vec::new(),
    };
    let knowledge_base: Vec<KnowledgeEntry> = match args.knowledge.as_deref() {
        Some(path) => read_json_file(path, "knowledge base")?,
        None => knowledge::default_knowledge_base(),
    };
    let input = ChatInput {
        message: args.message,
        history,
        knowledge_base,
    };

    let client = session.client()?;
    let reply = session.invoke(&mut ChatFlow, client.as_ref(), &input)?;
    session.print(&reply)
}

pub fn run_named_flow(session: &Session, args: RunArgs) -> Result<()> {
    let kind: FlowKind = args.flow.parse().map_err(|err: String| anyhow!(err))?;
    let input = read_input_record(&args.input)?;
    let client = session.client()?;
    let mut rng = rand::thread_rng();
    let output = session.logged(kind.name(), || {
        run_named(kind, input, client.as_ref(), &mut rng)
    })?;
    session.print(&output)
}

/// Write a default config, refusing to clobber an existing one.
pub fn run_init_config(explicit: Option<&Path>, args: &InitConfigArgs) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path()
            .ok_or_else(|| anyhow!("no user config directory; pass --config <path>"))?,
    };
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    let mut config = default_config();
    config.lm_command = args.lm_command.clone();
    validate_config(&config)?;
    write_config(&path, &config)?;
    println!("wrote {}", path.display());
    Ok(())
}

/// An explicit argument wins; otherwise fall back to the saved idea.
fn pick(explicit: Option<String>, saved: Option<&String>) -> Result<String> {
    explicit
        .or_else(|| saved.cloned())
        .ok_or_else(|| anyhow!("provide the text explicitly or pass --idea-id"))
}

fn read_json_file<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {label} {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse {label} {}", path.display()))
}

fn read_input_record(path: &Path) -> Result<serde_json::Value> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read flow input from stdin")?;
        return serde_json::from_str(&text).context("parse flow input from stdin");
    }
    read_json_file(path, "flow input")
}
