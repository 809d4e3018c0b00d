//! CLI argument parsing for the incubator.
//!
//! Each flow gets one subcommand; `run` reaches any flow with a raw JSON
//! input record, and `ideas` manages the saved-idea store.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "incubator",
    version,
    about = "Refine, assess, and develop ideas with LLM prompt flows",
    after_help = "Examples:\n  incubator --lm 'my-llm --json' refine --idea 'compost pickup for apartments' --save\n  incubator guide --idea-id idea-1707900000000 --tech-stack 'Rust + Postgres'\n  incubator translate --text 'Hello' --to Spanish\n  incubator run --flow analyze-safety --input request.json\n  incubator ideas list",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Model command that reads a prompt on stdin and prints the reply
    #[arg(long, global = true, value_name = "COMMAND")]
    pub lm: Option<String>,

    /// Saved-idea store (defaults to the user data dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Print single-line JSON instead of pretty JSON
    #[arg(long, global = true)]
    pub compact: bool,

    /// Store full prompts and responses next to the invocation log
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refine a raw idea into a scored concept
    Refine(RefineArgs),
    /// Generate a development guide for a refined idea
    Guide(GuideArgs),
    /// Generate a business proposal and pitch deck outline
    Proposal(ProposalArgs),
    /// Assess misuse, safety, and ethical risks of an idea
    Safety(SafetyArgs),
    /// Extract product insights from a screenshot or mockup
    Image(ImageArgs),
    /// Translate text into another language
    Translate(TranslateArgs),
    /// Ask the incubator assistant a question
    Chat(ChatArgs),
    /// Run any flow with a JSON input record
    Run(RunArgs),
    /// Manage saved ideas
    #[command(subcommand)]
    Ideas(IdeasCommand),
    /// Write a default config file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
pub struct RefineArgs {
    /// Raw idea text
    #[arg(long)]
    pub idea: String,

    /// Save the refinement and its safety analysis to the store
    #[arg(long)]
    pub save: bool,

    /// Title for the saved idea (defaults to the idea's first line)
    #[arg(long, requires = "save")]
    pub title: Option<String>,
}

#[derive(Args, Debug)]
pub struct GuideArgs {
    /// Refined idea text (defaults to the saved idea's refinement)
    #[arg(long, required_unless_present = "idea_id")]
    pub refined_idea: Option<String>,

    /// Associated concept; repeat for several
    #[arg(long = "concept", value_name = "CONCEPT")]
    pub concepts: Vec<String>,

    #[arg(long)]
    pub audience: Option<String>,

    /// Preferred technologies
    #[arg(long)]
    pub tech_stack: Option<String>,

    /// Saved idea to read defaults from and attach the guide to
    #[arg(long, value_name = "ID")]
    pub idea_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProposalArgs {
    /// Refined idea text (defaults to the saved idea's refinement)
    #[arg(long, required_unless_present = "idea_id")]
    pub refined_idea: Option<String>,

    /// Market potential score, 0-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub score: Option<u8>,

    #[arg(long)]
    pub swot: Option<String>,

    #[arg(long)]
    pub competitors: Option<String>,

    /// Associated concept; repeat for several
    #[arg(long = "concept", value_name = "CONCEPT")]
    pub concepts: Vec<String>,

    #[arg(long)]
    pub funding_goal: Option<String>,

    /// Saved idea to read defaults from and attach the proposal to
    #[arg(long, value_name = "ID")]
    pub idea_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct SafetyArgs {
    /// Idea text (defaults to the saved idea's refinement)
    #[arg(long, required_unless_present = "idea_id")]
    pub idea: Option<String>,

    /// Saved idea to read defaults from and attach the analysis to
    #[arg(long, value_name = "ID")]
    pub idea_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Image file to analyze
    #[arg(long, value_name = "PATH")]
    pub image: PathBuf,

    /// MIME type (guessed from the file extension when omitted)
    #[arg(long)]
    pub mime: Option<String>,

    /// Question to focus the analysis
    #[arg(long)]
    pub question: Option<String>,
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    #[arg(long)]
    pub text: String,

    /// Target language
    #[arg(long = "to", value_name = "LANGUAGE")]
    pub target_language: String,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[arg(long)]
    pub message: String,

    /// JSON array of prior {role, text} messages
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// JSON array of {title, summary} entries (defaults to the incubator's features)
    #[arg(long, value_name = "PATH")]
    pub knowledge: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Flow name, e.g. refine-idea or generate-guide
    #[arg(long)]
    pub flow: String,

    /// JSON input record, or - for stdin
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Model command to record as lm_command
    #[arg(long, value_name = "COMMAND")]
    pub lm_command: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum IdeasCommand {
    /// List saved ideas
    List,
    /// Print one saved idea
    Show {
        id: String,
    },
    /// Delete one saved idea
    Delete {
        id: String,
    },
}
