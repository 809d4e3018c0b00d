use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod flows;
mod lm;
mod lm_log;
mod prompt;
mod store;
mod util;
mod workflow;

const LOG_ENV: &str = "INCUBATOR_LOG";

fn main() -> Result<()> {
    init_tracing();
    let args = cli::RootArgs::parse();
    // Writing a config must not depend on loading the current one.
    if let cli::Command::InitConfig(init) = &args.command {
        return workflow::run_init_config(args.global.config.as_deref(), init);
    }
    let session = workflow::Session::load(args.global)?;

    match args.command {
        cli::Command::Refine(args) => workflow::run_refine(&session, args),
        cli::Command::Guide(args) => workflow::run_guide(&session, args),
        cli::Command::Proposal(args) => workflow::run_proposal(&session, args),
        cli::Command::Safety(args) => workflow::run_safety(&session, args),
        cli::Command::Image(args) => workflow::run_image(&session, args),
        cli::Command::Translate(args) => workflow::run_translate(&session, args),
        cli::Command::Chat(args) => workflow::run_chat(&session, args),
        cli::Command::Run(args) => workflow::run_named_flow(&session, args),
        cli::Command::Ideas(command) => workflow::run_ideas(&session, command),
        cli::Command::InitConfig(_) => unreachable!("init-config runs before the session loads"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
