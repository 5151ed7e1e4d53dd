use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    analyze::AnalyzeArgs, clusters::ClustersArgs, inspect::InspectArgs, reminders::RemindersArgs,
    summarize::SummarizeArgs,
};

#[derive(Debug, Parser)]
#[command(name = "smslog", version, about = "SMS gateway delivery log intelligence")]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Summarize(SummarizeArgs),
    Analyze(AnalyzeArgs),
    Clusters(ClustersArgs),
    Reminders(RemindersArgs),
    Inspect(InspectArgs),
}
