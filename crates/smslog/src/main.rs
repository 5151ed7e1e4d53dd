#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use smslog::classify::LifecycleInvariantFailure;
use smslog::cli::app::{Cli, Command, RuntimeArgs};
use smslog::cli::commands;
use smslog::config::RuntimePaths;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_INVARIANT_FAILURE: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    let command_name = command_name(&cli.command);
    println!("smslog: starting `{command_name}`");

    match execute(cli) {
        Ok(()) => {
            println!("smslog: completed `{command_name}` (exit_code={EXIT_SUCCESS})");
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            eprintln!("smslog: failed `{command_name}` (exit_code={exit_code})");
            eprintln!("{error:#}");
            exit_code
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Summarize(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::summarize::run(&args, &runtime_paths)
        }
        Command::Analyze(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::analyze::run(&args, &runtime_paths)
        }
        Command::Clusters(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::clusters::run(&args, &runtime_paths)
        }
        Command::Reminders(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::reminders::run(&args, &runtime_paths)
        }
        Command::Inspect(args) => commands::inspect::run(&args),
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<LifecycleInvariantFailure>().is_some() {
        EXIT_INVARIANT_FAILURE
    } else {
        EXIT_RUNTIME_FAILURE
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Summarize(_) => "summarize",
        Command::Analyze(_) => "analyze",
        Command::Clusters(_) => "clusters",
        Command::Reminders(_) => "reminders",
        Command::Inspect(_) => "inspect",
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    smslog::config::resolve_runtime_paths(&home_dir, &cwd, args.out_dir.as_deref())
}
