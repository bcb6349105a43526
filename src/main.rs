// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! modboot - dependency-ordered module loader
//!
//! Entry point for the `modboot` CLI.

mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use cli::{Cli, Commands, RootsArgs, RunArgs};
use modboot_runtime::namespace::declared_roots;
use modboot_runtime::transport::{is_remote, resolve_location};
use modboot_runtime::{
    Environment, EnvironmentAdapter, Host, LoadReport, LoaderConfig, Manifest, ModuleWatcher,
    RootTable,
};
use owo_colors::OwoColorize;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "modboot=debug" } else { "modboot=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run(args, cli.verbose).await,
        Commands::Roots(args) => roots(args),
    }
}

/// Load every manifest module and report the outcome.
async fn run(args: RunArgs, verbose: bool) -> anyhow::Result<ExitCode> {
    let manifest = Manifest::from_file(&args.manifest)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;

    let project_dir = std::env::current_dir()?;
    let mut config = LoaderConfig::load(&project_dir)?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(base) = args.base {
        config.base = base;
    } else if config.base.is_empty() {
        config.base = manifest.base.clone().unwrap_or_default();
    }
    config.force_async |= args.force_async;
    config.debug |= verbose;
    config.validate()?;

    let host = config.host;
    let base = config.base.clone();
    let mut env = Environment::for_host(config)?.with_manifest(&manifest);

    println!(
        "{} {} modules on the {} host",
        "Loading".green().bold(),
        manifest.modules.len(),
        host.cyan()
    );

    let ids = manifest.ids();
    let outcome = match env.load(&ids) {
        Ok(()) if host == Host::Browser => env.document_ready(),
        other => other,
    };
    let outcome = match outcome {
        Ok(()) => env.settle().await,
        Err(e) => Err(e),
    };
    print_output(&mut env);

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return Ok(ExitCode::FAILURE);
        }
    };
    print_report(&report);

    if args.watch {
        if is_remote(&base) {
            bail!("--watch needs a directory base, not {}", base);
        }
        watch(&mut env, Path::new(&base), &manifest).await?;
    }

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Feed file changes through `eval_load` until interrupted.
async fn watch(env: &mut Environment, base: &Path, manifest: &Manifest) -> anyhow::Result<()> {
    let mut watcher = ModuleWatcher::new(base, manifest)?;
    println!(
        "{} {} (press Ctrl+C to stop)",
        "Watching".green().bold(),
        base.display()
    );

    loop {
        tokio::select! {
            update = watcher.next_update() => {
                let Some(update) = update else { break };
                match env.eval_load(&update.module, update.has_source_map, &update.code) {
                    Ok(()) => println!("{} {}", "Reloaded".green().bold(), update.module),
                    Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
                }
                print_output(env);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// List the roots every manifest module declares, in first-seen order.
fn roots(args: RootsArgs) -> anyhow::Result<ExitCode> {
    let manifest = Manifest::from_file(&args.manifest)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;
    let base = manifest.base.clone().unwrap_or_default();
    if is_remote(&base) {
        bail!("roots needs a directory base, not {}", base);
    }

    let mut table = RootTable::new();
    for module in &manifest.modules {
        let location = resolve_location(&base, module.path());
        let source = std::fs::read_to_string(&location)
            .with_context(|| format!("Failed to read {}", location))?;
        for root in declared_roots(&source) {
            table.insert(root);
        }
    }

    for root in table.iter() {
        println!("{}", root);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_output(env: &mut Environment) {
    for line in env.take_output() {
        println!("{}", line);
    }
}

fn print_report(report: &LoadReport) {
    println!(
        "{} {} evaluated",
        "Done".green().bold(),
        report.evaluated.len()
    );
    for module in &report.failed {
        eprintln!("  {} {}", "failed".red(), module);
    }
    if let Some(blocked) = &report.blocked_on {
        eprintln!(
            "  {} {} more waiting on {}",
            "blocked".yellow(),
            report.pending,
            blocked.cyan()
        );
    }
}
