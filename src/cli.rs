// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Command line interface.

use clap::{Args, Parser, Subcommand};
use modboot_runtime::Host;
use std::path::PathBuf;

/// modboot - load compiled modules in dependency order
#[derive(Parser, Debug)]
#[command(name = "modboot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and evaluate every module of a build manifest
    Run(RunArgs),

    /// List the namespace roots a load would register
    Roots(RootsArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Build manifest (JSON)
    pub manifest: PathBuf,

    /// Host to emulate (browser, worker, node, engine, esm, react-native, static)
    #[arg(long, value_parser = parse_host)]
    pub host: Option<Host>,

    /// Retrieval base, URL or directory (overrides the manifest)
    #[arg(long)]
    pub base: Option<String>,

    /// Skip the document-write phase
    #[arg(long)]
    pub force_async: bool,

    /// Re-evaluate modules when their files change
    #[arg(long)]
    pub watch: bool,
}

#[derive(Args, Debug)]
pub struct RootsArgs {
    /// Build manifest (JSON)
    pub manifest: PathBuf,
}

fn parse_host(value: &str) -> Result<Host, String> {
    value.parse().map_err(|e: modboot_runtime::LoaderError| e.to_string())
}
