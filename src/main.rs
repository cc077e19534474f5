#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod cli;
mod tables;

use clap::{Parser, crate_version};
use kestrel::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command, compare, recommend, simulate};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();

    match args.command {
        Command::Simulate(args) => simulate(&args)?,
        Command::Compare(args) => compare(&args)?,
        Command::Recommend(args) => recommend(&args)?,
    }

    info!("done!");
    Ok(())
}
