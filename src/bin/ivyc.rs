//! `ivyc`: reads a JSON-encoded contract and instantiation args (either from
//! a file argument or stdin), compiles it, and prints the analysis result
//! as JSON. One read, one compile, one write (§5, §10) — no other
//! responsibilities.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ivy_compiler::ast::{Contract, ContractArg};
use serde::Deserialize;

#[derive(Parser)]
#[clap(name = "ivyc", version, author, about = "Compiles an Ivy contract AST to bytecode")]
struct Args {
    /// Path to the input JSON document; reads stdin if omitted.
    input: Option<PathBuf>,
}

/// The CLI's JSON input shape (§10): the AST contract plus its
/// instantiation args.
#[derive(Deserialize)]
struct Input {
    contract: Contract,
    #[serde(default)]
    args: Vec<ContractArg>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let raw = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let mut input: Input = serde_json::from_str(&raw)?;

    let result = ivy_compiler::compile(&mut input.contract, &input.args)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
