#![allow(clippy::print_stdout, clippy::print_stderr)]

//! The `corvus` command-line front-end (SPEC_FULL.md §6.3): an
//! interactive REPL by default, one-liner evaluation via `-e`, script
//! execution given a bare file path, and an `ast` subcommand for
//! inspecting what the parser produced.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use corvus::Engine;

#[derive(Parser)]
#[command(name = "corvus")]
#[command(author, version, about = "A from-scratch JavaScript engine", long_about = None)]
struct Cli {
    /// Evaluate a one-liner expression
    #[arg(short = 'e', long = "eval", value_name = "EXPR")]
    eval: Option<String>,

    /// Script file to execute (alternative to subcommands)
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive REPL
    Repl,

    /// Parse a JavaScript file and show the AST
    Ast {
        /// The file to parse
        file: PathBuf,

        /// Print the AST as JSON instead of Rust debug form
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Some(expr) = cli.eval {
        return run_and_print(&expr);
    }

    if let Some(file) = cli.file {
        return run_file(&file);
    }

    match cli.command {
        None | Some(Commands::Repl) => start_repl(),
        Some(Commands::Ast { file, json }) => dump_ast(&file, json),
    }
}

/// Evaluate `source` against a fresh engine and print the result the way
/// `console.log` would; a non-zero exit on an uncaught throw.
fn run_and_print(source: &str) -> Result<()> {
    let mut engine = Engine::new();
    match engine.eval(source) {
        Ok(value) => {
            if !matches!(value, corvus::Value::Undefined) {
                println!("{value}");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {e}", "Uncaught".bright_red());
            std::process::exit(1);
        }
    }
}

fn run_file(path: &PathBuf) -> Result<()> {
    let source = fs::read_to_string(path).map_err(|source| corvus::EngineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    run_and_print(&source)
}

#[cfg(feature = "repl")]
fn start_repl() -> Result<()> {
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    let mut engine = Engine::new();
    let mut rl = DefaultEditor::new()?;
    let history_path = dirs_history_path();
    if let Some(path) = &history_path {
        let _ = rl.load_history(path);
    }

    println!("{} {}", "corvus".bright_cyan(), env!("CARGO_PKG_VERSION"));
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                match engine.eval(&line) {
                    Ok(value) => {
                        if !matches!(value, corvus::Value::Undefined) {
                            println!("{value}");
                        }
                    }
                    Err(e) => eprintln!("{} {e}", "Uncaught".bright_red()),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {e}", "Readline error:".bright_red());
                break;
            }
        }
    }
    if let Some(path) = &history_path {
        let _ = rl.save_history(path);
    }
    Ok(())
}

#[cfg(not(feature = "repl"))]
fn start_repl() -> Result<()> {
    anyhow::bail!("this build of corvus was compiled without the `repl` feature")
}

#[cfg(feature = "repl")]
fn dirs_history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".corvus_history"))
}

fn dump_ast(file: &PathBuf, json: bool) -> Result<()> {
    let source = fs::read_to_string(file).map_err(|source| corvus::EngineError::Io {
        path: file.display().to_string(),
        source,
    })?;
    let engine = Engine::new();
    let program = match engine.parse(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{} {e}", "Parse error:".bright_red());
            std::process::exit(1);
        }
    };
    if json {
        let value = serde_json::json!({ "ast": format!("{program:#?}") });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", "AST:".bright_cyan());
        println!("{program:#?}");
    }
    Ok(())
}
