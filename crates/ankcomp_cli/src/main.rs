//! `ankcomp` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, load configuration and start logging.
//! - Discover candidate documents and hand them to `ankcomp_core`.
//! - Write one package per built collection.
//!
//! No parsing rules live here; every note invariant belongs to the core crate.

mod discover;

use ankcomp_core::{
    default_log_level, init_logging, load_config, new_block_template, CollectionReport,
    CollectionResolver, DeckPackager, EngineConfig, LogTarget, ManifestPackager, PackageRequest,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use discover::discover_documents;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "ankcomp", version, about = "Compile markdown notes into flashcard decks")]
struct Cli {
    /// TOML file overriding metadata key names
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write rotating log files here instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List declared decks or their files
    #[command(subcommand)]
    List(ListCommand),

    /// Build deck packages
    Build {
        /// Deck to build
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        deck: Option<String>,

        /// Build every declared deck
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        search: SearchArgs,

        /// Directory receiving the packages
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Generate authoring scaffolds
    #[command(subcommand)]
    Gen(GenCommand),
}

#[derive(Debug, Subcommand)]
enum ListCommand {
    /// Distinct deck names, sorted
    Decks {
        #[command(flatten)]
        search: SearchArgs,
    },

    /// Files declaring a deck
    Files {
        /// Deck name
        #[arg(long)]
        deck: String,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Debug, Subcommand)]
enum GenCommand {
    /// Print an empty note block with a fresh id
    Block,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Directory to search for documents
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Subdirectory levels to descend; 0 searches only the directory itself
    #[arg(long, default_value_t = 0)]
    depth: usize,
}

/// Command result, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    /// Empty selection or failed documents; exit code 1.
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let target = cli.log_dir.map_or(LogTarget::Stderr, LogTarget::Directory);
    init_logging(level, target).map_err(anyhow::Error::msg)?;

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("cannot load config `{}`", path.display()))?,
        None => EngineConfig::default(),
    };

    execute(cli.command, config)
}

fn execute(command: Command, config: EngineConfig) -> Result<Outcome> {
    match command {
        Command::List(ListCommand::Decks { search }) => list_decks(config, &search),
        Command::List(ListCommand::Files { deck, search }) => list_files(config, &deck, &search),
        Command::Build {
            deck,
            all: _,
            search,
            output,
        } => build(config, deck.as_deref(), &search, &output),
        Command::Gen(GenCommand::Block) => {
            print!("{}", new_block_template(&config));
            Ok(Outcome::Success)
        }
    }
}

/// Discovers candidates; unreadable walk entries are printed and counted.
fn candidates(search: &SearchArgs) -> Result<(Vec<PathBuf>, usize)> {
    let discovery = discover_documents(&search.path, search.depth)?;
    report_failures(&discovery.skipped);
    Ok((discovery.documents, discovery.skipped.len()))
}

fn list_decks(config: EngineConfig, search: &SearchArgs) -> Result<Outcome> {
    let (paths, _) = candidates(search)?;
    let scan = CollectionResolver::new(config).scan(&paths);
    report_failures(&scan.failures);

    let names = scan.names();
    if names.is_empty() {
        eprintln!("no decks found under `{}`", search.path.display());
        return Ok(Outcome::Failure);
    }
    for name in names {
        println!("{name}");
    }
    Ok(Outcome::Success)
}

fn list_files(config: EngineConfig, deck: &str, search: &SearchArgs) -> Result<Outcome> {
    let (paths, _) = candidates(search)?;
    let scan = CollectionResolver::new(config).scan(&paths);
    report_failures(&scan.failures);

    let files = scan.files(deck);
    if files.is_empty() {
        eprintln!("no files declare deck `{deck}`");
        return Ok(Outcome::Failure);
    }
    for file in files {
        println!("{}", file.display());
    }
    Ok(Outcome::Success)
}

/// `deck == None` builds every declared deck.
fn build(
    config: EngineConfig,
    deck: Option<&str>,
    search: &SearchArgs,
    output: &Path,
) -> Result<Outcome> {
    let (paths, mut failed) = candidates(search)?;
    let resolver = CollectionResolver::new(config);

    let reports = match deck {
        Some(name) => vec![resolver.resolve(name, &paths)],
        None => {
            let batch = resolver.resolve_all(&paths);
            report_failures(&batch.failures);
            failed += batch.failures.len();
            batch.collections
        }
    };

    std::fs::create_dir_all(output)
        .with_context(|| format!("cannot create output directory `{}`", output.display()))?;
    let packager = ManifestPackager::new(output);

    let mut built = 0usize;
    for report in &reports {
        report_failures(&report.failures);
        failed += report.failures.len();
        if package_report(&packager, report)? {
            built += 1;
        }
    }

    info!(
        "event=build_finished module=cli status={} decks={} failures={}",
        if failed == 0 { "ok" } else { "degraded" },
        built,
        failed
    );
    if built == 0 {
        match deck {
            Some(name) => eprintln!("no notes found for deck `{name}`"),
            None => eprintln!("no decks found under `{}`", search.path.display()),
        }
        return Ok(Outcome::Failure);
    }
    Ok(if failed == 0 {
        Outcome::Success
    } else {
        Outcome::Failure
    })
}

/// Returns `false` when the collection had no notes to package.
fn package_report(packager: &ManifestPackager, report: &CollectionReport) -> Result<bool> {
    let collection = &report.collection;
    if collection.is_empty() {
        warn!(
            "event=build_deck module=cli status=degraded name={} reason=no_notes",
            collection.name
        );
        return Ok(false);
    }
    let path = packager
        .package(&PackageRequest::from_collection(collection))
        .with_context(|| format!("cannot package deck `{}`", collection.name))?;
    println!(
        "{} ({} notes) -> {}",
        collection.name,
        collection.notes.len(),
        path.display()
    );
    Ok(true)
}

fn report_failures<E: std::fmt::Display>(failures: &[E]) {
    for failure in failures {
        eprintln!("skipped: {failure}");
    }
}

#[cfg(test)]
mod tests {
    use super::{execute, Cli, Outcome};
    use ankcomp_core::EngineConfig;
    use clap::{CommandFactory, Parser};
    use std::fs;
    use std::path::Path;

    const GOOD_BLOCK: &str = "---\n\n2+2:::4\n\n---\n[^id]: Good000001\n\n";
    const BAD_BLOCK: &str = "---\n\njust prose\n\n---\n[^id]: Bad0000001\n\n";

    fn deck_doc(deck: &str, blocks: &[&str]) -> String {
        format!("---\ndeck: {deck}\n---\n\n{}", blocks.concat())
    }

    fn run_args(args: &[&str]) -> Outcome {
        let cli = Cli::try_parse_from(std::iter::once("ankcomp").chain(args.iter().copied()))
            .unwrap();
        execute(cli.command, EngineConfig::default()).unwrap()
    }

    fn path_arg(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_of_unknown_deck_exits_with_failure() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("bio.md"), deck_doc("Bio", &[GOOD_BLOCK])).unwrap();

        let outcome = run_args(&[
            "build",
            "--deck",
            "Unknown",
            "--path",
            path_arg(input.path()),
            "--output",
            path_arg(output.path()),
        ]);
        assert_eq!(outcome, Outcome::Failure);
        assert!(!output.path().join("unknown.json").exists());
    }

    #[test]
    fn build_with_failing_block_writes_package_and_exits_with_failure() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("x.md"),
            deck_doc("X", &[GOOD_BLOCK, BAD_BLOCK]),
        )
        .unwrap();

        let outcome = run_args(&[
            "build",
            "--deck",
            "X",
            "--path",
            path_arg(input.path()),
            "--output",
            path_arg(output.path()),
        ]);
        assert_eq!(outcome, Outcome::Failure);
        assert!(output.path().join("x.json").is_file());
    }

    #[test]
    fn clean_build_of_every_deck_succeeds() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a.md"), deck_doc("Art", &[GOOD_BLOCK])).unwrap();
        fs::write(input.path().join("b.md"), deck_doc("Bio", &[GOOD_BLOCK])).unwrap();

        let outcome = run_args(&[
            "build",
            "--all",
            "--path",
            path_arg(input.path()),
            "--output",
            path_arg(output.path()),
        ]);
        assert_eq!(outcome, Outcome::Success);
        assert!(output.path().join("art.json").is_file());
        assert!(output.path().join("bio.json").is_file());
    }

    #[test]
    fn build_all_without_decks_exits_with_failure() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("plain.md"), "no header\n").unwrap();

        let outcome = run_args(&[
            "build",
            "--all",
            "--path",
            path_arg(input.path()),
            "--output",
            path_arg(output.path()),
        ]);
        assert_eq!(outcome, Outcome::Failure);
    }

    #[test]
    fn list_decks_without_headers_exits_with_failure() {
        let input = tempfile::tempdir().unwrap();
        fs::write(input.path().join("plain.md"), "no header\n").unwrap();

        let outcome = run_args(&["list", "decks", "--path", path_arg(input.path())]);
        assert_eq!(outcome, Outcome::Failure);
    }

    #[test]
    fn list_decks_depth_reaches_nested_documents() {
        let input = tempfile::tempdir().unwrap();
        fs::create_dir_all(input.path().join("nested/deeper")).unwrap();
        fs::write(
            input.path().join("nested/deeper/bio.md"),
            deck_doc("Bio", &[GOOD_BLOCK]),
        )
        .unwrap();
        let root = path_arg(input.path());

        assert_eq!(
            run_args(&["list", "decks", "--path", root, "--depth", "1"]),
            Outcome::Failure
        );
        assert_eq!(
            run_args(&["list", "decks", "--path", root, "--depth", "2"]),
            Outcome::Success
        );
    }

    #[test]
    fn list_files_of_unknown_deck_exits_with_failure() {
        let input = tempfile::tempdir().unwrap();
        fs::write(input.path().join("bio.md"), deck_doc("Bio", &[GOOD_BLOCK])).unwrap();
        let root = path_arg(input.path());

        assert_eq!(
            run_args(&["list", "files", "--deck", "Bio", "--path", root]),
            Outcome::Success
        );
        assert_eq!(
            run_args(&["list", "files", "--deck", "Chem", "--path", root]),
            Outcome::Failure
        );
    }
}
