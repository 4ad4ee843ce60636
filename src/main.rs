// File: src/main.rs
//
// Main entry point for the Sprig language interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run, repl, or test).

use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use colored::Colorize;
use sprig::repl::Repl;
use sprig::session::{Config, Session};
use sprig::snapshot;
use sprig::symtable::BlockScopeVisibility;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(
    name = "sprig",
    about = "Sprig: a small scripting language with closures and modules",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    /// Extra directory to search for modules (repeatable)
    #[arg(long = "module-path", global = true, env = "SPRIG_PATH", value_delimiter = ':')]
    module_path: Vec<PathBuf>,

    /// What happens to names declared in a block once it closes
    #[arg(long, global = true, value_enum, default_value_t = BlockScope::Hoist)]
    block_scope: BlockScope,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BlockScope {
    /// Block names stay visible after the block
    Hoist,
    /// Block names are dropped with the block
    Discard,
}

impl From<BlockScope> for BlockScopeVisibility {
    fn from(scope: BlockScope) -> Self {
        match scope {
            BlockScope::Hoist => BlockScopeVisibility::HoistToParent,
            BlockScope::Discard => BlockScopeVisibility::Discard,
        }
    }
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Sprig script file
    Run {
        /// Path to the .sprig file
        file: PathBuf,

        /// Print the parsed program as JSON instead of running it
        #[arg(long)]
        ast: bool,

        /// Values returned by arg(0), arg(1), ...
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Launch interactive Sprig REPL
    Repl,

    /// Run every script in a directory against its .out snapshot
    Test {
        /// Directory holding the .sprig scripts
        #[arg(default_value = "tests/scripts")]
        dir: PathBuf,

        /// Regenerate all .out files based on actual output
        #[arg(long)]
        update: bool,
    },
}

impl Cli {
    /// Search paths: `--module-path` entries, then `script_dir`, then `./modules`
    fn config(&self, script_dir: Option<&Path>) -> Config {
        let mut search_paths = self.module_path.clone();
        search_paths.extend(script_dir.map(Path::to_path_buf));
        if script_dir.is_none() {
            search_paths.push(PathBuf::from("."));
        }
        search_paths.push(PathBuf::from("./modules"));

        Config { search_paths, block_scope: self.block_scope.into(), args: Vec::new() }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run_file(cli: &Cli, file: &Path, ast: bool, args: &[String]) -> ExitCode {
    let source = match fs::read(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} Failed to read {}: {}", "Error:".bright_red(), file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let script_dir = file.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let config = cli.config(Some(script_dir)).with_args(args);
    let mut session = Session::new(config).with_source_name(file.display().to_string());
    session.write(&source);

    if ast {
        return match session.parse() {
            Ok(program) => match serde_json::to_string_pretty(&program) {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{} {}", "Error:".bright_red(), e);
                    ExitCode::FAILURE
                }
            },
            Err(err) => {
                eprint!("{}", err);
                ExitCode::FAILURE
            }
        };
    }

    match session.run() {
        Ok(results) => {
            for result in results {
                println!("{}", result);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprint!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_tests(cli: &Cli, dir: &Path, update: bool) -> ExitCode {
    let report = match snapshot::run_snapshots(dir, update, &cli.config(None)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} Failed to run tests in {}: {}", "Error:".bright_red(), dir.display(), e);
            return ExitCode::FAILURE;
        }
    };

    for (script, elapsed) in &report.passed {
        println!("{} {} ({:.2?})", "[✓]".bright_green(), script.display(), elapsed);
    }
    for failure in &report.failed {
        println!("{} {}", "[✗]".bright_red(), failure.script.display());
        println!("Expected:\n{}\nGot:\n{}\n", failure.expected, failure.actual);
    }
    for written in &report.written {
        println!("{} {}", "[+]".bright_yellow(), written.display());
    }

    println!("\nPassed {}/{} tests", report.passed.len(), report.total());
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Run { file, ast, args } => run_file(&cli, file, *ast, args),

        Commands::Repl => {
            let mut repl = match Repl::new(cli.config(None)) {
                Ok(repl) => repl,
                Err(e) => {
                    eprintln!("{} {}", "Error:".bright_red(), e);
                    return ExitCode::FAILURE;
                }
            };
            match repl.run() {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{} {}", "Error:".bright_red(), e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Test { dir, update } => run_tests(&cli, dir, *update),
    }
}
