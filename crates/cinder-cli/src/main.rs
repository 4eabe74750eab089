//! Cinder CLI - command line interface for the Cinder compiler

mod resolver;

use std::fs;
use std::path::{Path, PathBuf};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

use cinder_ast::{Reload, Symbol};
use cinder_driver::{DriverError, Options, Session};
use resolver::{echo_evaluator, SourcePathResolver};

#[derive(Parser)]
#[command(name = "cinder")]
#[command(about = "Cinder self-hosted ClojureScript compiler", long_about = None)]
struct Cli {
    /// Log dependency loading as it happens
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a file to JavaScript
    Compile {
        /// Input file
        file: PathBuf,
        /// Source roots searched for dependencies
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,
        /// Append an inline source map
        #[arg(long)]
        source_map: bool,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// JSON file with compiler options
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Analyze a file and print the namespace registry as JSON
    Analyze {
        /// Input file
        file: PathBuf,
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Analyze every source file under the given roots
    Check {
        /// Source roots
        roots: Vec<PathBuf>,
    },
    /// Interactive REPL
    Repl {
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Compile {
            file,
            include,
            source_map,
            output,
            options,
        } => cmd_compile(&file, include, source_map, output, options, cli.verbose).await,
        Commands::Analyze { file, include, pretty } => cmd_analyze(&file, include, pretty).await,
        Commands::Check { roots } => cmd_check(roots).await,
        Commands::Repl { include } => cmd_repl(include, cli.verbose).await,
    }
}

/// Session resolving from `roots`, or the directory holding `file`
fn session_for(roots: Vec<PathBuf>, file: Option<&Path>) -> Session {
    let roots = if roots.is_empty() {
        let dir = file
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        vec![dir]
    } else {
        roots
    };
    Session::new()
        .with_resolver(SourcePathResolver::new(roots))
        .with_evaluator(echo_evaluator())
}

fn read_source(file: &Path) -> String {
    match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn load_options(path: Option<&Path>) -> Options {
    let Some(path) = path else {
        return Options::new();
    };
    let text = read_source(path);
    match serde_json::from_str(&text) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Invalid options in {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn unit_name(file: &Path) -> String {
    file.to_string_lossy().to_string()
}

async fn cmd_compile(
    file: &Path,
    include: Vec<PathBuf>,
    source_map: bool,
    output: Option<PathBuf>,
    options: Option<PathBuf>,
    verbose: bool,
) {
    let source = read_source(file);
    let mut options = load_options(options.as_deref());
    options.source_map |= source_map;
    options.verbose |= verbose;

    let session = session_for(include, Some(file));
    match session.compile(&source, Some(&unit_name(file)), &options).await {
        Ok(js) => {
            let out_path = output.unwrap_or_else(|| file.with_extension("js"));
            if let Err(e) = fs::write(&out_path, &js) {
                eprintln!("Error writing {}: {}", out_path.display(), e);
                std::process::exit(1);
            }
            println!(
                "Compiled {} -> {} ({} bytes, {} namespaces loaded)",
                file.display(),
                out_path.display(),
                js.len(),
                session.loaded().len()
            );
        }
        Err(e) => {
            report_error(&source, file, &e);
            std::process::exit(1);
        }
    }
}

async fn cmd_analyze(file: &Path, include: Vec<PathBuf>, pretty: bool) {
    let source = read_source(file);
    let session = session_for(include, Some(file));

    if let Err(e) = session.analyze(&source, Some(&unit_name(file)), &Options::new()).await {
        report_error(&source, file, &e);
        std::process::exit(1);
    }

    let json = session.state().with_namespaces(|registry| {
        if pretty {
            serde_json::to_string_pretty(registry)
        } else {
            serde_json::to_string(registry)
        }
    });
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing analysis: {}", e);
            std::process::exit(1);
        }
    }
}

fn is_source_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("cljs") | Some("cljc")
    )
}

async fn cmd_check(roots: Vec<PathBuf>) {
    let roots = if roots.is_empty() { vec![PathBuf::from(".")] } else { roots };
    let session = session_for(roots.clone(), None);
    let mut checked = 0;
    let mut failed = 0;

    for root in &roots {
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !is_source_file(path) {
                continue;
            }
            checked += 1;
            let source = read_source(path);
            match session.analyze(&source, Some(&unit_name(path)), &Options::new()).await {
                Ok(()) => println!("✓ {}", path.display()),
                Err(e) => {
                    eprintln!("✗ {}", path.display());
                    report_error(&source, path, &e);
                    failed += 1;
                }
            }
        }
    }

    let namespaces = session.state().with_namespaces(|registry| registry.len());
    println!("{} files checked, {} failed, {} namespaces known", checked, failed, namespaces);
    if failed > 0 {
        std::process::exit(1);
    }
}

async fn cmd_repl(include: Vec<PathBuf>, verbose: bool) {
    use rustyline::DefaultEditor;

    println!("Cinder REPL v0.1.0");
    println!("Type :help for help, :quit to exit");
    println!();

    let session = session_for(include, None);
    let mut options = Options::new();
    options.verbose = verbose;

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create REPL: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        let readline = rl.readline(&format!("{}=> ", options.ns));
        let line = match readline {
            Ok(line) => line,
            Err(_) => break,
        };
        let _ = rl.add_history_entry(&line);
        let trimmed = line.trim();

        if trimmed.starts_with(':') {
            match trimmed {
                ":quit" | ":q" => break,
                ":help" | ":h" => {
                    println!("Commands:");
                    println!("  :require <ns>  - Load (or reload) a namespace");
                    println!("  :loaded        - List loaded namespaces");
                    println!("  :source-map    - Toggle source maps");
                    println!("  :quit          - Exit REPL");
                    println!("Anything else is evaluated in the current namespace.");
                }
                ":loaded" => {
                    for ns in session.loaded().snapshot() {
                        println!("  {}", ns);
                    }
                }
                ":source-map" => {
                    options.source_map = !options.source_map;
                    println!("source maps {}", if options.source_map { "on" } else { "off" });
                }
                cmd if cmd.starts_with(":require ") => {
                    let ns = Symbol::new(cmd[9..].trim());
                    match session.require(ns.clone(), Some(Reload::Reload), &options).await {
                        Ok(()) => println!("Loaded {}", ns),
                        Err(e) => eprintln!("error[{}]: {}", e.code(), e),
                    }
                }
                _ => println!("Unknown command. Type :help for help."),
            }
        } else if !trimmed.is_empty() {
            match session.eval_str(trimmed, Some("<repl>"), &options).await {
                Ok(evaluated) => {
                    match evaluated.value {
                        serde_json::Value::String(js) => print!("{}", js),
                        value => println!("{}", value),
                    }
                    options.ns = evaluated.ns;
                }
                Err(e) => {
                    report_error(trimmed, Path::new("<repl>"), &e);
                }
            }
        }
    }

    println!("Goodbye!");
}

/// Render an error against the unit it came from when it carries a span,
/// otherwise print it with its code
fn report_error(source: &str, file: &Path, error: &DriverError) {
    let Some(span) = error.span() else {
        eprintln!("error[{}]: {}", error.code(), error);
        return;
    };

    let main_unit = unit_name(file);
    let (name, text) = match error.unit() {
        Some(unit) if unit != main_unit => match fs::read_to_string(unit) {
            Ok(text) => (unit.to_string(), text),
            Err(_) => {
                eprintln!("error[{}]: {}", error.code(), error);
                return;
            }
        },
        _ => (main_unit, source.to_string()),
    };

    let report = Report::build(ReportKind::Error, name.clone(), span.start)
        .with_code(error.code())
        .with_message(error.to_string())
        .with_label(
            Label::new((name.clone(), span.start..span.end))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((name, Source::from(text)));
    if report.is_err() {
        eprintln!("error[{}]: {}", error.code(), error);
    }
}
