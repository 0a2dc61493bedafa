use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use doclink::builder::HierarchyBuilder;
use doclink::config::Config;
use doclink::diagnostics;
use doclink::error::Error;
use doclink::loader;
use doclink::resolver::LinkResolver;

// ── Help text constants ───────────────────────────────────────────────

const AFTER_HELP: &str = "\
Workflow:
  1. Export symbol graphs (*.symbols.json) into a directory
  2. Describe the bundle in .doclink.toml
  3. doclink resolve <link>            Answer one link query
  4. doclink paths                     Emit every symbol's canonical path

Exit codes:  0=resolved  1=unresolved  3=error";

const RESOLVE_HELP: &str = "\
Examples:
  doclink resolve /ShapeKit/Circle               Absolute symbol link
  doclink resolve Circle/area --symbol-link      Module prefix omitted
  doclink resolve ../Square --parent /ShapeKit/Circle/area
  doclink resolve '#overview' --parent /ShapeKit/Circle";

const PATHS_HELP: &str = "\
Examples:
  doclink paths                     precise-id<TAB>path, one per line
  doclink paths --json              JSON object keyed by precise id";

const DUMP_HELP: &str = "\
Examples:
  doclink dump                      Box-drawing tree of the hierarchy";

// ── CLI definition ────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "doclink", version, about = "Resolve documentation links against symbol graphs")]
#[command(subcommand_required = true, after_help = AFTER_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one link against the bundle's path hierarchy
    #[command(after_help = RESOLVE_HELP)]
    Resolve {
        /// The link to resolve (absolute, relative, or doc:// qualified)
        link: String,
        /// Resolve relative to this absolute page path
        #[arg(long)]
        parent: Option<String>,
        /// Treat the link as a symbol link (rejects non-symbol matches)
        #[arg(long)]
        symbol_link: bool,
    },
    /// Print the canonical disambiguated path of every symbol
    #[command(after_help = PATHS_HELP)]
    Paths {
        /// Output as JSON instead of tab-separated lines
        #[arg(long)]
        json: bool,
    },
    /// Pretty-print the built hierarchy
    #[command(after_help = DUMP_HELP)]
    Dump,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve { link, parent, symbol_link } => {
            cmd_resolve(&link, parent.as_deref(), symbol_link)
        }
        Commands::Paths { json } => cmd_paths(json).map(|()| ExitCode::SUCCESS),
        Commands::Dump => cmd_dump().map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(3)
        }
    }
}

/// Build the resolver from the current directory's config and graphs.
///
/// # Errors
///
/// Returns errors from config loading or graph parsing.
fn build_resolver() -> Result<LinkResolver, Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let graphs = loader::load_graphs(&config.graphs)?;

    let mut builder = HierarchyBuilder::new(
        &config.bundle,
        &config.display_name,
        &config.primary_language,
    );
    for file in &graphs {
        builder.add_symbol_graph(&file.graph);
    }
    for article in &config.articles {
        builder.add_article(article);
    }
    for tutorial in &config.tutorials {
        builder.add_tutorial(tutorial);
    }
    for overview in &config.tutorial_overviews {
        builder.add_tutorial_overview(overview);
    }
    Ok(builder.finish())
}

/// Resolve one link and print the result.
///
/// # Errors
///
/// Returns errors from building the resolver; resolution failures are
/// rendered as diagnostics and reported through the exit code instead.
fn cmd_resolve(link: &str, parent: Option<&str>, symbol_link: bool) -> Result<ExitCode, Error> {
    let resolver = build_resolver()?;

    let parent_reference = match parent {
        Some(parent_link) => match resolver.resolve(parent_link, None, false) {
            Ok(reference) => Some(reference),
            Err(_) => {
                return Err(Error::UnknownParent {
                    link: parent_link.to_string(),
                })
            }
        },
        None => None,
    };

    match resolver.resolve(link, parent_reference.as_ref(), symbol_link) {
        Ok(reference) => {
            println!("{}", reference.url());
            Ok(ExitCode::SUCCESS)
        }
        Err(info) => {
            diagnostics::print_error_info(&info);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print every symbol's canonical path.
///
/// # Errors
///
/// Returns errors from building the resolver or serializing JSON.
fn cmd_paths(json: bool) -> Result<(), Error> {
    let resolver = build_resolver()?;
    let paths = resolver.paths();

    if json {
        println!("{}", serde_json::to_string_pretty(paths)?);
        return Ok(());
    }
    for (precise, path) in paths {
        println!("{precise}\t{path}");
    }
    Ok(())
}

/// Pretty-print the hierarchy.
///
/// # Errors
///
/// Returns errors from building the resolver.
fn cmd_dump() -> Result<(), Error> {
    let resolver = build_resolver()?;
    print!("{}", resolver.dump());
    Ok(())
}
