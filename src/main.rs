//! Interlock CLI
//!
//! Usage:
//!   interlock check <DEFINITIONS>
//!   interlock render --definitions <FILE> [--config <FILE>] [--style <STYLE>] <WORKSPACE>
//!   interlock probe --definitions <FILE> <WORKSPACE> --block <N> --dx <DX> --dy <DY>
//!
//! Options:
//!   -v, --verbose  Log connections, previews and render passes
//!   -h, --help     Print help

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use interlock::{
    load_workspace, render_with_config, BlockRegistry, DragSession, DropOutcome, EditorError,
    LayoutStyle, RenderConfig,
};

#[derive(Parser)]
#[command(name = "interlock")]
#[command(about = "Connection and layout engine for block-based editors")]
struct Cli {
    /// Log connections, previews and render passes
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a block definitions file
    Check {
        /// Block definitions (TOML)
        definitions: PathBuf,
    },
    /// Lay out a saved workspace and print it as SVG
    Render {
        /// Block definitions (TOML)
        #[arg(short, long)]
        definitions: PathBuf,

        /// Editor and SVG configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the layout style from the configuration
        #[arg(short, long)]
        style: Option<StyleArg>,

        /// Debug mode: log every block's bounds
        #[arg(long)]
        debug: bool,

        /// Saved workspace (TOML)
        workspace: PathBuf,
    },
    /// Simulate dragging a top-level block and report where it would land
    Probe {
        /// Block definitions (TOML)
        #[arg(short, long)]
        definitions: PathBuf,

        /// Editor configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Saved workspace (TOML)
        workspace: PathBuf,

        /// Index of the top-level block to pick up, in creation order
        #[arg(short, long, default_value_t = 0)]
        block: usize,

        /// Horizontal drag distance
        #[arg(long, allow_hyphen_values = true)]
        dx: f64,

        /// Vertical drag distance
        #[arg(long, allow_hyphen_values = true)]
        dy: f64,

        /// Leave the blocks below the picked-up block in place
        #[arg(long)]
        heal: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Stacked,
    Inline,
}

impl From<StyleArg> for LayoutStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Stacked => LayoutStyle::Stacked,
            StyleArg::Inline => LayoutStyle::Inline,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let result = match cli.command {
        Command::Check { definitions } => check(&definitions),
        Command::Render {
            definitions,
            config,
            style,
            debug,
            workspace,
        } => render(&definitions, config.as_deref(), style, debug, &workspace),
        Command::Probe {
            definitions,
            config,
            workspace,
            block,
            dx,
            dy,
            heal,
        } => probe(&definitions, config.as_deref(), &workspace, block, dx, dy, heal),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn read(path: &Path) -> Result<String, EditorError> {
    fs::read_to_string(path).map_err(|e| EditorError::Definition(e.into()))
}

fn read_state(path: &Path) -> Result<String, EditorError> {
    fs::read_to_string(path).map_err(|e| EditorError::State(e.into()))
}

fn render_config(path: Option<&Path>) -> Result<RenderConfig, EditorError> {
    match path {
        Some(path) => Ok(RenderConfig::from_file(path)?),
        None => Ok(RenderConfig::default()),
    }
}

fn check(path: &Path) -> Result<(), EditorError> {
    let source = read(path)?;
    let (registry, rejected) = BlockRegistry::load(&source)?;
    for err in &rejected {
        eprintln!("{}", err.report());
    }
    if rejected.is_empty() {
        println!("{}: {} block definitions OK", path.display(), registry.len());
        Ok(())
    } else {
        eprintln!(
            "{}: {} of {} block definitions rejected",
            path.display(),
            rejected.len(),
            registry.len() + rejected.len()
        );
        std::process::exit(1);
    }
}

fn render(
    definitions: &Path,
    config: Option<&Path>,
    style: Option<StyleArg>,
    debug: bool,
    workspace: &Path,
) -> Result<(), EditorError> {
    let mut config = render_config(config)?.with_debug(debug);
    if let Some(style) = style {
        config.editor = config.editor.with_style(style.into());
    }
    let svg = render_with_config(&read(definitions)?, &read_state(workspace)?, config)?;
    println!("{}", svg);
    Ok(())
}

fn probe(
    definitions: &Path,
    config: Option<&Path>,
    workspace: &Path,
    index: usize,
    dx: f64,
    dy: f64,
    heal: bool,
) -> Result<(), EditorError> {
    let mut ws = load_workspace(
        &read(definitions)?,
        &read_state(workspace)?,
        render_config(config)?.editor,
    )?;
    let top = ws.top_blocks();
    let Some(&block) = top.get(index) else {
        eprintln!(
            "Error: block index {} out of range ({} top-level blocks)",
            index,
            top.len()
        );
        std::process::exit(1);
    };

    let mut session = DragSession::start(&mut ws, block, heal)?;
    session.drag_to(&mut ws, dx, dy)?;

    match session.candidate() {
        Some(candidate) => println!(
            "candidate: {} -> {} (distance {:.2})",
            candidate.local, candidate.closest, candidate.distance
        ),
        None => println!("candidate: none"),
    }
    println!("preview: {:?}", session.preview_state());
    if session.would_delete() {
        println!("over deletion area");
    }

    match session.end(&mut ws)? {
        DropOutcome::Connected { local, target } => {
            println!("outcome: connected {} -> {}", local, target)
        }
        DropOutcome::Freestanding => println!("outcome: freestanding"),
        DropOutcome::Deleted => println!("outcome: deleted"),
    }
    if let Some(dropped) = ws.block(block) {
        println!("position: ({:.2}, {:.2})", dropped.position.x, dropped.position.y);
    }
    Ok(())
}
