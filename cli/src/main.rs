//! glyphcycle CLI - editor command entry point.
//!
//! # Architecture
//!
//! The binary is the host around [`glyphcycle_types`]: it loads the cycle
//! configuration once, builds the [`CycleMap`], and hands it by reference to
//! whichever subcommand runs.
//!
//! ```text
//! main() -> Cli::try_parse() -> GlyphCycleConfig::load() -> cycle_map()
//!                                                              |
//!                                                              v
//!                                replace | list | path | edit
//! ```
//!
//! `replace` is what an editor binds to a key: the current line arrives on
//! stdin, the caret's byte offset in `--boundary` (or `TM_LINE_INDEX`), and
//! the line with the glyph before the caret cycled goes to stdout. With
//! `--tooltip`, every failure (bad arguments included) is printed to stdout
//! with exit code 206 instead.

mod editor;
mod logging;

use std::{
    borrow::Cow,
    env,
    ffi::OsString,
    io::{self, Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};

use glyphcycle_config::{CONFIG_ENV_VAR, ConfigSource, GlyphCycleConfig, config_path};
use glyphcycle_types::{Cycle, CycleMap, Direction, substitute};

/// Exit code that tells the hosting editor to show stdout as a tooltip.
const EXIT_SHOW_TOOLTIP: u8 = 206;

#[derive(Debug, Parser)]
#[command(name = "glyphcycle", version)]
#[command(about = "Cycle the character before the cursor through look-alike glyphs")]
struct Cli {
    /// Cycle config file (default: ~/.glyphcycle/config.toml)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Read text from stdin and cycle the glyph before the cursor
    Replace(ReplaceArgs),
    /// Print every configured cycle
    List,
    /// Print the config file location
    Path,
    /// Install the default config if needed and open it in an editor
    Edit {
        /// Editor command (default: $VISUAL, then $EDITOR, then vi)
        #[arg(long)]
        editor: Option<String>,
        /// Overwrite the config with the built-in defaults first
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Debug, Args)]
struct ReplaceArgs {
    /// Byte offset just after the glyph to replace
    #[arg(long, env = "TM_LINE_INDEX")]
    boundary: usize,
    /// Step backwards through the cycle
    #[arg(long)]
    reverse: bool,
    /// Report errors on stdout with exit code 206 so the editor shows a tooltip
    #[arg(long)]
    tooltip: bool,
}

fn main() -> ExitCode {
    let args: Vec<OsString> = env::args_os().collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() && tooltip_requested(&args) => {
            println!("{}", usage_error_message(&err));
            return ExitCode::from(EXIT_SHOW_TOOLTIP);
        }
        Err(err) => err.exit(),
    };
    logging::init_tracing();

    let tooltip = matches!(&cli.command, Commands::Replace(args) if args.tooltip);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(report_failure(&err, tooltip))
        }
    }
}

/// Print `err` where the editor will show it and return the exit code.
fn report_failure(err: &anyhow::Error, tooltip: bool) -> u8 {
    if tooltip {
        println!("{err:#}");
        EXIT_SHOW_TOOLTIP
    } else {
        eprintln!("glyphcycle: {err:#}");
        1
    }
}

/// Whether the raw command line asked for tooltip error reporting.
///
/// Checked before parsing succeeds, so a bad `--boundary` still reaches
/// the editor as a tooltip.
fn tooltip_requested(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|arg| *arg != "--")
        .any(|arg| arg == "--tooltip")
}

/// First line of a clap error, without the usage block.
fn usage_error_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Replace(args) => {
            let map = load_cycle_map(cli.config)?;
            let mut input = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut input)
                .context("failed to read text from stdin")?;

            let output = replace(&map, &input, &args)?;

            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&output)
                .and_then(|()| stdout.flush())
                .context("failed to write replaced text")
        }
        Commands::List => {
            let loaded = GlyphCycleConfig::load(cli.config.as_deref())?;
            for (label, cycle) in loaded.config.labelled_cycles()? {
                println!("{}", format_cycle(&label, &cycle));
            }
            Ok(())
        }
        Commands::Path => {
            let path = resolve_config_path(cli.config)?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Edit {
            editor: command,
            reset,
        } => {
            let path = resolve_config_path(cli.config)?;
            if reset {
                glyphcycle_config::reset_default(&path)?;
            } else {
                glyphcycle_config::install_default(&path)?;
            }
            editor::open(&editor::resolve_editor(command.as_deref()), &path)
        }
    }
}

fn load_cycle_map(config: Option<PathBuf>) -> Result<CycleMap> {
    let loaded = GlyphCycleConfig::load(config.as_deref())?;
    match &loaded.source {
        ConfigSource::File(path) => {
            tracing::debug!(path = %path.display(), "Using cycle config file");
        }
        ConfigSource::Builtin { expected } => {
            tracing::debug!(expected = ?expected, "Using built-in cycles");
        }
    }
    Ok(loaded.config.cycle_map()?)
}

fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(config_path)
        .ok_or_else(|| anyhow!("could not determine home directory; pass --config"))
}

fn replace<'a>(map: &CycleMap, input: &'a [u8], args: &ReplaceArgs) -> Result<Cow<'a, [u8]>> {
    let direction = Direction::from_reverse(args.reverse);
    let output = substitute(map, input, args.boundary, direction)?;
    if matches!(output, Cow::Borrowed(_)) {
        tracing::debug!(boundary = args.boundary, "No mapping for glyph before cursor");
    }
    Ok(output)
}

fn format_cycle(label: &str, cycle: &Cycle) -> String {
    let mut line = format!("{label}: ");
    for glyph in cycle.glyphs() {
        line.push_str(glyph);
        line.push_str(" → ");
    }
    line.push_str(&cycle.glyphs()[0]);
    line
}
