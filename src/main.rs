//! # Omnivore - Binary Editor Core
//!
//! Command-line front end for the editing pipeline and the tile manager.
//!
//! ## Quick Start
//!
//! ```bash
//! # XOR bytes 0x10..0x20 of a file with 0xff, writing a copy
//! cargo run -- apply game.xex xor_value --value 0xff --range 0x10:0x20 -o patched.xex
//!
//! # Find a hex pattern or text
//! cargo run -- find game.xex "a9 00"
//!
//! # Check a saved tile layout and print where each pane lands
//! cargo run -- layout session.json --width 1280 --height 800
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omnivore_core::search::SearcherFactory;
use omnivore_core::{Config, Editor};
use omnivore_segment::IndexRange;
use omnivore_tile::{HeadlessHost, Rect, TileConfig, TileLayout, TileManager};

/// Omnivore - binary editor core
#[derive(Parser, Debug)]
#[command(name = "omnivore")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Apply a byte transform to ranges of a file
    Apply {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Transform name, e.g. xor_value, ramp_up, reverse_bits
        op: String,

        /// Operand for transforms that take one
        #[arg(long, value_parser = parse_byte)]
        value: Option<u8>,

        /// Byte range START:END (end exclusive); repeatable
        #[arg(short, long = "range", value_parser = parse_range, required = true)]
        ranges: Vec<IndexRange>,

        /// Write here instead of overwriting FILE
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Search a file with the enabled searchers
    Find {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        query: String,

        /// Searchers to use instead of the configured ones
        #[arg(short, long = "searcher")]
        searchers: Vec<String>,
    },

    /// Restore a tile layout headlessly and print the result
    Layout {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, default_value_t = 1024)]
        width: i32,

        #[arg(long, default_value_t = 768)]
        height: i32,
    },
}

/// Everything read from the config file: editor sections at the top level
/// plus a `[tile]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    #[serde(flatten)]
    core: Config,
    tile: TileConfig,
}

impl Settings {
    fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Config::default_path() {
                Ok(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

fn parse_number(text: &str) -> Result<usize, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix('$')) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|err| format!("invalid number '{}': {}", text, err))
}

fn parse_byte(text: &str) -> Result<u8, String> {
    let value = parse_number(text)?;
    u8::try_from(value).map_err(|_| format!("{} does not fit in a byte", text))
}

fn parse_range(text: &str) -> Result<IndexRange, String> {
    let (start, end) = text
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{}'", text))?;
    let (start, end) = (parse_number(start)?, parse_number(end)?);
    if end < start {
        return Err(format!("range {} ends before it starts", text));
    }
    Ok((start, end))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    tracing::info!("Starting Omnivore v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(args.config.as_deref())?;
    match args.command {
        Cmd::Apply {
            file,
            op,
            value,
            ranges,
            output,
        } => apply(&settings, &file, &op, value, &ranges, output.as_deref()),
        Cmd::Find {
            file,
            query,
            searchers,
        } => find(&settings, &file, &query, &searchers),
        Cmd::Layout {
            file,
            width,
            height,
        } => layout(&settings, &file, Rect::new(0, 0, width, height)),
    }
}

fn apply(
    settings: &Settings,
    file: &Path,
    op: &str,
    value: Option<u8>,
    ranges: &[IndexRange],
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut editor = Editor::open(file, settings.core.clone())
        .with_context(|| format!("opening {}", file.display()))?;
    let Some(op) = editor.byte_op(op, value) else {
        bail!("unknown transform '{}'", op);
    };
    let len = editor.segment().len();
    if let Some(&(_, end)) = ranges.iter().find(|&&(_, end)| end > len) {
        bail!("range end {:#x} is past the end of the file ({:#x} bytes)", end, len);
    }
    editor.carets_mut().select_ranges(ranges);

    let name = op.short_name();
    let flags = editor.transform(op);
    if !flags.success {
        bail!("{}", flags.errors.join("; "));
    }
    if let Some(message) = &flags.message {
        println!("{}", message);
    }
    match output {
        Some(path) => editor.save_as(path)?,
        None => editor.save()?,
    }
    let count: usize = ranges.iter().map(|(start, end)| end - start).sum();
    println!("{}: {} bytes in {} ranges", name, count, ranges.len());
    Ok(())
}

fn find(settings: &Settings, file: &Path, query: &str, searchers: &[String]) -> anyhow::Result<()> {
    let mut editor = Editor::open(file, settings.core.clone())
        .with_context(|| format!("opening {}", file.display()))?;
    let flags = if searchers.is_empty() {
        editor.find_all(query)
    } else {
        editor.find_all_with(&SearcherFactory::by_names(searchers), query)
    };
    if !flags.success {
        bail!("{}", flags.errors.join("; "));
    }
    let results = editor.search_results();
    for &(start, end) in results.matches() {
        let names = results.names_at(start).unwrap_or_default();
        println!("{:06x}-{:06x}  {}", start, end, names);
    }
    println!("{} matches", results.len());
    Ok(())
}

fn layout(settings: &Settings, file: &Path, window: Rect) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let saved = TileLayout::parse(&text).context("parsing layout")?;

    let mut manager = TileManager::new(HeadlessHost::new(), settings.tile.clone());
    manager.set_window(window);
    manager.restore_layout(&saved).context("restoring layout")?;

    println!("{}", manager.calc_layout_json(true)?);
    for (leaf, client) in manager.iter_leaves() {
        if let Some(rect) = manager.tree().rect(leaf) {
            println!("{} {}  {}", leaf, client.id(), rect);
        }
    }
    for sidebar in manager.sidebars() {
        println!("{} sidebar {}  {} items", sidebar.side(), sidebar.rect(), sidebar.len());
    }
    println!("usable {}", manager.usable_rect());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_apply() {
        let args = Args::parse_from([
            "omnivore", "apply", "game.xex", "xor_value", "--value", "0xff", "-r", "0x10:0x20", "-r", "4:8",
        ]);
        match args.command {
            Cmd::Apply { op, value, ranges, output, .. } => {
                assert_eq!(op, "xor_value");
                assert_eq!(value, Some(0xff));
                assert_eq!(ranges, vec![(0x10, 0x20), (4, 8)]);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_args_layout_defaults() {
        let args = Args::parse_from(["omnivore", "-vv", "layout", "session.json"]);
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.command, Cmd::Layout { width: 1024, height: 768, .. }));
    }

    #[test]
    fn test_apply_requires_range() {
        assert!(Args::try_parse_from(["omnivore", "apply", "f", "zero"]).is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("$10:$20"), Ok((16, 32)));
        assert!(parse_range("20:10").is_err());
        assert!(parse_range("10").is_err());
        assert!(parse_byte("256").is_err());
    }

    #[test]
    fn test_settings_tile_table() {
        let settings: Settings = toml::from_str(
            "[editor]\nundo_limit = 5\n\n[tile]\nsizer_thickness = 8\ndock_target_mode = \"split\"\n",
        )
        .unwrap();
        assert_eq!(settings.core.editor.undo_limit, 5);
        assert_eq!(settings.tile.sizer_thickness, 8);
        assert_eq!(settings.tile.title_bar_height, 20);
    }

    #[test]
    fn test_layout_command_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        let manager = TileManager::new(HeadlessHost::new(), TileConfig::default());
        std::fs::write(&path, manager.calc_layout_json(false).unwrap()).unwrap();
        layout(&Settings::default(), &path, Rect::new(0, 0, 640, 480)).unwrap();
    }
}
