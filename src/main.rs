//! tdc CLI - Command-line tool for the TERA Data Center.
//!
//! This is the main entry point for the tdc command-line application.

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tdc::prelude::*;

/// tdc - TERA Data Center unpacking and inspection tool
#[derive(Parser)]
#[command(name = "tdc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Decryption key (32 hex digits)
    #[arg(long, global = true, env = "TDC_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Decryption IV (32 hex digits)
    #[arg(long, global = true, env = "TDC_IV", hide_env_values = true)]
    iv: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// Path to the Data Center file
    #[arg(short, long, env = "TDC_INPUT")]
    input: PathBuf,

    /// The input was already unpacked (no key or IV needed)
    #[arg(long)]
    unpacked: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decrypt and inflate a Data Center file
    Unpack {
        /// Path to the encrypted Data Center file
        #[arg(short, long, env = "TDC_INPUT")]
        input: PathBuf,

        /// Output file for the unpacked buffer
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show header, region and name table statistics
    Info {
        #[command(flatten)]
        input: Input,
    },

    /// Print the element tree
    Tree {
        #[command(flatten)]
        input: Input,

        /// Slash-separated child names to start from (first match per level)
        #[arg(short, long)]
        path: Option<String>,

        /// Levels of children to print below the start element
        #[arg(short, long, default_value_t = 2)]
        depth: usize,

        /// Print JSON instead of an indented tree
        #[arg(long)]
        json: bool,
    },

    /// Export the Data Center to XML files
    Export {
        #[command(flatten)]
        input: Input,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern for root child names (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install the log subscriber")?;

    let keys = Keys {
        key: cli.key.as_deref(),
        iv: cli.iv.as_deref(),
    };

    match cli.command {
        Commands::Unpack { input, output } => {
            cmd_unpack(&keys, &input, &output)?;
        }
        Commands::Info { input } => {
            cmd_info(&keys, &input)?;
        }
        Commands::Tree { input, path, depth, json } => {
            cmd_tree(&keys, &input, path.as_deref(), depth, json)?;
        }
        Commands::Export { input, output, filter } => {
            cmd_export(&keys, &input, &output, filter.as_deref())?;
        }
    }

    Ok(())
}

struct Keys<'a> {
    key: Option<&'a str>,
    iv: Option<&'a str>,
}

impl Keys<'_> {
    fn resolve(&self) -> Result<(Key, Iv)> {
        let key = self.key.ok_or_else(|| anyhow!("--key (or TDC_KEY) is required"))?;
        let iv = self.iv.ok_or_else(|| anyhow!("--iv (or TDC_IV) is required"))?;
        Ok((parse_hex16(key).context("Invalid key")?, parse_hex16(iv).context("Invalid IV")?))
    }
}

/// Parse a 16-byte value written as 32 hex digits.
fn parse_hex16(text: &str) -> Result<[u8; 16]> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let bytes = hex::decode(&cleaned).with_context(|| format!("'{text}' is not hex"))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("expected 16 bytes, got {len}"))
}

fn open(keys: &Keys<'_>, input: &Input) -> Result<DataCenter> {
    let start = Instant::now();
    let data_center = if input.unpacked {
        DataCenter::open_unpacked(&input.input)
            .with_context(|| format!("Failed to open {}", input.input.display()))?
    } else {
        let (key, iv) = keys.resolve()?;
        DataCenter::load(&input.input, key, iv)
            .with_context(|| format!("Failed to load {}", input.input.display()))?
    };
    debug!(elapsed = ?start.elapsed(), "Data Center ready");
    Ok(data_center)
}

fn cmd_unpack(keys: &Keys<'_>, input: &Path, output: &Path) -> Result<()> {
    let (key, iv) = keys.resolve()?;

    let start = Instant::now();
    let data = Unpacker::new(key, iv)
        .unpack_file(input)
        .with_context(|| format!("Failed to unpack {}", input.display()))?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &data).with_context(|| format!("Failed to write {}", output.display()))?;

    info!(bytes = data.len(), elapsed = ?start.elapsed(), output = %output.display(), "unpacked");
    Ok(())
}

fn cmd_info(keys: &Keys<'_>, input: &Input) -> Result<()> {
    let dc = open(keys, input)?;
    let stats = dc.stats();

    println!("Data Center: {}", input.input.display());
    println!("  Unpacked size:   {} bytes", stats.unpacked_size);
    println!(
        "  Header:          {}",
        dc.header()
            .words
            .iter()
            .map(|w| format!("{w:#010x}"))
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!("  Opaque records:  {}", stats.opaque_records);
    println!("  Elements:        {} in {} buckets", stats.elements, stats.element_buckets);
    println!("  Attributes:      {} in {} buckets", stats.attributes, stats.attribute_buckets);
    println!("  Value strings:   {} in {} buckets", stats.value_indices, stats.value_buckets);
    println!("  Names:           {} in {} buckets", stats.names, stats.name_buckets);

    let root = dc.root()?;
    println!("  Root:            {} ({} children)", root.name(), root.child_count());

    Ok(())
}

fn cmd_tree(keys: &Keys<'_>, input: &Input, path: Option<&str>, depth: usize, json: bool) -> Result<()> {
    let dc = open(keys, input)?;
    let root = dc.root()?;

    let start = match path {
        Some(path) => {
            let names = path.split('/').filter(|s| !s.is_empty());
            root.descendant(names)?
                .ok_or_else(|| anyhow!("No element at path '{path}'"))?
        }
        None => root,
    };

    if json {
        let tree = element_json(&start, depth)?;
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print_element(&start, depth, 0)?;
    }

    Ok(())
}

fn print_element(element: &Element<'_>, depth: usize, indent: usize) -> Result<()> {
    let mut line = format!("{:indent$}{}", "", element.name(), indent = indent * 2);
    for attribute in element.attributes() {
        let attribute = attribute?;
        line.push_str(&format!(" {}=\"{}\"", attribute.name(), attribute.value()?));
    }
    if depth == 0 && element.child_count() > 0 {
        line.push_str(&format!(" [{} children]", element.child_count()));
    }
    println!("{line}");

    if depth > 0 {
        for child in element.children() {
            print_element(&child?, depth - 1, indent + 1)?;
        }
    }
    Ok(())
}

fn element_json(element: &Element<'_>, depth: usize) -> Result<serde_json::Value> {
    let attributes = element
        .attributes()
        .map(|attribute| -> Result<serde_json::Value> {
            let attribute = attribute?;
            Ok(serde_json::json!({
                "name": attribute.name(),
                "value": serde_json::to_value(attribute.value()?)?,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut object = serde_json::json!({
        "name": element.name(),
        "attributes": attributes,
        "child_count": element.child_count(),
    });

    if depth > 0 {
        let children = element
            .children()
            .map(|child| element_json(&child?, depth - 1))
            .collect::<Result<Vec<_>>>()?;
        object["children"] = serde_json::Value::Array(children);
    }

    Ok(object)
}

fn cmd_export(keys: &Keys<'_>, input: &Input, output: &Path, filter: Option<&str>) -> Result<()> {
    let dc = open(keys, input)?;
    let exporter = XmlExporter::new(&dc);

    let mut groups = exporter.groups()?;
    if let Some(filter) = filter {
        let pattern = Pattern::new(filter).with_context(|| format!("Invalid filter '{filter}'"))?;
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::default()
        };
        groups.retain(|group| pattern.matches_with(&group.name, options));
    }

    let total: usize = groups.iter().map(|g| g.elements.len()).sum();
    if total == 0 {
        bail!("Nothing to export");
    }
    println!("Exporting {} elements to {}...", total, output.display());

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let stats = exporter.export_groups(output, &groups, |done, _| pb.set_position(done as u64))?;
    pb.finish_and_clear();

    println!(
        "Exported {} of {} files in {:?} ({} errors)",
        stats.exported,
        stats.total,
        start.elapsed(),
        stats.errors
    );

    Ok(())
}
