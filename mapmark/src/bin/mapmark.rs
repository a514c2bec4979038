use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use mapmark::{EditorConfig, IncomingFile, LoadedMap, Session, SVG_MIME};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mapmark", version, about = "Rename or exclude the regions of an SVG map")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// JSON editor configuration (endpoint, file names, payload name).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List the regions of a map.
    Regions { file: PathBuf },
    /// Print the sanitized preview markup.
    Preview { file: PathBuf },
    /// Write the edited map and its id mapping.
    Export(ExportArgs),
}

#[derive(Parser)]
struct ExportArgs {
    file: PathBuf,

    /// Relabel a region, e.g. `--label 1=Bravo`.
    #[arg(long = "label", value_name = "INDEX=TEXT", value_parser = parse_label)]
    labels: Vec<(usize, String)>,

    /// Exclude a region by index.
    #[arg(long = "exclude", value_name = "INDEX")]
    excluded: Vec<usize>,

    /// `name` written into the JSON part.
    #[arg(long)]
    name: Option<String>,

    #[arg(long = "out-dir", value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Also write the multipart upload body to this path.
    #[arg(long, value_name = "PATH")]
    multipart: Option<PathBuf>,
}

fn parse_label(s: &str) -> Result<(usize, String), String> {
    let (index, text) = s.split_once('=').ok_or_else(|| format!("expected INDEX=TEXT, got `{s}`"))?;
    let index = index.trim().parse().map_err(|e| format!("bad region index `{index}`: {e}"))?;
    Ok((index, text.to_string()))
}

fn main() {
    let cli = Cli::parse();
    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbosity.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(error) = run(cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            EditorConfig::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))?
        }
        None => EditorConfig::default(),
    };
    match cli.command {
        Command::Regions { file } => {
            let session = open(config, &file)?;
            if let Some(map) = session.map() {
                for r in map.store().iter() {
                    println!(
                        "{:>5}  {:<24}  {}",
                        r.index,
                        if r.original_id.is_empty() { "-" } else { r.original_id.as_str() },
                        r.original_style.fill.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Command::Preview { file } => {
            let session = open(config, &file)?;
            if let Some(map) = session.map() {
                println!("{}", map.preview());
            }
        }
        Command::Export(args) => export(config, args)?,
    }
    Ok(())
}

fn open(config: EditorConfig, path: &Path) -> Result<Session> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let mut session = Session::new(config);
    session
        .load(IncomingFile::new(name, SVG_MIME, bytes))
        .with_context(|| format!("load map {}", path.display()))?;
    Ok(session)
}

/// Applies label edits, then exclusions. Excluding an index twice is the
/// same as excluding it once.
fn apply_edits(map: &mut LoadedMap, labels: &[(usize, String)], excluded: &[usize]) -> Result<()> {
    for (index, text) in labels {
        if !map.input_changed(*index, text) {
            bail!("no region with index {index}");
        }
    }
    for index in excluded {
        map.set_excluded(*index, true)
            .ok_or_else(|| anyhow!("no region with index {index}"))?;
    }
    Ok(())
}

fn export(mut config: EditorConfig, args: ExportArgs) -> Result<()> {
    if args.name.is_some() {
        config.payload_name = args.name.clone();
    }
    let mut session = open(config, &args.file)?;
    let config = session.config().clone();
    let map = session.map_mut().ok_or_else(|| anyhow!("no map loaded"))?;
    apply_edits(map, &args.labels, &args.excluded)?;
    let payload = map.export(&config).context("export map")?;

    fs::create_dir_all(&args.out_dir).with_context(|| format!("create {}", args.out_dir.display()))?;
    for part in [&payload.svg, &payload.json] {
        let path = args.out_dir.join(&part.file_name);
        fs::write(&path, &part.bytes).with_context(|| format!("write {}", path.display()))?;
    }
    if let Some(path) = &args.multipart {
        let (boundary, body) = payload.to_multipart();
        fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
        println!("{}", mapmark::ExportPayload::content_type(&boundary));
    }
    tracing::info!(out_dir = %args.out_dir.display(), mapped = payload.mapping.len(), "export written");
    Ok(())
}
