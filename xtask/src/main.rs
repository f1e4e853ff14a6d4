use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Generate a synthetic sourcemap directory for manual exploration
    Fixture {
        /// Output directory, defaults to `target/fixtures/sourcemaps`
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 40)]
        chunks: usize,
        #[arg(long, default_value_t = 25)]
        modules_per_chunk: usize,
    },
    /// Summarize the sourcemaps found under a directory
    Stats { dir: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Fixture {
            out,
            chunks,
            modules_per_chunk,
        } => {
            let out = match out {
                Some(out) => out,
                None => default_fixture_dir()?,
            };
            write_fixture(&out, chunks, modules_per_chunk)?;
            println!("wrote {chunks} sourcemaps to {}", out.display());
        }
        Commands::Stats { dir } => print_stats(&dir)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn default_fixture_dir() -> Result<PathBuf> {
    let metadata = cargo_metadata::MetadataCommand::new()
        .no_deps()
        .exec()
        .context("failed to read cargo metadata")?;
    Ok(metadata
        .target_directory
        .join("fixtures")
        .join("sourcemaps")
        .into_std_path_buf())
}

/// Chunks overlap by half their modules so shared modules and cycles show up.
fn write_fixture(out: &Path, chunks: usize, modules_per_chunk: usize) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let stride = (modules_per_chunk / 2).max(1);
    for chunk in 0..chunks {
        let first = chunk * stride;
        let modules: Vec<usize> = (first..first + modules_per_chunk).collect();
        let map = chunk_map(chunk, &modules);
        let path = out.join(format!("chunk-{chunk:03}.js.map"));
        fs::write(&path, serde_json::to_vec(&map)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn chunk_map(chunk: usize, modules: &[usize]) -> Value {
    let sources: Vec<String> = modules
        .iter()
        .map(|module| format!("webpack:///src/pkg{}/module{module}.js", module % 7))
        .collect();
    let contents: Vec<String> = modules
        .iter()
        .map(|module| {
            format!(
                "const unused{module} = 0;\nexport function handler{module}(event) {{\n  return event.value + {module};\n}}\n"
            )
        })
        .collect();
    // Generated line `i` maps to the second line of source `i`, from column 0.
    let mut mappings = String::from("AACA");
    for _ in 1..modules.len() {
        mappings.push_str(";ACAA");
    }
    json!({
        "version": 3,
        "file": format!("chunk-{chunk:03}.js"),
        "sources": sources,
        "sourcesContent": contents,
        "names": [],
        "mappings": if modules.is_empty() { String::new() } else { mappings },
    })
}

fn print_stats(dir: &Path) -> Result<()> {
    let mut files = 0usize;
    let mut bytes = 0u64;
    let mut sources = 0usize;
    let mut with_content = 0usize;
    for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "map") {
            continue;
        }
        files += 1;
        bytes += entry.metadata()?.len();
        let text =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let Ok(map) = serde_json::from_str::<Value>(&text) else {
            eprintln!("skipping invalid sourcemap {}", path.display());
            continue;
        };
        sources += map["sources"].as_array().map_or(0, Vec::len);
        with_content += map["sourcesContent"]
            .as_array()
            .map_or(0, |contents| contents.iter().filter(|c| c.is_string()).count());
    }
    println!("{files} sourcemaps, {:.1} kB", bytes as f64 / 1024.0);
    println!("{sources} source references, {with_content} with embedded content");
    Ok(())
}
