//! Veles CLI - Command-line tool for inspecting and extracting ZIP mounts.
//!
//! This is the main entry point for the Veles command-line application. All
//! archive access goes through the virtual file system layer, so everything
//! listed or extracted here behaves exactly as it would when mounted.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use veles_vfs::{
    FileAccessMode, FileSystem, FileType, LocalFileSystem, OpenFlags, OverlayFileSystem, Path,
    Stream,
};
use veles_zip::ZipArchiveFileSystem;

/// Veles - ZIP virtual file system tool
#[derive(Parser)]
#[command(name = "veles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the contents of an archive
    List {
        /// Path to the ZIP archive
        #[arg(short, long, env = "INPUT_ZIP")]
        archive: PathBuf,

        /// Password for encrypted entries
        #[arg(short, long, default_value = "")]
        password: String,

        /// Local directory mounted on top of the archive (repeatable)
        #[arg(long = "overlay")]
        overlays: Vec<PathBuf>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract an archive into a directory
    Extract {
        /// Path to the ZIP archive
        #[arg(short, long, env = "INPUT_ZIP")]
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Password for encrypted entries
        #[arg(short, long, default_value = "")]
        password: String,

        /// Local directory mounted on top of the archive (repeatable)
        #[arg(long = "overlay")]
        overlays: Vec<PathBuf>,
    },

    /// Print a single archived file to stdout
    Cat {
        /// Path to the ZIP archive
        #[arg(short, long, env = "INPUT_ZIP")]
        archive: PathBuf,

        /// Path of the file inside the archive
        path: String,

        /// Password for encrypted entries
        #[arg(short, long, default_value = "")]
        password: String,

        /// Local directory mounted on top of the archive (repeatable)
        #[arg(long = "overlay")]
        overlays: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List {
            archive,
            password,
            overlays,
            detailed,
        } => cmd_list(&archive, &password, &overlays, detailed)?,
        Commands::Extract {
            archive,
            output,
            password,
            overlays,
        } => cmd_extract(&archive, &output, &password, &overlays)?,
        Commands::Cat {
            archive,
            path,
            password,
            overlays,
        } => cmd_cat(&archive, &path, &password, &overlays)?,
    }

    Ok(())
}

fn open_mount(
    archive: &PathBuf,
    password: &str,
    overlays: &[PathBuf],
) -> Result<OverlayFileSystem> {
    let stream = veles_vfs::FileStream::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let zip_fs = ZipArchiveFileSystem::new(Box::new(stream), password)
        .context("Failed to parse archive")?;

    let mut mount = OverlayFileSystem::new();
    mount.push_layer(Arc::new(zip_fs));
    for dir in overlays {
        mount.push_layer(Arc::new(LocalFileSystem::new(dir)));
    }
    Ok(mount)
}

/// Collect every file below `dir`, depth first.
fn walk_files(fs: &dyn FileSystem, dir: &Path, out: &mut Vec<Path>) -> Result<()> {
    let mut subdirs = Vec::new();
    for name in fs.visit_directory(dir)? {
        let child = dir / &name?;
        let attr = fs.file_attribute(&child)?;
        match attr.file_type {
            FileType::Directory => subdirs.push(child),
            FileType::RegularFile => out.push(child),
        }
    }
    for subdir in subdirs {
        walk_files(fs, &subdir, out)?;
    }
    Ok(())
}

fn cmd_list(
    archive: &PathBuf,
    password: &str,
    overlays: &[PathBuf],
    detailed: bool,
) -> Result<()> {
    let start = Instant::now();
    let mount = open_mount(archive, password, overlays)?;

    let mut files = Vec::new();
    walk_files(&mount, &Path::new("."), &mut files)?;

    for file in &files {
        if detailed {
            let attr = mount.file_attribute(file)?;
            println!("{:>12} {:>12} {}", attr.size, attr.last_modified, file);
        } else {
            println!("{file}");
        }
    }

    println!("\nTotal: {} files ({:?})", files.len(), start.elapsed());
    Ok(())
}

fn cmd_extract(
    archive: &PathBuf,
    output: &PathBuf,
    password: &str,
    overlays: &[PathBuf],
) -> Result<()> {
    println!("Opening archive: {}", archive.display());

    let start = Instant::now();
    let mount = open_mount(archive, password, overlays)?;

    let mut files = Vec::new();
    walk_files(&mount, &Path::new("."), &mut files)?;
    println!("Extracting {} files...", files.len());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;
    for file in &files {
        let target = output.join(file.as_str());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = read_file(&mount, file)
            .with_context(|| format!("Failed to extract {file}"))?;
        fs::write(&target, data)?;
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!("Extraction completed in {:?}", start.elapsed());
    Ok(())
}

fn cmd_cat(archive: &PathBuf, path: &str, password: &str, overlays: &[PathBuf]) -> Result<()> {
    use std::io::Write as _;

    let mount = open_mount(archive, password, overlays)?;
    let data = read_file(&mount, &Path::new(path))
        .with_context(|| format!("Failed to read {path}"))?;
    std::io::stdout().write_all(&data)?;
    Ok(())
}

fn read_file(fs: &dyn FileSystem, path: &Path) -> Result<Vec<u8>> {
    let mut stream = fs
        .open_file(path, FileAccessMode::Read, OpenFlags::default())
        .map_err(anyhow::Error::from)?;
    let mut data = vec![0u8; stream.len().map_err(anyhow::Error::from)? as usize];
    stream.read_exact(&mut data).map_err(anyhow::Error::from)?;
    Ok(data)
}
