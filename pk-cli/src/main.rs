use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod pack;
mod unpack;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an archive from a set of files or a single directory
    CreateArchive(CreateArchiveCommand),
    /// List the content of an archive
    ListContent(ListContentCommand),
    /// Unpack all the content of an archive to a destination directory
    FullUnpack(FullUnpackCommand),
    /// Unpack some files of an archive to a destination directory
    Unpack(UnpackCommand),
}

#[derive(Debug, Args)]
struct CreateArchiveCommand {
    /// Directory the archive is created in
    destination: PathBuf,
    /// Archive name, without the `.pk` extension
    name: String,
    /// Files to pack, or exactly one directory to pack recursively
    #[arg(required = true)]
    sources: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ListContentCommand {
    /// Archive file path
    archive: PathBuf,
}

#[derive(Debug, Args)]
struct FullUnpackCommand {
    /// Archive file path
    archive: PathBuf,
    /// Output directory path
    destination: PathBuf,
}

#[derive(Debug, Args)]
struct UnpackCommand {
    /// Archive file path
    archive: PathBuf,
    /// Output directory path
    destination: PathBuf,
    /// Entry names to unpack
    #[arg(required = true)]
    files: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::CreateArchive(cmd) => pack::create_archive(cmd),
        Command::ListContent(cmd) => unpack::list_content(cmd),
        Command::FullUnpack(cmd) => unpack::full_unpack(cmd),
        Command::Unpack(cmd) => unpack::unpack(cmd),
    }
}
