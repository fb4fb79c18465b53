//! Transarc CLI - pack and unpack `.assets` archives.

mod commands;
mod logger;
mod utils;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{
    ExtractOptions, ListOptions, cmd_create, cmd_extract, cmd_info, cmd_list, cmd_multi_create,
    cmd_repack, cmd_test,
};
use std::path::PathBuf;
use transarc_core::{Compression, CompressionLevel};

#[derive(Parser)]
#[command(name = "transarc")]
#[command(author, version, about = "Asset archive tool for .assets files")]
#[command(long_about = "
Transarc packs directories of game assets into .assets archives and
reads them back. Payloads are stored as-is or compressed with Deflate
or the fast block compressor.

Examples:
  transarc create game/data
  transarc create game/data -o data.assets -c deflate -l smallest-size
  transarc multi-create game --delete
  transarc list data.assets --long
  transarc list data.assets --json -I '*.png'
  transarc extract data.assets -o unpacked
  transarc repack data.assets data-fast.assets -c fast-block
  transarc test data.assets
  transarc info data.assets
")]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a directory into one archive
    #[command(alias = "c")]
    Create {
        /// Directory to pack
        source: PathBuf,

        /// Output archive (defaults to <source>.assets)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Payload compression
        #[arg(short, long, value_enum, default_value = "none")]
        compression: CompressionArg,

        /// Compression level
        #[arg(short, long, value_enum, default_value = "optimal")]
        level: LevelArg,

        /// Extra file extensions to leave out (without the dot)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Pack every subdirectory of a root into its own archive
    #[command(alias = "m")]
    MultiCreate {
        /// Directory whose subdirectories are packed
        root: PathBuf,

        /// Payload compression
        #[arg(short, long, value_enum, default_value = "none")]
        compression: CompressionArg,

        /// Compression level
        #[arg(short, long, value_enum, default_value = "optimal")]
        level: LevelArg,

        /// Remove each subdirectory once its archive is written
        #[arg(long)]
        delete: bool,
    },

    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show type, sizes and ratio per entry
        #[arg(long)]
        long: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only entries matching pattern (glob syntax: *.png, shaders/**/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Extract entries from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Include only entries matching pattern (glob syntax)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Re-encode an archive with another compression
    #[command(alias = "r")]
    Repack {
        /// Archive to read
        input: PathBuf,

        /// Archive to write
        output: PathBuf,

        /// Payload compression for the output
        #[arg(short, long, value_enum, default_value = "deflate")]
        compression: CompressionArg,

        /// Compression level for the output
        #[arg(short, long, value_enum, default_value = "optimal")]
        level: LevelArg,
    },

    /// Decode every entry and report failures
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,
    },

    /// Show information about an archive
    #[command(alias = "i")]
    Info {
        /// Archive file to inspect
        archive: PathBuf,
    },
}

/// Payload compression kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompressionArg {
    /// Store payloads as-is
    None,
    /// Deflate
    Deflate,
    /// LZ4-style block compressor
    FastBlock,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => Compression::None,
            CompressionArg::Deflate => Compression::Deflate,
            CompressionArg::FastBlock => Compression::FastBlock,
        }
    }
}

/// Compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LevelArg {
    /// The kind's own default
    Default,
    /// Balance ratio and speed
    Optimal,
    /// Favor speed
    Fastest,
    /// Store without compressing (only valid with `none`)
    NoCompression,
    /// Favor ratio
    SmallestSize,
}

impl From<LevelArg> for CompressionLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Default => CompressionLevel::Default,
            LevelArg::Optimal => CompressionLevel::Optimal,
            LevelArg::Fastest => CompressionLevel::Fastest,
            LevelArg::NoCompression => CompressionLevel::NoCompression,
            LevelArg::SmallestSize => CompressionLevel::SmallestSize,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let result = match cli.command {
        Commands::Create {
            source,
            output,
            compression,
            level,
            exclude,
        } => cmd_create(
            &source,
            output.as_deref(),
            compression.into(),
            level.into(),
            &exclude,
        ),
        Commands::MultiCreate {
            root,
            compression,
            level,
            delete,
        } => cmd_multi_create(&root, compression.into(), level.into(), delete),
        Commands::List {
            archive,
            long,
            json,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                long,
                json,
                include: &include,
                exclude: &exclude,
            },
        ),
        Commands::Extract {
            archive,
            output,
            include,
            exclude,
            no_progress,
        } => cmd_extract(
            &archive,
            &ExtractOptions {
                output: &output,
                include: &include,
                exclude: &exclude,
                progress: !no_progress,
            },
        ),
        Commands::Repack {
            input,
            output,
            compression,
            level,
        } => cmd_repack(&input, &output, compression.into(), level.into()),
        Commands::Test { archive } => cmd_test(&archive),
        Commands::Info { archive } => cmd_info(&archive),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
