use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Инспекция и правка TXRM-контейнеров
#[derive(Parser, Debug)]
#[command(name = "txrmio", version, about = "TXRM container inspection CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Geometry, field/stream counts and const arrays of a file
    Status {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List stream paths, optionally under a prefix
    Streams {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Raw payload of one stream
    Get {
        #[arg(long)]
        path: PathBuf,
        /// Stream path, e.g. ImageInfo/Angles
        #[arg(long)]
        stream: String,
        /// Optional file to write the raw payload into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Stream (or storage) existence check
    Exists {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        stream: String,
    },
    /// Decoded metadata as JSON (all fields, or one with --field)
    Meta {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        field: Option<String>,
    },
    /// Dry-run of the const/dynamic array classifier
    Classify {
        #[arg(long)]
        path: PathBuf,
        /// Overrides TXRM_CONST_DEVIATION
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Keep the first N images and save the result as a new file
    Truncate {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        keep: usize,
        /// Target name (".txrm" is appended when missing)
        #[arg(long)]
        out: PathBuf,
    },
}
