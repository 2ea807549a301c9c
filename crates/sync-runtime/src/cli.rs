//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

/// image-sync: mirror a folder of images into a remote scene
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "image-sync")]
#[command(about = "Keeps textured image objects in a remote scene in step with a folder")]
pub struct Args {
    /// Host WebSocket endpoint [default: ws://localhost:8765]
    pub endpoint: Option<String>,

    /// Folder to watch, created if missing [default: ./images]
    pub watch_dir: Option<PathBuf>,

    /// How long each call waits for its reply, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// How far below the root node name lookups search
    #[arg(long)]
    pub lookup_depth: Option<u32>,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,
}
