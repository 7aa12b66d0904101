use clap::Parser;
use std::path::PathBuf;

use crate::pane::ResourceMetadata;

/// Follow a log file in a window that keeps up with new output.
#[derive(Debug, Parser)]
#[command(name = "log-pane", version, about)]
pub struct Args {
    /// Log file to display
    pub file: Option<PathBuf>,

    /// Pod ID shown above the log (repeatable)
    #[arg(long = "pod-id", value_name = "ID")]
    pub pod_ids: Vec<String>,

    /// Endpoint URL shown above the log (repeatable)
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoints: Vec<String>,

    /// Start with the control bar hidden
    #[arg(long)]
    pub expanded: bool,

    /// Do not watch the file for changes
    #[arg(long)]
    pub no_tail: bool,

    /// JSON config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn metadata(&self) -> ResourceMetadata {
        ResourceMetadata {
            pod_ids: self.pod_ids.clone(),
            endpoints: self.endpoints.clone(),
        }
    }
}
