//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stageward")]
#[command(about = "Stageward - staged workflow enforcement", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of the .stageward/ hierarchy
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep workflow state under this directory instead of the configured root
    #[arg(long, global = true, value_name = "DIR")]
    pub state_root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a new workflow with the given objective
    Init {
        /// User objective the workflow exists to satisfy
        objective: String,
    },

    /// Run the quality gate without transitioning
    ///
    /// Exits 0 only when the gate says PROCEED.
    Check {
        /// Workflow id (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,

        /// Stage to check instead of the current one
        #[arg(short, long)]
        stage: Option<String>,

        /// Check records from a JSON file instead of the recorded outputs
        #[arg(short, long)]
        outputs: Option<PathBuf>,
    },

    /// Resume a persisted workflow and show where it stands
    Resume {
        /// Workflow id (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,
    },

    /// Attempt a stage transition
    Transition {
        /// Target stage, e.g. PLAN or REVIEW_POST
        target: String,

        /// Workflow id (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,
    },

    /// Append a todo record to the current stage
    Todo {
        /// Task description
        content: String,

        /// Priority: low, medium, high
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Objective (defaults to the content)
        #[arg(long)]
        objective: Option<String>,

        /// Success criteria
        #[arg(long)]
        success_criteria: Option<String>,

        /// Failure criteria
        #[arg(long)]
        fail_criteria: Option<String>,

        /// Time budget, e.g. "≤60m"
        #[arg(long)]
        time_budget: Option<String>,

        /// Workflow id (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,
    },

    /// Record an evidence artifact
    Evidence {
        /// What the evidence demonstrates
        claim: String,

        /// Stage the evidence belongs to (defaults to the current one)
        #[arg(short, long)]
        stage: Option<String>,

        /// File backing the claim
        #[arg(short, long)]
        location: Option<String>,

        /// Workflow id (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,
    },

    /// Submit a raw JSON record as a stage output
    Submit {
        /// The record; read from stdin when omitted
        record: Option<String>,

        /// Stage to attach the record to (defaults to the current one)
        #[arg(short, long)]
        stage: Option<String>,

        /// Workflow id (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,
    },

    /// Show workflow status and stage pipeline
    Status {
        /// Workflow id (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,
    },

    /// List the record schemas and per-stage gate requirements
    Schemas,

    /// Run the reprompt scheduler in the foreground until Ctrl-C
    Watch {
        /// Workflow id (defaults to the most recent)
        #[arg(long)]
        id: Option<String>,

        /// Override the check interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
}
