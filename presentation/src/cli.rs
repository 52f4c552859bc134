//! CLI command definitions

use beacon_domain::StartOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for research-beacon
#[derive(Parser, Debug)]
#[command(name = "research-beacon")]
#[command(version, about = "Track multi-agent research sessions from the terminal")]
#[command(long_about = r#"
research-beacon starts, resumes, and observes research sessions running on a
research backend. Progress arrives over a push socket with status polling as
a backstop, so a flaky connection degrades smoothly instead of failing.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./beacon.toml       Project-level config
3. ~/.config/research-beacon/config.toml   Global config

Example:
  research-beacon run "How do solar storms affect GPS accuracy?"
  research-beacon run --max-sources 50 --citation-style MLA "History of RISC-V"
  research-beacon resume 7d3f2a91
  research-beacon history --page 2
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress bars; print results only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a research session and track it to completion
    Run {
        /// The research question
        query: String,

        /// Focus area to emphasize (can be specified multiple times)
        #[arg(long = "focus", value_name = "AREA")]
        focus_areas: Vec<String>,

        /// Preferred source type (can be specified multiple times)
        #[arg(long = "source", value_name = "TYPE")]
        source_preferences: Vec<String>,

        /// Maximum number of sources to consult
        #[arg(long, value_name = "N")]
        max_sources: Option<u32>,

        /// Report format (e.g. markdown)
        #[arg(long, value_name = "FORMAT")]
        report_format: Option<String>,

        /// Citation style (e.g. APA, MLA)
        #[arg(long, value_name = "STYLE")]
        citation_style: Option<String>,

        /// Research mode hint for the backend
        #[arg(long, value_name = "MODE")]
        research_mode: Option<String>,
    },

    /// Re-attach to an existing session by id
    Resume {
        /// The session identifier to re-attach to
        session_id: String,
    },

    /// List past research sessions
    History {
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Sessions per page (defaults to the configured page size)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Cancel a session without attaching to it
    Cancel {
        /// The session identifier to cancel
        session_id: String,
    },
}

impl Command {
    /// Build start options from the `run` arguments
    pub fn start_options(&self) -> StartOptions {
        let Command::Run {
            focus_areas,
            source_preferences,
            max_sources,
            report_format,
            citation_style,
            research_mode,
            ..
        } = self
        else {
            return StartOptions::default();
        };

        let mut options = StartOptions::new()
            .with_focus_areas(focus_areas.clone())
            .with_source_preferences(source_preferences.clone());
        if let Some(max) = max_sources {
            options = options.with_max_sources(*max);
        }
        if let Some(format) = report_format {
            options = options.with_report_format(format);
        }
        if let Some(style) = citation_style {
            options = options.with_citation_style(style);
        }
        if let Some(mode) = research_mode {
            options = options.with_research_mode(mode);
        }
        options
    }
}
