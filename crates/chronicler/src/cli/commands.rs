//! CLI command definitions.

use chronicler::TwistKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chronicler - automatic chapter generation for serialized fiction
#[derive(Parser, Debug)]
#[command(name = "chronicler")]
#[command(about = "Automatic chapter generation for serialized fiction", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding project data
    #[arg(long, global = true, env = "CHRONICLER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file layered over the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project
    Init {
        /// Project id (letters, digits, '-' and '_')
        id: String,

        /// Working title
        #[arg(long)]
        title: String,

        /// Protagonist name
        #[arg(long)]
        protagonist: String,

        /// Premise, voice and world rules
        #[arg(long, default_value = "")]
        essence: String,

        /// Planned length in chapters
        #[arg(long, default_value = "300")]
        chapters: u32,

        /// Genre tag (general, fantasy, cultivation, romance, ...)
        #[arg(long)]
        genre: Option<String>,

        /// Target words per chapter
        #[arg(long)]
        words: Option<u32>,

        /// Model override for this project
        #[arg(long)]
        model: Option<String>,
    },

    /// Produce the next chapter(s)
    Next {
        /// Project id
        project: String,

        /// Number of chapters to produce
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// Show run status for one project, or list every project
    Status {
        /// Project id
        project: Option<String>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Print a committed chapter
    Show {
        /// Project id
        project: String,

        /// Chapter number
        chapter: u32,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Open a plot thread by hand
    Thread {
        /// Project id
        project: String,

        /// What is unresolved
        description: String,

        /// Importance, 1-10
        #[arg(long, default_value = "5")]
        priority: u8,
    },

    /// Schedule a twist for a future chapter
    Twist {
        /// Project id
        project: String,

        /// What is revealed
        description: String,

        /// Chapter that reveals it
        #[arg(long)]
        chapter: u32,

        /// Kind of twist (betrayal, identity, revelation, reversal, death, power_shift, other)
        #[arg(long, default_value = "revelation")]
        kind: TwistKind,

        /// Chapters that foreshadow it, comma separated
        #[arg(long, value_delimiter = ',')]
        foreshadow: Vec<u32>,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
