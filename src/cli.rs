use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cleankiro")]
#[command(about = "Inspect and clean the Kiro IDE's local storage", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Args, Clone, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
    #[arg(short, long, help = "Write the report to a file instead of stdout")]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Classify everything under the storage roots")]
    Scan {
        #[command(flatten)]
        output: OutputArgs,
    },
    #[command(about = "Plan and delete cleanable files")]
    Clean {
        #[arg(long, help = "Show the plan without deleting anything")]
        dry_run: bool,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
        #[arg(long)]
        keep_logs: bool,
        #[arg(long)]
        keep_cache: bool,
        #[arg(long)]
        keep_chats: bool,
        #[arg(long)]
        keep_index: bool,
        #[arg(long, value_name = "DAYS", help = "Keep files modified within DAYS days")]
        keep_recent: Option<u32>,
        #[command(flatten)]
        output: OutputArgs,
    },
    #[command(about = "Conversation statistics and cleanable transcripts")]
    Chats {
        #[arg(long, help = "List transcripts that are old or large")]
        cleanable: bool,
        #[arg(long, value_name = "DAYS", help = "Age threshold; 0 selects every transcript")]
        age_days: Option<u32>,
        #[arg(long, value_name = "BYTES", help = "Size threshold; 0 disables it")]
        size_bytes: Option<u64>,
        #[command(flatten)]
        output: OutputArgs,
    },
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
    #[command(about = "View deletion history")]
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum ConfigActions {
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Set a configuration value")]
    Set {
        #[arg(short, long)]
        key: String,
        #[arg(long)]
        value: String,
    },
    #[command(about = "Add an excluded path or glob pattern")]
    AddExclude {
        #[arg(short, long)]
        path: String,
    },
    #[command(about = "Print the configuration file location")]
    Path,
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}
