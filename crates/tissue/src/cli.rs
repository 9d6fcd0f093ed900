//! Clap CLI definitions for the `tissue` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// tissue -- git-native issue tracker.
///
/// Issues live in an append-only JSONL log next to your code, versioned by
/// git; a derived SQLite cache answers queries and full-text search.
#[derive(Parser, Debug)]
#[command(
    name = "tissue",
    about = "Git-native issue tracker",
    long_about = "A local issue tracker whose durable state is a single JSONL file, \
                  made for committing alongside the code it describes.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Store directory (default: walk up for .tissue, then $TISSUE_DIR).
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a tissue store.
    Init(InitArgs),

    /// Create a new issue.
    #[command(alias = "new")]
    Create(CreateArgs),

    /// Show issue details with comments and dependencies.
    #[command(alias = "view")]
    Show(ShowArgs),

    /// List issues.
    List(ListArgs),

    /// Show ready work (open, no transitive active blocker).
    Ready(ReadyArgs),

    /// Set an issue's status.
    #[command(name = "status")]
    StatusCmd(StatusCmdArgs),

    /// Update issue fields.
    Update(UpdateArgs),

    /// Add a comment to an issue.
    Comment(CommentArgs),

    /// List comments on an issue.
    Comments(CommentsArgs),

    /// Manage dependencies between issues.
    Dep(DepArgs),

    /// Full-text search across titles, bodies, and comments.
    Search(SearchArgs),

    /// Remove closed and duplicate issues from the log.
    Clean(CleanArgs),

    /// Merge another store's log into this one.
    Migrate(MigrateArgs),

    /// Rebuild the cache from the log.
    Reimport,

    /// Get or set store configuration.
    Config(ConfigArgs),

    /// Generate shell completions.
    Completion(CompletionArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize in (default: current directory).
    pub path: Option<PathBuf>,

    /// Issue id prefix (default: the directory's name).
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Issue title.
    pub title: String,

    /// Issue body.
    #[arg(short, long, default_value = "")]
    pub body: String,

    /// Priority 1-5 (1 highest).
    #[arg(short, long)]
    pub priority: Option<i64>,

    /// Tags (repeatable).
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue id, unique id prefix, or hash suffix.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status.
    #[arg(short, long)]
    pub status: Option<String>,

    /// Filter by exact tag.
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Full-text search query.
    #[arg(long)]
    pub search: Option<String>,

    /// Maximum number of rows.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ReadyArgs {
    /// Maximum number of rows.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StatusCmdArgs {
    /// Issue id, unique id prefix, or hash suffix.
    pub id: String,

    /// New status: open, in_progress, paused, duplicate, or closed.
    pub status: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue id, unique id prefix, or hash suffix.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New body.
    #[arg(short, long)]
    pub body: Option<String>,

    /// New status.
    #[arg(short, long)]
    pub status: Option<String>,

    /// New priority 1-5.
    #[arg(short, long)]
    pub priority: Option<i64>,

    /// Tags to add (repeatable).
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Tags to remove (repeatable). Removals apply after additions.
    #[arg(short = 'u', long = "untag")]
    pub untags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Issue id, unique id prefix, or hash suffix.
    pub id: String,

    /// Comment body.
    pub body: String,
}

#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// Issue id, unique id prefix, or hash suffix.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommands,
}

#[derive(Subcommand, Debug)]
pub enum DepCommands {
    /// Add a dependency: `tissue dep add <src> <kind> <dst>`.
    Add(DepEdgeArgs),

    /// Remove a dependency (writes a tombstone).
    #[command(alias = "remove")]
    Rm(DepEdgeArgs),

    /// List an issue's active dependencies.
    List(DepListArgs),
}

#[derive(Args, Debug)]
pub struct DepEdgeArgs {
    /// Source issue.
    pub src: String,

    /// Dependency kind: blocks, parent, or relates.
    pub kind: String,

    /// Destination issue.
    pub dst: String,
}

#[derive(Args, Debug)]
pub struct DepListArgs {
    /// Issue id, unique id prefix, or hash suffix.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Full-text query (FTS5 syntax).
    pub query: String,

    /// Maximum number of rows.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Only remove issues untouched for this many days.
    #[arg(long, value_name = "DAYS")]
    pub older_than: Option<i64>,

    /// Actually rewrite the log (default is a dry run).
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Source store directory (a `.tissue` directory or its parent).
    pub path: PathBuf,

    /// Actually append and reimport (default is a dry run).
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Get or set the issue id prefix.
    Prefix {
        /// New prefix; omit to print the current one.
        value: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct CompletionArgs {
    /// Target shell.
    pub shell: clap_complete::Shell,
}
