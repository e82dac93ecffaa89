//! # Team Knowledge Base CLI (`tb`)
//!
//! The `tb` binary is the team's shared memory. It tracks bugs, changelog
//! entries, learnings, decisions, tasks, and a code documentation index in
//! one SQLite database, coordinates collaborators through an append-only
//! board, and enforces the bug-fix workflow through work sessions.
//!
//! ## Usage
//!
//! ```bash
//! tb --config ./config/teambase.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tb init` | Create the SQLite database and run schema migrations |
//! | `tb bugs ...` | File, query, update, and link bugs |
//! | `tb docs ...` | Query and maintain the code documentation index |
//! | `tb history ...` | Query and append the changelog |
//! | `tb learn ...` | Query and record learnings |
//! | `tb decisions ...` | Query and record decisions |
//! | `tb tasks ...` | Track TASK-N records |
//! | `tb board ...` | Post to and read the coordination board |
//! | `tb work ...` | Enforced work sessions for bug fixing |
//! | `tb calls ...` / `tb tree` | Function call graph over documented symbols |
//! | `tb index ...` | Documentation index over the docs directory |
//! | `tb curriculum ...` | Import and inspect the normalized curriculum tables |
//! | `tb stats` | Database overview |
//!
//! ## Examples
//!
//! ```bash
//! # File a bug and start working on it
//! tb bugs add --title "Toast never dismisses" --area ui --priority high
//! tb work start BUG-001 --as Fizz
//!
//! # Track the fix and complete with enforcement
//! tb work touch src/components/Toast.tsx
//! tb work complete BUG-001 --summary "Attached dismiss handler" \
//!     --root-cause "Handler never registered"
//! tb work learn BUG-001 --learning "Attach handlers inside effects"
//! tb work review BUG-001
//! ```

mod board;
mod bugs;
mod calls;
mod config;
mod curriculum;
mod db;
mod decisions;
mod docs;
mod docs_index;
mod history;
mod learn;
mod migrate;
mod models;
mod render;
mod session;
mod stats;
mod tasks;
mod vocab;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::vocab::{
    BugStatus, CallType, DocCategory, MessageType, Priority, Relationship, SymbolType, TaskStatus,
};

/// Team Knowledge Base — bugs, changelog, board, code docs, and enforced
/// work sessions over one SQLite database.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/teambase.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "tb",
    about = "Team Knowledge Base — bugs, changelog, board, and code docs over SQLite",
    version,
    long_about = "The team knowledge base keeps coordination state in one SQLite database: \
    a bug tracker, changelog, learnings, decisions, tasks, an append-only board with \
    auto-routing, a code documentation index with call graph, and enforced work sessions \
    that gate bug completion on root cause, summary, and changed files."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/teambase.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables. Idempotent
    /// and safe on a populated database — existing data is preserved.
    Init,

    /// Query or manage bugs.
    Bugs {
        #[command(subcommand)]
        action: BugsAction,
    },

    /// Query and maintain the code documentation index.
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Query or append to the changelog.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Query or record learnings.
    Learn {
        #[command(subcommand)]
        action: LearnAction,
    },

    /// Query or record decisions.
    Decisions {
        #[command(subcommand)]
        action: DecisionsAction,
    },

    /// Track tasks.
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },

    /// Post to or read the coordination board.
    ///
    /// The board is append-only. Posts of type `bug`, `learning`, and
    /// `decision` are auto-routed into the matching table.
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },

    /// Enforced work sessions for bug fixing.
    ///
    /// Starting a session claims the bug and surfaces related context.
    /// Completion is gated on a summary, a root cause, and a non-empty,
    /// non-test file list.
    Work {
        #[command(subcommand)]
        action: WorkAction,
    },

    /// Query function call relationships.
    Calls {
        #[command(subcommand)]
        action: CallsAction,
    },

    /// Show the call tree for a documented symbol.
    Tree {
        /// Symbol name to root the tree at.
        name: String,

        /// Maximum tree depth.
        #[arg(long, default_value_t = 3)]
        depth: usize,

        /// Show callers (up) instead of callees (down).
        #[arg(long)]
        callers: bool,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Documentation index over the docs directory.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Import and inspect the normalized curriculum tables.
    Curriculum {
        #[command(subcommand)]
        action: CurriculumAction,
    },

    /// Show knowledge base statistics.
    Stats {
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum BugsAction {
    /// List bugs, critical first.
    List {
        /// Filter by exact bug ID.
        #[arg(long)]
        id: Option<String>,
        /// Filter by status.
        #[arg(long)]
        status: Option<BugStatus>,
        /// Filter by priority.
        #[arg(long)]
        priority: Option<Priority>,
        /// Filter by area.
        #[arg(long)]
        area: Option<String>,
        /// Filter by owner.
        #[arg(long)]
        owner: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// File a new bug (allocates the next BUG-N).
    Add {
        /// Short bug title (at least 5 characters).
        #[arg(long)]
        title: String,
        /// Affected area (from [vocab].areas).
        #[arg(long)]
        area: String,
        /// Priority.
        #[arg(long, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Assign an owner immediately.
        #[arg(long)]
        owner: Option<String>,
        /// Full description.
        #[arg(long)]
        description: Option<String>,
        /// What should happen instead.
        #[arg(long)]
        expected: Option<String>,
        /// Who found the bug.
        #[arg(long = "as")]
        as_member: Option<String>,
    },
    /// Update fields on an existing bug.
    Update {
        /// Bug ID.
        #[arg(long)]
        id: String,
        #[arg(long)]
        status: Option<BugStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        root_cause: Option<String>,
        #[arg(long)]
        fix_applied: Option<String>,
        #[arg(long)]
        verified_by: Option<String>,
    },
    /// Link a bug to a code doc.
    Link {
        /// Bug ID.
        #[arg(long)]
        id: String,
        /// Code doc ID to link.
        #[arg(long)]
        code_doc: i64,
        /// Relationship of the code to the bug.
        #[arg(long, default_value_t = Relationship::Related)]
        relationship: Relationship,
        /// Notes on the link.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show code docs linked to a bug.
    Code {
        /// Bug ID.
        #[arg(long)]
        id: String,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Mark a bug done without a work session (escape hatch).
    Complete {
        /// Bug ID.
        bug_id: String,
        /// What was done to fix it.
        #[arg(long)]
        summary: String,
        /// What caused the bug.
        #[arg(long)]
        root_cause: String,
        /// Acting team member.
        #[arg(long = "as")]
        as_member: Option<String>,
    },
}

#[derive(Subcommand)]
enum DocsAction {
    /// List code docs.
    List {
        /// File path to search (partial match).
        file: Option<String>,
        /// Symbol name to search (partial match).
        #[arg(long)]
        symbol: Option<String>,
        /// Filter by symbol type.
        #[arg(long = "type")]
        symbol_type: Option<SymbolType>,
        /// Filter by area.
        #[arg(long)]
        area: Option<String>,
        /// Search in purpose and why.
        #[arg(long)]
        search: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Store (or refresh) a code doc entry.
    Add {
        /// Path to the source file.
        #[arg(long)]
        file: String,
        /// Symbol name; omit for file-level docs.
        #[arg(long)]
        symbol: Option<String>,
        /// Symbol type.
        #[arg(long = "type")]
        symbol_type: SymbolType,
        #[arg(long)]
        line_start: Option<i64>,
        #[arg(long)]
        line_end: Option<i64>,
        /// Function signature, if applicable.
        #[arg(long)]
        signature: Option<String>,
        /// What the code does (at least 10 characters).
        #[arg(long)]
        purpose: String,
        /// Design rationale.
        #[arg(long)]
        why: Option<String>,
        /// Comma-separated related code references.
        #[arg(long)]
        connections: Option<String>,
        /// Area that owns this code.
        #[arg(long)]
        area: String,
    },
    /// Show one symbol in full, with nested entries and linked bugs.
    Show {
        /// Symbol name.
        symbol: String,
        /// Narrow by file path (partial match).
        #[arg(long)]
        file: Option<String>,
    },
    /// Remove entries whose file no longer exists.
    Prune {
        /// Report without deleting.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List changelog entries, newest first.
    List {
        /// Only the last N days.
        #[arg(long)]
        days: Option<i64>,
        /// Filter by affected file (partial match).
        #[arg(long)]
        file: Option<String>,
        /// Filter by related bug ID.
        #[arg(long)]
        bug: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Append a changelog entry.
    Add {
        /// Short title (at least 5 characters).
        #[arg(long)]
        title: String,
        /// Description of the change (at least 10 characters).
        #[arg(long)]
        what_changed: String,
        /// Rationale (at least 10 characters).
        #[arg(long)]
        why: String,
        /// Previous behavior or value.
        #[arg(long)]
        what_it_was: Option<String>,
        /// Date (YYYY-MM-DD), defaults to today.
        #[arg(long)]
        date: Option<String>,
        /// Comma-separated affected files.
        #[arg(long)]
        files: Option<String>,
        /// Related bug ID.
        #[arg(long)]
        bug: Option<String>,
    },
}

#[derive(Subcommand)]
enum LearnAction {
    /// List learnings, newest first.
    List {
        /// Filter by category.
        #[arg(long)]
        category: Option<String>,
        /// Search in learning text.
        #[arg(long)]
        search: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Record a learning.
    Add {
        /// Category: 'general' or a configured area.
        #[arg(long)]
        category: String,
        /// The learning itself (at least 10 characters).
        #[arg(long)]
        learning: String,
        /// Where or when it was discovered.
        #[arg(long)]
        context: Option<String>,
        /// Related bug ID.
        #[arg(long)]
        bug: Option<String>,
    },
}

#[derive(Subcommand)]
enum DecisionsAction {
    /// List decisions, newest first.
    List {
        /// Filter by area (global decisions are always included).
        #[arg(long)]
        area: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Record a decision.
    Add {
        /// What was decided.
        #[arg(long)]
        decision: String,
        /// Why this was decided.
        #[arg(long)]
        rationale: String,
        /// Related area.
        #[arg(long)]
        area: Option<String>,
        /// An alternative that was considered (repeatable).
        #[arg(long = "alternative")]
        alternatives: Vec<String>,
    },
}

#[derive(Subcommand)]
enum TasksAction {
    /// List tasks, highest priority first.
    List {
        /// Filter by owner.
        #[arg(long)]
        owner: Option<String>,
        /// Filter by status.
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Filter by related bug ID.
        #[arg(long)]
        bug: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create a task (allocates the next TASK-N).
    Add {
        /// Task title (at least 5 characters).
        #[arg(long)]
        title: String,
        /// Assigned team member.
        #[arg(long)]
        owner: String,
        /// Related bug ID.
        #[arg(long)]
        bug: Option<String>,
        /// Priority: 1 (high), 2 (medium), 3 (low).
        #[arg(long, default_value_t = 2)]
        priority: i64,
        /// Additional notes.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Update a task.
    Update {
        /// Task ID.
        #[arg(long)]
        id: String,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        priority: Option<i64>,
    },
}

#[derive(Subcommand)]
enum BoardAction {
    /// List board messages, newest first.
    List {
        /// Filter by author.
        #[arg(long)]
        author: Option<String>,
        /// Filter by message type.
        #[arg(long = "type")]
        message_type: Option<MessageType>,
        /// Filter by resolved status.
        #[arg(long)]
        resolved: Option<bool>,
        /// Only messages on or after this date (YYYY-MM-DD).
        #[arg(long)]
        after: Option<String>,
        /// Only today's messages.
        #[arg(long)]
        today: bool,
        /// Filter by mentioned @name (partial match).
        #[arg(long)]
        mentions: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 50)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Post a message. Bug/learning/decision posts auto-route.
    Post {
        /// Acting team member.
        #[arg(long = "as")]
        as_member: Option<String>,
        /// Message type.
        #[arg(long = "type")]
        message_type: MessageType,
        /// Message content.
        #[arg(long)]
        content: String,
        /// Comma-separated @mentions (required for assignments).
        #[arg(long)]
        mentions: Option<String>,
        /// Related bug ID.
        #[arg(long)]
        bug: Option<String>,
        /// Related task ID.
        #[arg(long)]
        task: Option<String>,
        /// Message ID this replies to.
        #[arg(long)]
        reply_to: Option<i64>,
        /// Routing payload as JSON, e.g. '{"area": "ui", "priority": "high"}'.
        #[arg(long)]
        data: Option<String>,
    },
    /// Mark a message resolved.
    Resolve {
        /// Message ID.
        id: i64,
    },
    /// Delete one of your own messages (within 1 hour of posting).
    Delete {
        /// Message ID.
        id: i64,
        /// Acting team member.
        #[arg(long = "as")]
        as_member: Option<String>,
    },
    /// Render unresolved messages as markdown.
    Render,
}

#[derive(Subcommand)]
enum WorkAction {
    /// Start a work session: claim the bug and surface its context.
    Start {
        /// Bug ID to work on.
        bug_id: String,
        /// Acting team member.
        #[arg(long = "as")]
        as_member: Option<String>,
    },
    /// Record a file touched during the session.
    Touch {
        /// Path of the file being modified.
        file: String,
        /// Bug ID (optional when only one session is active).
        #[arg(long)]
        bug: Option<String>,
    },
    /// Add a free-form note to the session.
    Note {
        /// Note text.
        text: String,
        /// Bug ID (optional when only one session is active).
        #[arg(long)]
        bug: Option<String>,
    },
    /// Show session state.
    Status {
        /// Bug ID (optional when only one session is active).
        #[arg(long)]
        bug: Option<String>,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Complete the session. Moves the bug to review if all gates pass.
    Complete {
        /// Bug ID.
        bug_id: String,
        /// What was done to fix the bug.
        #[arg(long)]
        summary: String,
        /// What caused the bug.
        #[arg(long)]
        root_cause: String,
        /// Comma-separated changed files (defaults to touched files).
        #[arg(long)]
        files: Option<String>,
    },
    /// Record a learning from this session, linked to the bug.
    Learn {
        /// Bug ID.
        bug_id: String,
        /// What was learned (at least 10 characters).
        #[arg(long)]
        learning: String,
        /// Category (defaults to the bug's area).
        #[arg(long)]
        category: Option<String>,
        /// Additional context.
        #[arg(long)]
        context: Option<String>,
    },
    /// Request review from the configured reviewer.
    Review {
        /// Bug ID.
        bug_id: String,
        /// Notes for the reviewer.
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum CallsAction {
    /// Query call relationships.
    List {
        /// Show functions called BY this symbol.
        #[arg(long)]
        from: Option<String>,
        /// Show functions that CALL this symbol.
        #[arg(long)]
        to: Option<String>,
        /// Filter by callee name (partial match).
        #[arg(long)]
        name: Option<String>,
        /// Filter by call type.
        #[arg(long = "type")]
        call_type: Option<CallType>,
        /// Maximum results.
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Record a call edge between documented symbols.
    Add {
        /// Code doc ID of the calling function.
        #[arg(long)]
        caller: i64,
        /// Name of the called function.
        #[arg(long)]
        callee_name: String,
        /// Code doc ID of the called function (omit if external).
        #[arg(long)]
        callee: Option<i64>,
        /// Call type.
        #[arg(long = "type", default_value_t = CallType::Direct)]
        call_type: CallType,
        /// Line where the call occurs.
        #[arg(long)]
        line: Option<i64>,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Scan the docs root and register matching files.
    Sync {
        /// Category to record scanned files under.
        #[arg(long, default_value_t = DocCategory::Project)]
        category: DocCategory,
    },
    /// Register or enrich a single document.
    Add {
        /// Path of the document (relative to the docs root).
        #[arg(long)]
        path: String,
        /// Documentation category.
        #[arg(long, default_value_t = DocCategory::Project)]
        category: DocCategory,
        /// Document title (at least 3 characters).
        #[arg(long)]
        title: String,
        /// What the document covers.
        #[arg(long)]
        purpose: Option<String>,
        /// When to reference it.
        #[arg(long)]
        when_to_read: Option<String>,
        /// Comma-separated search keywords.
        #[arg(long)]
        keywords: Option<String>,
    },
    /// List indexed documents.
    List {
        /// Filter by category.
        #[arg(long)]
        category: Option<DocCategory>,
        /// Search in title, purpose, and keywords.
        #[arg(long)]
        search: Option<String>,
        /// Maximum results.
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CurriculumAction {
    /// Import a normalized curriculum export (JSON).
    Import {
        /// Path to the export file.
        file: PathBuf,
        /// Clear the curriculum tables first.
        #[arg(long)]
        replace: bool,
        /// Validate and report counts without writing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show stem rows in curriculum order.
    Show {
        /// Filter by part.
        #[arg(long)]
        part: Option<i64>,
        /// Filter by module.
        #[arg(long)]
        module: Option<i64>,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Completions don't need config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "tb", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Bugs { action } => match action {
            BugsAction::List {
                id,
                status,
                priority,
                area,
                owner,
                limit,
                json,
            } => {
                let filters = bugs::BugFilters {
                    id,
                    status,
                    priority,
                    area,
                    owner,
                };
                bugs::run_list(&cfg, &filters, limit, json).await?;
            }
            BugsAction::Add {
                title,
                area,
                priority,
                owner,
                description,
                expected,
                as_member,
            } => {
                bugs::run_add(
                    &cfg,
                    &title,
                    &area,
                    priority,
                    owner.as_deref(),
                    description.as_deref(),
                    expected.as_deref(),
                    as_member.as_deref(),
                )
                .await?;
            }
            BugsAction::Update {
                id,
                status,
                priority,
                owner,
                root_cause,
                fix_applied,
                verified_by,
            } => {
                let updates = bugs::BugUpdates {
                    status,
                    priority,
                    owner,
                    root_cause,
                    fix_applied,
                    verified_by,
                };
                bugs::run_update(&cfg, &id, &updates).await?;
            }
            BugsAction::Link {
                id,
                code_doc,
                relationship,
                notes,
            } => {
                bugs::run_link(&cfg, &id, code_doc, relationship, notes.as_deref()).await?;
            }
            BugsAction::Code { id, json } => {
                bugs::run_code(&cfg, &id, json).await?;
            }
            BugsAction::Complete {
                bug_id,
                summary,
                root_cause,
                as_member,
            } => {
                bugs::run_complete(&cfg, &bug_id, &summary, &root_cause, as_member.as_deref())
                    .await?;
            }
        },
        Commands::Docs { action } => match action {
            DocsAction::List {
                file,
                symbol,
                symbol_type,
                area,
                search,
                limit,
                json,
            } => {
                let filters = docs::DocFilters {
                    file_path: file,
                    symbol_name: symbol,
                    symbol_type,
                    area,
                    search,
                };
                docs::run_list(&cfg, &filters, limit, json).await?;
            }
            DocsAction::Add {
                file,
                symbol,
                symbol_type,
                line_start,
                line_end,
                signature,
                purpose,
                why,
                connections,
                area,
            } => {
                docs::run_add(
                    &cfg,
                    &file,
                    symbol.as_deref(),
                    symbol_type,
                    line_start,
                    line_end,
                    signature.as_deref(),
                    &purpose,
                    why.as_deref(),
                    connections.as_deref(),
                    &area,
                )
                .await?;
            }
            DocsAction::Show { symbol, file } => {
                docs::run_show(&cfg, &symbol, file.as_deref()).await?;
            }
            DocsAction::Prune { dry_run } => {
                docs::run_prune(&cfg, dry_run).await?;
            }
        },
        Commands::History { action } => match action {
            HistoryAction::List {
                days,
                file,
                bug,
                limit,
                json,
            } => {
                history::run_list(&cfg, days, file.as_deref(), bug.as_deref(), limit, json).await?;
            }
            HistoryAction::Add {
                title,
                what_changed,
                why,
                what_it_was,
                date,
                files,
                bug,
            } => {
                history::run_add(
                    &cfg,
                    &title,
                    &what_changed,
                    &why,
                    what_it_was.as_deref(),
                    date.as_deref(),
                    files.as_deref(),
                    bug.as_deref(),
                )
                .await?;
            }
        },
        Commands::Learn { action } => match action {
            LearnAction::List {
                category,
                search,
                limit,
                json,
            } => {
                learn::run_list(&cfg, category.as_deref(), search.as_deref(), limit, json).await?;
            }
            LearnAction::Add {
                category,
                learning,
                context,
                bug,
            } => {
                learn::run_add(&cfg, &category, &learning, context.as_deref(), bug.as_deref())
                    .await?;
            }
        },
        Commands::Decisions { action } => match action {
            DecisionsAction::List { area, limit, json } => {
                decisions::run_list(&cfg, area.as_deref(), limit, json).await?;
            }
            DecisionsAction::Add {
                decision,
                rationale,
                area,
                alternatives,
            } => {
                decisions::run_add(&cfg, &decision, &rationale, area.as_deref(), &alternatives)
                    .await?;
            }
        },
        Commands::Tasks { action } => match action {
            TasksAction::List {
                owner,
                status,
                bug,
                limit,
                json,
            } => {
                tasks::run_list(&cfg, owner.as_deref(), status, bug.as_deref(), limit, json)
                    .await?;
            }
            TasksAction::Add {
                title,
                owner,
                bug,
                priority,
                notes,
            } => {
                tasks::run_add(&cfg, &title, &owner, bug.as_deref(), priority, notes.as_deref())
                    .await?;
            }
            TasksAction::Update {
                id,
                status,
                owner,
                notes,
                priority,
            } => {
                tasks::run_update(&cfg, &id, status, owner.as_deref(), notes.as_deref(), priority)
                    .await?;
            }
        },
        Commands::Board { action } => match action {
            BoardAction::List {
                author,
                message_type,
                resolved,
                after,
                today,
                mentions,
                limit,
                json,
            } => {
                board::run_list(
                    &cfg,
                    author.as_deref(),
                    message_type,
                    resolved,
                    after.as_deref(),
                    today,
                    mentions.as_deref(),
                    limit,
                    json,
                )
                .await?;
            }
            BoardAction::Post {
                as_member,
                message_type,
                content,
                mentions,
                bug,
                task,
                reply_to,
                data,
            } => {
                board::run_post(
                    &cfg,
                    as_member.as_deref(),
                    message_type,
                    &content,
                    mentions.as_deref(),
                    bug.as_deref(),
                    task.as_deref(),
                    reply_to,
                    data.as_deref(),
                )
                .await?;
            }
            BoardAction::Resolve { id } => {
                board::run_resolve(&cfg, id).await?;
            }
            BoardAction::Delete { id, as_member } => {
                board::run_delete(&cfg, id, as_member.as_deref()).await?;
            }
            BoardAction::Render => {
                board::run_render(&cfg).await?;
            }
        },
        Commands::Work { action } => match action {
            WorkAction::Start { bug_id, as_member } => {
                session::run_start(&cfg, &bug_id, as_member.as_deref()).await?;
            }
            WorkAction::Touch { file, bug } => {
                session::run_touch(&cfg, &file, bug.as_deref()).await?;
            }
            WorkAction::Note { text, bug } => {
                session::run_note(&cfg, &text, bug.as_deref()).await?;
            }
            WorkAction::Status { bug, json } => {
                session::run_status(&cfg, bug.as_deref(), json).await?;
            }
            WorkAction::Complete {
                bug_id,
                summary,
                root_cause,
                files,
            } => {
                session::run_complete(&cfg, &bug_id, &summary, &root_cause, files.as_deref())
                    .await?;
            }
            WorkAction::Learn {
                bug_id,
                learning,
                category,
                context,
            } => {
                session::run_learn(
                    &cfg,
                    &bug_id,
                    &learning,
                    category.as_deref(),
                    context.as_deref(),
                )
                .await?;
            }
            WorkAction::Review { bug_id, notes } => {
                session::run_review(&cfg, &bug_id, notes.as_deref()).await?;
            }
        },
        Commands::Calls { action } => match action {
            CallsAction::List {
                from,
                to,
                name,
                call_type,
                limit,
                json,
            } => {
                calls::run_list(
                    &cfg,
                    from.as_deref(),
                    to.as_deref(),
                    name.as_deref(),
                    call_type,
                    limit,
                    json,
                )
                .await?;
            }
            CallsAction::Add {
                caller,
                callee_name,
                callee,
                call_type,
                line,
            } => {
                calls::run_add(&cfg, caller, &callee_name, call_type, callee, line).await?;
            }
        },
        Commands::Tree {
            name,
            depth,
            callers,
            json,
        } => {
            calls::run_tree(&cfg, &name, depth, callers, json).await?;
        }
        Commands::Index { action } => match action {
            IndexAction::Sync { category } => {
                docs_index::run_sync(&cfg, category).await?;
            }
            IndexAction::Add {
                path,
                category,
                title,
                purpose,
                when_to_read,
                keywords,
            } => {
                docs_index::run_add(
                    &cfg,
                    &path,
                    category,
                    &title,
                    purpose.as_deref(),
                    when_to_read.as_deref(),
                    keywords.as_deref(),
                )
                .await?;
            }
            IndexAction::List {
                category,
                search,
                limit,
                json,
            } => {
                docs_index::run_list(&cfg, category, search.as_deref(), limit, json).await?;
            }
        },
        Commands::Curriculum { action } => match action {
            CurriculumAction::Import {
                file,
                replace,
                dry_run,
            } => {
                curriculum::run_import(&cfg, &file, replace, dry_run).await?;
            }
            CurriculumAction::Show { part, module, json } => {
                curriculum::run_show(&cfg, part, module, json).await?;
            }
        },
        Commands::Stats { json } => {
            stats::run_stats(&cfg, json).await?;
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
