use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for slotgrid
#[derive(Parser)]
#[command(
    name = "slotgrid",
    version = env!("CARGO_PKG_VERSION"),
    about = "Find the weekly hours when everyone in a group is free",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or a shared team file)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view, check or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Specify the editor to use")]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "limit", help = "Only show the newest N rows")]
        limit: Option<usize>,
    },

    /// Sign in as a user (stored locally, no password)
    Login {
        /// Stable user id
        user_id: String,

        #[arg(long = "name", help = "Display name (defaults to the user id)")]
        name: Option<String>,

        #[arg(long = "email", default_value = "")]
        email: String,

        #[arg(long = "avatar", default_value = "")]
        avatar: String,
    },

    /// Forget the signed-in user
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Create, list, rename or delete groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Join a group (no-op when already a member)
    Join {
        /// Group id
        group: String,
    },

    /// Leave a group
    Leave {
        group: String,

        #[arg(long = "yes", short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// List the members of a group
    Members {
        group: String,

        #[arg(long = "member", help = "Mark this selection (member id, 'me' or 'all')")]
        member: Option<String>,
    },

    /// Print the week grid of a group
    Show {
        group: String,

        #[arg(
            long = "member",
            help = "Whose schedule to show: member id, 'me' or 'all' (default)"
        )]
        member: Option<String>,
    },

    /// Toggle your own slots without an interactive session
    Toggle {
        group: String,

        /// Cells to toggle, as row,col (row 0-23, col 1-7 with 1 = Sunday)
        slots: Vec<String>,

        #[arg(
            long = "row",
            help = "Toggle a whole hour row: cleared when full, filled otherwise (repeatable)"
        )]
        rows: Vec<u8>,

        #[arg(
            long = "col",
            help = "Toggle a whole weekday column: cleared when full, filled otherwise (repeatable)"
        )]
        cols: Vec<u8>,
    },

    /// Interactive editing session reading commands from stdin
    Edit { group: String },

    /// Re-render the grid whenever someone changes it
    Watch {
        group: String,

        #[arg(long = "member", help = "Member id, 'me' or 'all' (default)")]
        member: Option<String>,

        #[arg(long = "ticks", help = "Stop after N polls (runs until Ctrl+C otherwise)")]
        ticks: Option<u64>,
    },

    /// Export the current view of a group
    Export {
        group: String,

        #[arg(long, value_enum, default_value = "csv", help = "Export format")]
        format: ExportFormat,

        #[arg(long, help = "Absolute output file path")]
        file: String,

        #[arg(long = "member", help = "Member id, 'me' or 'all' (default)")]
        member: Option<String>,

        #[arg(long = "force", help = "Overwrite an existing file without asking")]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum GroupAction {
    /// Groups the signed-in user belongs to
    List,

    /// Create a group and join it
    Create { name: String },

    /// Rename a group
    Rename { group: String, name: String },

    /// Delete a group and every membership
    Delete {
        group: String,

        #[arg(long = "yes", short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },
}
