use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "wsaudit")]
#[command(version)]
#[command(about = "Audit a Google Workspace tenant and export the results as CSV", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export per-user Gmail and Drive usage statistics
    Usage(UsageArgs),

    /// Export groups, memberships, buildings, rooms and equipment
    Directory(DirectoryArgs),

    /// Export shared drives, their permissions and their storage
    SharedDrives(SharedDrivesArgs),

    /// Export mailbox delegation, forwarding and IMAP/POP access
    Mailbox(MailboxArgs),

    /// Grant a principal a role on every shared drive
    Grant(GrantArgs),

    /// Discover shared drives through several search methods
    FindDrives(FindDrivesArgs),

    /// Show one shared drive by id
    DriveInfo(DriveInfoArgs),

    /// Test the service account against each API and scope
    Diagnose(DiagnoseArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared flags
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Service account JSON key file
    #[arg(long, env = "WSAUDIT_SERVICE_ACCOUNT")]
    pub service_account: Option<String>,

    /// Admin principal to impersonate
    #[arg(long, env = "WSAUDIT_ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Workspace domain (defaults to the admin email's domain)
    #[arg(long, env = "WSAUDIT_DOMAIN")]
    pub domain: Option<String>,

    /// Directory for exports
    #[arg(long)]
    pub output_dir: Option<String>,
}

// ============================================================================
// Subcommand arguments
// ============================================================================

#[derive(Args)]
pub struct UsageArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Maximum number of users to process (0 for all)
    #[arg(long, default_value_t = 10)]
    pub max_users: usize,
}

#[derive(Args)]
pub struct DirectoryArgs {
    #[command(flatten)]
    pub auth: AuthArgs,
}

#[derive(Args)]
pub struct SharedDrivesArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Only list drives the admin is a member of (no domain-admin access)
    #[arg(long)]
    pub list_my_drives_only: bool,
}

#[derive(Args)]
pub struct MailboxArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Maximum number of users to process (0 for all)
    #[arg(long, default_value_t = 10)]
    pub max_users: usize,
}

#[derive(Args)]
pub struct GrantArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Role to grant
    #[arg(long, value_enum, default_value_t = Role::Manager)]
    pub role: Role,

    /// Principal to grant the role to (defaults to the admin email)
    #[arg(long)]
    pub grantee: Option<String>,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct FindDrivesArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Also run the slower multi-strategy file search
    #[arg(long)]
    pub deep_search: bool,

    /// JSON file receiving the discovered drives
    #[arg(long, default_value = "found_shared_drives.json")]
    pub output_file: String,
}

#[derive(Args)]
pub struct DriveInfoArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Shared drive id
    #[arg(long)]
    pub drive_id: String,
}

#[derive(Args)]
pub struct DiagnoseArgs {
    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Shared drive roles accepted by `grant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Alias of organizer
    Manager,
    Organizer,
    #[value(name = "fileOrganizer")]
    FileOrganizer,
    Writer,
    Commenter,
    Reader,
}

impl Role {
    /// Role name as the Drive API spells it.
    pub fn api_name(self) -> &'static str {
        match self {
            Self::Manager | Self::Organizer => "organizer",
            Self::FileOrganizer => "fileOrganizer",
            Self::Writer => "writer",
            Self::Commenter => "commenter",
            Self::Reader => "reader",
        }
    }
}
