pub mod args;
pub mod commands;

pub use args::{
    ApprovePathArgs, ChangeStatusArgs, CreateArgs, DocumentArgs, ListArgs, PlanArgs,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
CONTRACT COMMANDS:\n{subcommands}\n";

#[derive(Parser, Debug)]
#[command(name = "contractflow")]
#[command(version = crate::VERSION)]
#[command(about = "Approval-gated contract lifecycle")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: create a contract, submit it, approve it; approved contracts are posted to the configured webhook."
)]
pub struct Args {
    /// Workspace holding contractflow.toml and .contractflow/ (default: current directory)
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub workspace: PathBuf,

    /// Document store file, JSON or YAML (default: {workspace}/contracts.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Principal the session runs as
    #[arg(long, global = true, value_name = "NAME", default_value = "cli")]
    pub user: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn store_path(&self) -> PathBuf {
        self.store
            .clone()
            .unwrap_or_else(|| self.workspace.join("contracts.json"))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        about = "Show the patch a transition would apply",
        long_about = "Plan runs the transition planner over a document view without touching the store.",
        after_help = "Example:\n    contractflow plan --type Contract --title \"Q1 Deal\" --has-status-field"
    )]
    Plan(PlanArgs),
    #[command(
        about = "List documents in the store",
        after_help = "Example:\n    contractflow list --path /contracts"
    )]
    List(ListArgs),
    #[command(
        about = "Create a document",
        long_about = "Create stores a new document; contracts are seeded with Draft status and the creation title prefix.",
        after_help = "Example:\n    contractflow create --path /contracts/q1 --title \"Q1 Deal\""
    )]
    Create(CreateArgs),
    #[command(
        about = "Submit a contract for approval",
        after_help = "Example:\n    contractflow submit 7f9c..."
    )]
    Submit(DocumentArgs),
    #[command(about = "Approve a contract that is in review")]
    Approve(DocumentArgs),
    #[command(about = "Reject a contract that is in review")]
    Reject(DocumentArgs),
    #[command(
        about = "Change the status of every matching document under a path",
        after_help = "Example:\n    contractflow change-status --path /contracts --target-status Approved --only-if-current-status \"In Review\""
    )]
    ChangeStatus(ChangeStatusArgs),
    #[command(about = "Approve every contract in review under a path")]
    ApprovePath(ApprovePathArgs),
}

pub async fn run(args: Args) -> crate::Result<()> {
    commands::execute(args).await
}
