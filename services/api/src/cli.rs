use crate::demo::{run_accounting_report, run_demo, AccountingReportArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rent_ops::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Rent Operations Service",
    about = "Aggregate rent payments and dispatch tenant reminders from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Summarize payments from a statement export
    Accounting {
        #[command(subcommand)]
        command: AccountingCommand,
    },
    /// Run an end-to-end CLI demo covering aggregation and reminder dispatch
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum AccountingCommand {
    /// Import a payment CSV and print the accounting summary
    Report(AccountingReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Start with a seeded demo ledger instead of an empty store
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Accounting {
            command: AccountingCommand::Report(args),
        } => run_accounting_report(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
