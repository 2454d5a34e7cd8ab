use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "notula")]
#[command(about = "Live meeting transcription agent", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Inspect or retry transcript uploads the backend rejected
    Pending(PendingCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct PendingCliArgs {
    #[command(subcommand)]
    pub command: PendingCommand,
}

#[derive(Subcommand, Debug)]
pub enum PendingCommand {
    /// List parked finish payloads
    List {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Retry uploading parked payloads, deleting them on success
    Flush,
}
