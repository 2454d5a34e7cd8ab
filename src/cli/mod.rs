pub mod args;
pub mod pending;

pub use args::{Cli, CliCommand, PendingCliArgs, PendingCommand};
pub use pending::handle_pending_command;
