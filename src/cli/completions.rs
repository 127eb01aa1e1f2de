use crate::cli::args::{Cli, CompletionCommands};
use crate::utils::errors::Result;
use clap::CommandFactory;
use clap_complete::generate;
use std::io;

const APP_NAME: &str = "zia-locations";

pub fn handle_completion_command(command: &CompletionCommands) -> Result<()> {
    write_completion(command, &mut io::stdout());
    Ok(())
}

pub fn write_completion(command: &CompletionCommands, out: &mut dyn io::Write) {
    let mut cmd = Cli::command();
    generate(command.shell(), &mut cmd, APP_NAME, out);
}
