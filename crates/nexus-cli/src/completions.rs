use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::Cli;

pub fn generate_completions(shell: Shell) {
    write_completions(shell, &mut io::stdout());
}

/// Completion script for `shell`, covering every subcommand and global flag.
fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, out);
}
