//! Miscellaneous commands: completions

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

use fitcheck::cli::{Cli, CompletionShell};
use fitcheck::error::Result;

/// Generate shell completions
pub fn cmd_completions(shell: CompletionShell) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => Shell::Bash,
        CompletionShell::Zsh => Shell::Zsh,
        CompletionShell::Fish => Shell::Fish,
        CompletionShell::Powershell => Shell::PowerShell,
    };
    generate(shell, &mut cmd, "fitcheck", &mut io::stdout());
    Ok(())
}
