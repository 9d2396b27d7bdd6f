//! Shell completion generation

use clap::CommandFactory;
use clap_complete::Shell as ClapShell;

use crate::cli::args::{Cli, CompletionsArgs, Shell};

impl From<Shell> for ClapShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => Self::Bash,
            Shell::Zsh => Self::Zsh,
            Shell::Fish => Self::Fish,
            Shell::PowerShell => Self::PowerShell,
            Shell::Elvish => Self::Elvish,
        }
    }
}

/// Generate and print a shell completion script to stdout.
pub fn run(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    clap_complete::generate(
        ClapShell::from(args.shell),
        &mut cmd,
        "configmgr",
        &mut std::io::stdout(),
    );
}
