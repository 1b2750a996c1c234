//! Shell completion generation

use clap::CommandFactory;
use clap_complete::Shell;

/// Print completions for the given shell to stdout.
pub fn completions(shell: Shell) {
    let mut cmd = crate::Cli::command();
    clap_complete::generate(shell, &mut cmd, "quarry", &mut std::io::stdout());
}
