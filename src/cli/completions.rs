use clap::Parser;
use clap_complete::Shell;

/// Arguments for the completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Bash:\n    autodeploy completions bash > ~/.bash_completion.d/autodeploy\n\n\
                  Zsh:\n    autodeploy completions zsh > ~/.zfunc/_autodeploy\n\n\
                  Fish:\n    autodeploy completions fish > ~/.config/fish/completions/autodeploy.fish")]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum, ignore_case = true)]
    pub shell: Shell,
}
