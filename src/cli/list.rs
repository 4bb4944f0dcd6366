use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List installed units:\n    autodeploy list\n\n\
                  List units of another store:\n    autodeploy list --store /var/lib/autodeploy\n\n\
                  Print units as JSON:\n    autodeploy list --json")]
pub struct ListArgs {
    /// Print units as JSON
    #[arg(long)]
    pub json: bool,
}
