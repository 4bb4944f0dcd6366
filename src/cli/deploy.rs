use clap::Parser;
use std::path::PathBuf;

/// Arguments for the deploy command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Deploy using ./autodeploy.yaml:\n    autodeploy deploy\n\n\
                  Deploy the archives of another directory:\n    autodeploy deploy --deploy-dir /opt/units\n\n\
                  Print what the pass did as JSON:\n    autodeploy deploy --json")]
pub struct DeployArgs {
    /// Deploy directory, overriding auto.deploy.dir
    #[arg(long, value_name = "DIR")]
    pub deploy_dir: Option<PathBuf>,

    /// Proxy credential (user:password) for web locations
    #[arg(long, env = "AUTODEPLOY_PROXY_AUTH", hide_env_values = true)]
    pub proxy_auth: Option<String>,

    /// Print the deployment report as JSON
    #[arg(long)]
    pub json: bool,
}
