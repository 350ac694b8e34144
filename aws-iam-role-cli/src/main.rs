use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_iam_role_core::{
    merge_inputs, resolve, AwsIamClient, DesiredConfig, FileStateStore, RoleComponent, RoleInputs,
};
use clap::{Args, Parser, Subcommand};
use log::debug;
use serde_json::Value;

const DEFAULT_STATE_FILE: &str = ".aws-iam-role/state.json";

#[derive(Parser, Debug)]
#[command(
    name = "aws-iam-role",
    version,
    about = "Deploy and remove a single AWS IAM role declaratively"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// File holding the component state between runs
    #[arg(
        long,
        env = "AWS_IAM_ROLE_STATE_FILE",
        default_value = DEFAULT_STATE_FILE,
        global = true
    )]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or update the role so it matches the inputs
    Deploy(InputArgs),
    /// Delete the role and clear the component state
    Remove(InputArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// JSON file with component inputs; flags override its fields
    #[arg(long, value_name = "FILE")]
    inputs: Option<PathBuf>,

    /// Role name
    #[arg(long, env = "AWS_IAM_ROLE_NAME")]
    name: Option<String>,

    /// Service principal allowed to assume the role
    #[arg(long, env = "AWS_IAM_ROLE_SERVICE")]
    service: Option<String>,

    /// ARN of the managed policy to attach
    #[arg(long, env = "AWS_IAM_ROLE_POLICY_ARN")]
    policy_arn: Option<String>,

    /// AWS region for the IAM client
    #[arg(long, env = "AWS_IAM_ROLE_REGION")]
    region: Option<String>,

    /// Seconds to wait for IAM propagation after creating or attaching (0 disables)
    #[arg(long, env = "AWS_IAM_ROLE_PROPAGATION_DELAY", default_value_t = 15)]
    propagation_delay_secs: u64,
}

impl InputArgs {
    /// Inputs file (if any) with command line flags merged over it.
    async fn to_inputs(&self) -> Result<RoleInputs> {
        let mut flags = RoleInputs {
            name: self.name.clone(),
            service: self.service.clone(),
            policy: None,
            region: self.region.clone(),
        };
        if let Some(arn) = &self.policy_arn {
            flags = flags.with_policy_arn(arn.clone());
        }

        match &self.inputs {
            None => Ok(flags),
            Some(path) => {
                let file_inputs = read_inputs_file(path).await?;
                Ok(merge_inputs(&file_inputs, &flags)?)
            }
        }
    }

    async fn component(
        &self,
        inputs: &RoleInputs,
        state_file: &Path,
    ) -> Result<RoleComponent<AwsIamClient, FileStateStore>> {
        let region = resolve(&DesiredConfig::default(), inputs)?.region;
        debug!("Using region {region}, state file {}", state_file.display());

        let provider = AwsIamClient::for_region(&region)
            .await
            .with_propagation_delay(Duration::from_secs(self.propagation_delay_secs));
        Ok(RoleComponent::new(provider, FileStateStore::new(state_file)))
    }
}

async fn read_inputs_file(path: &Path) -> Result<RoleInputs> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read inputs file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse inputs file {}", path.display()))
}

fn print_outputs(outputs: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(outputs).context("Failed to render outputs")?;
    println!("{rendered}");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Deploy(args) => {
            let inputs = args.to_inputs().await?;
            let component = args.component(&inputs, &cli.state_file).await?;
            let outputs = component.deploy(&inputs).await.context("Deploy failed")?;
            print_outputs(&serde_json::to_value(&outputs)?)
        }
        Command::Remove(args) => {
            let inputs = args.to_inputs().await?;
            let component = args.component(&inputs, &cli.state_file).await?;
            let outputs = component.remove(&inputs).await.context("Remove failed")?;
            print_outputs(&serde_json::to_value(&outputs)?)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_target(false)
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
