use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

pub mod config;
pub mod providers;
pub mod region;
pub mod stack;
pub mod terraform;
pub mod workflow;
pub mod writer;

/// Synthesize the Terraform configuration for CodeBuild-hosted GitHub
/// Actions runners.
///
/// Requires `GITHUB_TOKEN` and `GITHUB_OWNER` in the environment (a `.env`
/// file in the working directory is loaded first).
#[derive(Parser, Debug)]
#[command(name = "codebuild-runners", version)]
struct Cli {
    /// YAML file listing the stacks to synthesize
    #[arg(long, env = "CODEBUILD_RUNNERS_CONFIG")]
    config: Option<PathBuf>,

    /// Synth output directory
    #[arg(long, env = "CODEBUILD_RUNNERS_OUTDIR", default_value = "cdktf.out")]
    outdir: PathBuf,

    /// Stack name (only with a single stack)
    #[arg(long)]
    stack_name: Option<String>,

    /// AWS region pinned into the provider block
    #[arg(long)]
    region: Option<String>,

    /// Look the region up through the AWS default provider chain
    #[arg(long)]
    resolve_region: bool,

    /// Print the synthesized JSON instead of writing the output directory
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codebuild_runners=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let credentials = config::Credentials::from_env()?;

    let mut all_props: Vec<stack::StackProps> = match &cli.config {
        Some(config_path) => config::parse(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
            .iter()
            .map(config::ConfigEntry::props)
            .collect(),
        None => vec![stack::StackProps::default()],
    };

    if let Some(stack_name) = &cli.stack_name {
        config::override_stack_name(&mut all_props, stack_name).context("Invalid --stack-name")?;
    }

    let mut stacks = Vec::with_capacity(all_props.len());
    for mut props in all_props {
        props.region = region::resolve(cli.region.clone().or(props.region), cli.resolve_region).await;

        let stack = stack::build(&props, &credentials)
            .with_context(|| format!("Failed to build stack {}", props.stack_name))?;
        stacks.push(stack);
    }

    if cli.stdout {
        for stack in &stacks {
            println!("{}", stack.synth()?);
        }
        return Ok(());
    }

    let manifest_path = writer::write(&cli.outdir, &stacks)
        .with_context(|| format!("Failed to write {}", cli.outdir.display()))?;
    tracing::info!(
        manifest = %manifest_path.display(),
        stacks = stacks.len(),
        "Synthesized"
    );

    return Ok(());
}
