// Bctl
// Copyright (C) Riff Labs Limited <team@riff.cc>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

use bctl::commands;
use bctl::connection::LocalRunner;
use bctl::util::io::quit;
use bctl::{BctlConfig, Result, RunContext};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bctl", version, about = "Provision, upgrade and reset Kubernetes clusters from a blueprint")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct BlueprintArgs {
    /// Path to the blueprint file
    #[arg(short = 'f', long = "config", default_value = bctl::config::DEFAULT_BLUEPRINT)]
    config: PathBuf,

    /// Path to the kubeconfig file, defaults to the first $KUBECONFIG entry or ~/.kube/config
    #[arg(long)]
    kubeconfig: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Create or converge the cluster and install the blueprint's add-ons
    Apply(BlueprintArgs),
    /// Re-apply the blueprint's add-ons to a running cluster
    Update(BlueprintArgs),
    /// Upgrade the blueprint operator
    Upgrade {
        #[command(flatten)]
        blueprint: BlueprintArgs,
        /// Operator version (`latest`, `1.2.3`) or manifest URI
        #[arg(long, default_value = bctl::config::DEFAULT_OPERATOR_VERSION)]
        operator_uri: String,
    },
    /// Remove the add-ons and tear down the cluster
    Reset {
        #[command(flatten)]
        blueprint: BlueprintArgs,
        /// Operator version or URI, used when removing it from an existing cluster
        #[arg(long, default_value = bctl::config::DEFAULT_OPERATOR_VERSION)]
        operator_uri: String,
    },
    /// Write the cluster's credentials into the kubeconfig
    Kubeconfig(BlueprintArgs),
    /// Print a starter blueprint
    Init {
        /// Generate a blueprint for a kind cluster
        #[arg(long)]
        kind: bool,
    },
    /// Check a blueprint without touching any cluster
    Validate(BlueprintArgs),
    /// Show the operator and add-on status
    Status {
        #[command(flatten)]
        blueprint: BlueprintArgs,
        /// Show a single add-on
        addon: Option<String>,
    },
}

fn main() {
    if let Err(e) = liftoff() {
        quit(&e.to_string());
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run_context(args: &BlueprintArgs, debug: bool) -> RunContext {
    let mut config = BctlConfig::new().blueprint(args.config.clone()).debug(debug);
    if let Some(kubeconfig) = &args.kubeconfig {
        config = config.kubeconfig(kubeconfig);
    }
    RunContext::new(config)
}

fn liftoff() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Command::Init { kind } => {
            let blueprint = commands::init(&LocalRunner::new(), kind)?;
            print!("{}", blueprint.to_yaml()?);
            Ok(())
        }
        Command::Validate(args) => {
            commands::validate(&run_context(&args, cli.debug))?;
            Ok(())
        }
        Command::Apply(args) => {
            let ctx = run_context(&args, cli.debug);
            let blueprint = commands::load_and_validate(&ctx.config.blueprint_path)?;
            commands::apply(&ctx, &blueprint)
        }
        Command::Update(args) => {
            let ctx = run_context(&args, cli.debug);
            let blueprint = commands::load_and_validate(&ctx.config.blueprint_path)?;
            commands::update(&ctx, &blueprint)
        }
        Command::Upgrade { blueprint: args, operator_uri } => {
            let mut ctx = run_context(&args, cli.debug);
            ctx.config.operator_uri = operator_uri;
            let blueprint = commands::load_and_validate(&ctx.config.blueprint_path)?;
            commands::upgrade(&ctx, &blueprint)
        }
        Command::Reset { blueprint: args, operator_uri } => {
            let mut ctx = run_context(&args, cli.debug);
            ctx.config.operator_uri = operator_uri;
            let blueprint = commands::load_and_validate(&ctx.config.blueprint_path)?;
            commands::reset(&ctx, &blueprint)
        }
        Command::Kubeconfig(args) => {
            let ctx = run_context(&args, cli.debug);
            let blueprint = commands::load_and_validate(&ctx.config.blueprint_path)?;
            commands::kubeconfig(&ctx, &blueprint)
        }
        Command::Status { blueprint: args, addon } => {
            let ctx = run_context(&args, cli.debug);
            let blueprint = commands::load_and_validate(&ctx.config.blueprint_path)?;
            commands::status(&ctx, &blueprint, addon.as_deref())
        }
    }
}
