//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::{net::IpAddr, path::PathBuf};

/// Tokenmeta metadata service CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: tokenmeta.toml, searched upward from cwd)
    #[arg(short = 'C', long, default_value = "tokenmeta.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the metadata HTTP server
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Assign new equipment tokens into a base-tier collection file
    #[command(visible_alias = "g")]
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
    },

    /// Copy an ERC-721 collection's metadata into a base-tier file
    #[command(visible_alias = "f")]
    Fetch {
        #[command(flatten)]
        args: FetchArgs,
    },
}

/// Generate command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of new tokens to assign
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    /// Project directory under the metadata base dir
    #[arg(short, long, default_value = "MegaYours")]
    pub project: String,

    /// Collection file name (without extension)
    #[arg(short = 'l', long, default_value = "Equipment")]
    pub collection: String,

    /// Equipment templates file (default: config/equipment-templates.json
    /// under the project root)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub templates: Option<PathBuf>,
}

/// Fetch command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct FetchArgs {
    /// Address of the ERC-721 Enumerable contract
    #[arg(short = 'c', long)]
    pub contract: String,

    /// Project directory under the metadata base dir
    #[arg(short, long)]
    pub project: String,

    /// Collection file name (without extension)
    #[arg(short = 'l', long)]
    pub collection: String,

    /// JSON-RPC endpoint (default: ETHEREUM_RPC_URL environment variable)
    #[arg(short, long, value_hint = clap::ValueHint::Url)]
    pub rpc_url: Option<String>,

    /// Gateway base URL used to rewrite ipfs:// metadata URIs
    #[arg(long, default_value = "https://ipfs.io/ipfs/", value_hint = clap::ValueHint::Url)]
    pub ipfs_gateway: String,
}

#[allow(unused)]
impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_generate(&self) -> bool {
        matches!(self.command, Commands::Generate { .. })
    }
    pub const fn is_fetch(&self) -> bool {
        matches!(self.command, Commands::Fetch { .. })
    }
}
