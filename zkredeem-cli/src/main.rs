//! zkredeem command line.
//!
//! The terminal rendition of the verification form: two editable
//! identifiers, one submission. Prints the attestation and the unlocked
//! secret on success, the error banner text on failure.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ethers::signers::LocalWallet;
use tracing_subscriber::EnvFilter;

use zkredeem_core::{VerifyIdentifiers, DEFAULT_APP_ID, DEFAULT_SCHEMA_ID};
use zkredeem_flow::evm::{EvmSecretContract, LocalWalletProvider};
use zkredeem_flow::transgate::{TransgateBridge, DEFAULT_BRIDGE_URL};
use zkredeem_flow::{ChainConfig, Collaborators, FlowController, Session};

#[derive(Debug, Parser)]
#[command(name = "zkredeem", about = "Redeem a Transgate attestation for the on-chain secret")]
struct Args {
    /// Verifier application id
    #[arg(long, default_value = DEFAULT_APP_ID)]
    app_id: String,

    /// Attestation schema id
    #[arg(long, default_value = DEFAULT_SCHEMA_ID)]
    schema_id: String,

    /// Chain RPC endpoint
    #[arg(long, env = "ZKREDEEM_RPC_URL")]
    rpc_url: Option<String>,

    /// Secret contract address
    #[arg(long, env = "ZKREDEEM_CONTRACT")]
    contract: Option<String>,

    /// Chain id
    #[arg(long, env = "ZKREDEEM_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Transgate bridge endpoint
    #[arg(long, env = "ZKREDEEM_BRIDGE_URL", default_value = DEFAULT_BRIDGE_URL)]
    bridge_url: String,

    /// Hex private key of the submitting account
    #[arg(long, env = "ZKREDEEM_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let defaults = ChainConfig::sepolia();
    let config = ChainConfig {
        chain_id: args.chain_id.unwrap_or(defaults.chain_id),
        rpc_url: args.rpc_url.unwrap_or(defaults.rpc_url),
        contract: args.contract.unwrap_or(defaults.contract),
    };
    config.validate().context("invalid chain configuration")?;

    let wallet: LocalWallet = args
        .private_key
        .parse()
        .context("invalid private key")?;

    let session = Session::initialize(config.clone());
    let contract = EvmSecretContract::connect(&config, wallet.clone())
        .map_err(|e| anyhow!("contract client setup failed: {e}"))?;

    let controller = FlowController::new(
        session,
        Collaborators {
            connector: Arc::new(TransgateBridge::new(args.bridge_url, args.app_id.clone())),
            wallet: Arc::new(LocalWalletProvider::new(wallet)),
            contract: Arc::new(contract),
        },
    );

    let ids = VerifyIdentifiers::new(args.app_id, args.schema_id);
    if !ids.is_complete() {
        return Err(anyhow!("app id and schema id must both be set"));
    }

    match controller.submit(&ids).await {
        Ok(success) => {
            println!("Result: {}", serde_json::to_string_pretty(&success.result)?);
            match success.secret {
                Some(secret) => println!("Secret: {secret}"),
                None => println!("Secret: No secret available"),
            }
            Ok(())
        }
        Err(err) => Err(anyhow!(err.message())),
    }
}
