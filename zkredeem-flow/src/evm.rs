//! EVM collaborators: the secret contract client and a local-wallet
//! provider.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest};
use tracing::{debug, info};

use zkredeem_core::encoding::{self, chain_params_token};
use zkredeem_core::ChainParams;

use crate::connector::{ContractError, SecretContract, WalletError, WalletProvider, WalletSigner};
use crate::session::ChainConfig;

/// Client for the secret contract.
///
/// Calldata is built by hand from the function selector and the ABI-encoded
/// payload tuple; the write waits for the receipt and treats a zero status
/// as a revert.
pub struct EvmSecretContract {
    client: Arc<SignerMiddleware<Provider<Http>, LocalWallet>>,
    contract: Address,
}

const ASSIGN_SECRET_SIGNATURE: &str =
    "assignSecret((bytes,bytes,bytes32,address,bytes32,address,bytes,bytes))";
const GET_SECRET_SIGNATURE: &str = "getSecret()";

impl EvmSecretContract {
    pub fn connect(config: &ChainConfig, wallet: LocalWallet) -> Result<Self, ContractError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| ContractError::Rpc(format!("failed to create HTTP provider: {e}")))?;

        let wallet = wallet.with_chain_id(config.chain_id);
        let client = SignerMiddleware::new(provider, wallet);

        let contract = encoding::parse_address(&config.contract)
            .map(Address::from)
            .map_err(|e| ContractError::Rpc(format!("invalid contract address: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            contract,
        })
    }

    fn selector(signature: &str) -> [u8; 4] {
        let hash = ethers::utils::keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }
}

#[async_trait]
impl SecretContract for EvmSecretContract {
    async fn assign_secret(&self, params: &ChainParams) -> Result<String, ContractError> {
        let mut calldata = Self::selector(ASSIGN_SECRET_SIGNATURE).to_vec();
        calldata.extend_from_slice(&ethers::abi::encode(&[chain_params_token(params)]));

        let tx = TransactionRequest::new()
            .to(self.contract)
            .data(Bytes::from(calldata));

        debug!(contract = ?self.contract, "sending assignSecret transaction");

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| ContractError::Rejected(e.to_string()))?;
        let tx_hash = pending.tx_hash();

        let receipt = pending
            .await
            .map_err(|e| ContractError::Rpc(e.to_string()))?
            .ok_or_else(|| ContractError::Rpc("transaction dropped from the mempool".into()))?;

        if receipt.status == Some(0.into()) {
            return Err(ContractError::Reverted(format!("{:?}", tx_hash)));
        }

        info!(tx_hash = ?receipt.transaction_hash, "assignSecret mined");
        Ok(format!("{:?}", receipt.transaction_hash))
    }

    async fn get_secret(&self) -> Result<Option<String>, ContractError> {
        let calldata = Self::selector(GET_SECRET_SIGNATURE).to_vec();
        let tx: TypedTransaction = TransactionRequest::new()
            .to(self.contract)
            .data(Bytes::from(calldata))
            .into();

        let raw = self
            .client
            .call(&tx, None)
            .await
            .map_err(|e| ContractError::Rpc(e.to_string()))?;

        if raw.is_empty() {
            return Ok(None);
        }

        let decoded = ethers::abi::decode(&[ethers::abi::ParamType::String], &raw)
            .map_err(|e| ContractError::Rpc(format!("undecodable getSecret response: {e}")))?;
        match decoded.into_iter().next() {
            Some(ethers::abi::Token::String(s)) if !s.is_empty() => Ok(Some(s)),
            _ => Ok(None),
        }
    }
}

/// Local-wallet rendition of the injected browser provider: always
/// detected, never prompts, address known from the key.
pub struct LocalWalletProvider {
    wallet: LocalWallet,
}

impl LocalWalletProvider {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl WalletProvider for LocalWalletProvider {
    fn is_detected(&self) -> bool {
        true
    }

    async fn signer(&self) -> Result<Box<dyn WalletSigner>, WalletError> {
        Ok(Box::new(LocalWalletSigner {
            address: self.wallet.address(),
        }))
    }
}

struct LocalWalletSigner {
    address: Address,
}

#[async_trait]
impl WalletSigner for LocalWalletSigner {
    async fn address(&self) -> Result<String, WalletError> {
        Ok(format!("0x{}", hex::encode(self.address.as_bytes())))
    }
}
