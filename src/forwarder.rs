use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::ChainClient;
use crate::config::{parse_address, AppConfig};
use crate::error::{ConfigError, Result};
use crate::logging::{LogContext, MetricsLogger};
use crate::network::NetworkProfile;
use crate::transfer::amount::to_base_units;
use crate::transfer::{
    build_native_transfer, build_token_transfer, AssetKind, DispatchResult, Dispatcher, TransferRequest,
    UnsignedTransaction, Wallet,
};

/// Forwarding parameters taken from configuration
#[derive(Debug, Clone)]
pub struct ForwardSettings {
    pub receiver: Address,
    pub asset: AssetKind,
    pub gas_limit: u64,
    pub token_gas_limit: u64,
    pub min_income: Decimal,
    pub confirmation_timeout: Duration,
}

impl ForwardSettings {
    pub fn from_config(config: &AppConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            receiver: parse_address("ADDRESS_RECEIVER", &config.wallet.receiver_address)?,
            asset: config.transfer.forward_asset,
            gas_limit: config.transfer.gas_limit,
            token_gas_limit: config.transfer.token_gas_limit,
            min_income: config.transfer.min_income,
            confirmation_timeout: Duration::from_secs(config.transfer.confirmation_timeout_seconds),
        })
    }
}

/// Turns an amount into a confirmed transfer to the receiver.
///
/// Shared by the watch loop and the one-shot `send` command.
pub struct Forwarder {
    client: Arc<dyn ChainClient>,
    dispatcher: Dispatcher,
    wallet: Wallet,
    profile: NetworkProfile,
    settings: ForwardSettings,
}

impl Forwarder {
    /// Fails when a token forward is configured but the network has no token contract
    pub fn new(
        client: Arc<dyn ChainClient>,
        wallet: Wallet,
        profile: NetworkProfile,
        settings: ForwardSettings,
    ) -> Result<Self> {
        if settings.asset == AssetKind::Token {
            profile.require_token()?;
        }

        LogContext::new("forwarder", "initialization")
            .with_address(&wallet.address())
            .with_network(profile.name.as_str())
            .with_metadata("receiver", serde_json::json!(settings.receiver.to_string()))
            .with_metadata("asset", serde_json::json!(settings.asset.to_string()))
            .info("Forwarder ready");

        Ok(Self {
            dispatcher: Dispatcher::new(Arc::clone(&client)),
            client,
            wallet,
            profile,
            settings,
        })
    }

    /// Build the wallet from the configured key and check it controls the configured sender
    pub fn from_config(client: Arc<dyn ChainClient>, profile: NetworkProfile, config: &AppConfig) -> Result<Self> {
        let wallet = Wallet::from_private_key(&config.wallet.private_key)?;
        let sender = parse_address("ADDRESS_SENDER", &config.wallet.sender_address)?;
        if wallet.address() != sender {
            return Err(ConfigError::InvalidValue {
                key: "ADDRESS_SENDER".to_string(),
                value: format!("{} (private key controls {})", sender, wallet.address()),
            }
            .into());
        }

        Self::new(client, wallet, profile, ForwardSettings::from_config(config)?)
    }

    /// Monitored account, the one that signs forwards
    pub fn sender(&self) -> Address {
        self.wallet.address()
    }

    pub fn receiver(&self) -> Address {
        self.settings.receiver
    }

    pub fn min_income(&self) -> Decimal {
        self.settings.min_income
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    /// Relay `amount` whole units in the configured asset. Amounts under the
    /// minimum income are rejected.
    pub async fn forward(&self, amount: Decimal) -> Result<DispatchResult> {
        self.transfer(amount, self.settings.asset, self.settings.min_income).await
    }

    /// Relay `amount` whole units of the network's token, whatever the
    /// configured asset. Used for token income seen in `Transfer` logs.
    pub async fn forward_token(&self, amount: Decimal) -> Result<DispatchResult> {
        self.profile.require_token()?;
        self.transfer(amount, AssetKind::Token, self.settings.min_income).await
    }

    /// One-shot transfer with no minimum beyond being positive
    pub async fn send(&self, amount: Decimal, asset: AssetKind) -> Result<DispatchResult> {
        if asset == AssetKind::Token {
            self.profile.require_token()?;
        }
        self.transfer(amount, asset, Decimal::ZERO).await
    }

    async fn transfer(&self, amount: Decimal, asset: AssetKind, minimum: Decimal) -> Result<DispatchResult> {
        let gas_limit = match asset {
            AssetKind::Native => self.settings.gas_limit,
            AssetKind::Token => self.settings.token_gas_limit,
        };
        let request = TransferRequest::new(
            self.sender(),
            self.settings.receiver,
            amount,
            asset,
            gas_limit,
            self.profile.chain_id,
            minimum,
        )?;

        let gas_price = self.client.get_gas_price().await?;
        let nonce = self.dispatcher.reserve_nonce(request.sender()).await?;

        let built = match request.asset() {
            AssetKind::Native => build_native_transfer(
                request.sender(),
                request.receiver(),
                request.amount(),
                nonce,
                gas_price,
                request.gas_limit(),
                request.chain_id(),
            )
            .map_err(Into::into),
            AssetKind::Token => {
                self.build_token(&request, nonce, gas_price)
            }
        };
        let tx = match built {
            Ok(tx) => tx,
            Err(e) => {
                // Nothing was signed with this nonce
                self.dispatcher.release_nonce(request.sender(), nonce);
                return Err(e);
            }
        };

        LogContext::new("forwarder", "transfer")
            .with_network(self.profile.name.as_str())
            .with_amount(&request.amount().to_string())
            .with_nonce(nonce)
            .with_metadata("asset", serde_json::json!(request.asset().to_string()))
            .info(&format!(
                "Forwarding {} {} to {}",
                request.amount(),
                match request.asset() {
                    AssetKind::Native => self.profile.native_symbol,
                    AssetKind::Token => "tokens",
                },
                request.receiver()
            ));

        let result = self
            .dispatcher
            .send(tx, &self.wallet, self.settings.confirmation_timeout)
            .await?;
        MetricsLogger::log_dispatch_result(&result, &request.amount().to_string());

        Ok(result)
    }

    fn build_token(&self, request: &TransferRequest, nonce: u64, gas_price: u128) -> Result<UnsignedTransaction> {
        let token = self.profile.require_token()?;
        let amount_base_units = to_base_units(request.amount(), token.decimals)?;
        Ok(build_token_transfer(
            token,
            request.receiver(),
            amount_base_units,
            request.sender(),
            request.chain_id(),
            request.gas_limit(),
            nonce,
            gas_price,
        )?)
    }
}
