//! EIP-712 order signing for the Polymarket CTF Exchange.
//!
//! Orders are signed as typed data against the exchange contract's domain,
//! then serialized into the JSON shape the CLOB API expects.

use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::sol_types::SolValue;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Side;

/// Chain ID for Polygon mainnet.
pub const POLYGON_CHAIN_ID: u64 = 137;

/// CTF Exchange contract address on Polygon mainnet.
pub const CTF_EXCHANGE_ADDRESS: &str = "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E";

/// Neg Risk CTF Exchange contract address on Polygon mainnet.
pub const NEG_RISK_CTF_EXCHANGE_ADDRESS: &str = "0xC5d563A36AE78145C45a50134d48A1215220f80a";

/// Signature type carried on every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureType {
    /// EOA signature.
    #[default]
    Eoa = 0,
    /// EIP-1271 contract signature.
    Poly = 1,
    /// Polymarket proxy-wallet signature.
    PolyProxy = 2,
}

impl SignatureType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// EIP-712 domain separator for order signing.
#[derive(Debug, Clone)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: U256,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Domain for the CTF Exchange on Polygon mainnet.
    pub fn ctf_exchange() -> Self {
        Self {
            name: "Polymarket CTF Exchange".to_string(),
            version: "1".to_string(),
            chain_id: U256::from(POLYGON_CHAIN_ID),
            verifying_contract: CTF_EXCHANGE_ADDRESS.parse().expect("Invalid CTF address"),
        }
    }

    /// Domain for the Neg Risk CTF Exchange on Polygon mainnet.
    pub fn neg_risk_ctf_exchange() -> Self {
        Self {
            name: "Polymarket CTF Exchange".to_string(),
            version: "1".to_string(),
            chain_id: U256::from(POLYGON_CHAIN_ID),
            verifying_contract: NEG_RISK_CTF_EXCHANGE_ADDRESS
                .parse()
                .expect("Invalid Neg Risk CTF address"),
        }
    }

    /// Compute the EIP-712 domain separator hash.
    pub fn separator(&self) -> B256 {
        let domain_type_hash = keccak256(
            b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );

        let name_hash = keccak256(self.name.as_bytes());
        let version_hash = keccak256(self.version.as_bytes());

        let encoded = (
            domain_type_hash,
            name_hash,
            version_hash,
            self.chain_id,
            self.verifying_contract,
        )
            .abi_encode_packed();

        keccak256(&encoded)
    }
}

/// Raw order data matching the struct the CTF Exchange contract hashes.
#[derive(Debug, Clone)]
pub struct OrderData {
    pub salt: U256,
    pub maker: Address,
    pub signer: Address,
    pub taker: Address,
    pub token_id: U256,
    pub maker_amount: U256,
    pub taker_amount: U256,
    pub expiration: U256,
    pub nonce: U256,
    pub fee_rate_bps: U256,
    pub side: u8,
    pub signature_type: u8,
}

impl OrderData {
    /// Compute the EIP-712 struct hash for this order.
    pub fn struct_hash(&self) -> B256 {
        let order_type_hash = keccak256(
            b"Order(uint256 salt,address maker,address signer,address taker,uint256 tokenId,uint256 makerAmount,uint256 takerAmount,uint256 expiration,uint256 nonce,uint256 feeRateBps,uint8 side,uint8 signatureType)",
        );

        // EIP-712 encodeData: every value padded to 32 bytes.
        let maker_padded = B256::left_padding_from(self.maker.as_slice());
        let signer_padded = B256::left_padding_from(self.signer.as_slice());
        let taker_padded = B256::left_padding_from(self.taker.as_slice());

        let encoded = (
            order_type_hash,
            self.salt,
            maker_padded,
            signer_padded,
            taker_padded,
            self.token_id,
            self.maker_amount,
            self.taker_amount,
            self.expiration,
            self.nonce,
            self.fee_rate_bps,
            U256::from(self.side),
            U256::from(self.signature_type),
        )
            .abi_encode_packed();

        keccak256(&encoded)
    }
}

/// Generate a salt for order uniqueness, masked to 2^53-1 (IEEE 754 safe
/// integer range) as required by the CLOB API.
fn rand_salt() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let raw = (nanos ^ ((std::process::id() as u128) << 32)) as u64;
    raw & ((1u64 << 53) - 1)
}

/// A signed order in the JSON shape the CLOB API expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedOrder {
    /// Order salt (must be a JSON number).
    pub salt: u64,
    pub maker: String,
    pub signer: String,
    pub taker: String,
    #[serde(rename = "tokenId")]
    pub token_id: String,
    #[serde(rename = "makerAmount")]
    pub maker_amount: String,
    #[serde(rename = "takerAmount")]
    pub taker_amount: String,
    pub expiration: String,
    pub nonce: String,
    #[serde(rename = "feeRateBps")]
    pub fee_rate_bps: String,
    pub side: String,
    #[serde(rename = "signatureType")]
    pub signature_type: u8,
    pub signature: String,
}

impl SignedOrder {
    fn from_order_data(order: &OrderData, signature: String) -> Self {
        let side = if order.side == 0 { "BUY" } else { "SELL" };

        Self {
            salt: order.salt.to::<u64>(),
            maker: format!("{:?}", order.maker),
            signer: format!("{:?}", order.signer),
            taker: format!("{:?}", order.taker),
            token_id: format!("{}", order.token_id),
            maker_amount: format!("{}", order.maker_amount),
            taker_amount: format!("{}", order.taker_amount),
            expiration: format!("{}", order.expiration),
            nonce: format!("{}", order.nonce),
            fee_rate_bps: format!("{}", order.fee_rate_bps),
            side: side.to_string(),
            signature_type: order.signature_type,
            signature,
        }
    }
}

/// Order signer for the Polymarket CLOB.
#[derive(Clone)]
pub struct OrderSigner {
    signer: PrivateKeySigner,
    domain: Eip712Domain,
    signature_type: SignatureType,
}

impl OrderSigner {
    /// Create a signer with the default CTF Exchange domain.
    pub fn new(signer: PrivateKeySigner, signature_type: SignatureType) -> Self {
        Self {
            signer,
            domain: Eip712Domain::ctf_exchange(),
            signature_type,
        }
    }

    /// Create a signer for neg-risk markets.
    pub fn new_neg_risk(signer: PrivateKeySigner, signature_type: SignatureType) -> Self {
        Self {
            signer,
            domain: Eip712Domain::neg_risk_ctf_exchange(),
            signature_type,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Build a non-resting order (expiration 0) for `size` outcome shares at
    /// `price`, and sign it.
    ///
    /// For a BUY the maker pays `size * price` USDC for `size` shares; for a
    /// SELL the maker provides `size` shares for `size * price` USDC.
    pub async fn sign_share_order(
        &self,
        token_id: &str,
        side: Side,
        price: Decimal,
        size: Decimal,
    ) -> Result<SignedOrder> {
        let token_id =
            U256::from_str_radix(token_id, 10).context("token id is not a decimal string")?;

        let (maker_amount, taker_amount) = share_amounts(side, price, size)?;

        let order = OrderData {
            salt: U256::from(rand_salt()),
            maker: self.address(),
            signer: self.address(),
            taker: Address::ZERO,
            token_id,
            maker_amount,
            taker_amount,
            // Non-resting orders must carry expiration 0.
            expiration: U256::ZERO,
            nonce: U256::ZERO,
            fee_rate_bps: U256::ZERO,
            side: match side {
                Side::Buy => 0,
                Side::Sell => 1,
            },
            signature_type: self.signature_type.as_u8(),
        };

        let digest = typed_data_hash(self.domain.separator(), order.struct_hash());
        let signature = self
            .signer
            .sign_hash(&digest)
            .await
            .context("Failed to sign order")?;

        Ok(SignedOrder::from_order_data(
            &order,
            format!("0x{}", hex::encode(signature.as_bytes())),
        ))
    }
}

impl std::fmt::Debug for OrderSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSigner")
            .field("address", &format!("{:?}", self.address()))
            .field("domain", &self.domain.name)
            .finish()
    }
}

/// keccak256("\x19\x01" ++ domainSeparator ++ structHash)
fn typed_data_hash(domain_separator: B256, struct_hash: B256) -> B256 {
    let prefix = [0x19u8, 0x01];
    let data = (prefix, domain_separator, struct_hash).abi_encode_packed();
    keccak256(&data)
}

/// Convert a share-denominated (price, size) pair into base-unit maker/taker
/// amounts. USDC and outcome tokens both carry 6 decimals.
fn share_amounts(side: Side, price: Decimal, size: Decimal) -> Result<(U256, U256)> {
    let base = Decimal::from(1_000_000u64);

    let to_u256 = |d: Decimal| -> Result<U256> {
        let rounded = (d * base).round();
        let units: u128 = rounded
            .to_string()
            .parse()
            .context("amount does not fit in base units")?;
        Ok(U256::from(units))
    };

    let shares = to_u256(size)?;
    let notional = to_u256(size * price)?;

    Ok(match side {
        Side::Buy => (notional, shares),
        Side::Sell => (shares, notional),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // Well-known throwaway key (hardhat account 0).
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn test_signer() -> OrderSigner {
        let signer = PrivateKeySigner::from_str(TEST_PRIVATE_KEY).unwrap();
        OrderSigner::new(signer, SignatureType::Eoa)
    }

    #[test]
    fn signer_derives_expected_address() {
        assert_eq!(
            test_signer().address().to_string().to_lowercase(),
            TEST_ADDRESS.to_lowercase()
        );
    }

    #[test]
    fn domain_separator_is_deterministic() {
        assert_eq!(
            Eip712Domain::ctf_exchange().separator(),
            Eip712Domain::ctf_exchange().separator()
        );
        assert_ne!(
            Eip712Domain::ctf_exchange().separator(),
            Eip712Domain::neg_risk_ctf_exchange().separator()
        );
    }

    #[test]
    fn share_amounts_sell() {
        // Selling 40 shares at 0.69: 40 tokens out, 27.6 USDC in.
        let (maker, taker) =
            share_amounts(Side::Sell, Decimal::new(69, 2), Decimal::from(40)).unwrap();
        assert_eq!(maker, U256::from(40_000_000u64));
        assert_eq!(taker, U256::from(27_600_000u64));
    }

    #[test]
    fn share_amounts_buy() {
        let (maker, taker) =
            share_amounts(Side::Buy, Decimal::new(50, 2), Decimal::from(100)).unwrap();
        assert_eq!(maker, U256::from(50_000_000u64));
        assert_eq!(taker, U256::from(100_000_000u64));
    }

    #[tokio::test]
    async fn sign_share_order_produces_65_byte_signature() {
        let signed = test_signer()
            .sign_share_order("12345", Side::Sell, Decimal::new(69, 2), Decimal::from(40))
            .await
            .unwrap();

        assert!(signed.signature.starts_with("0x"));
        assert_eq!(signed.signature.len(), 132);
        assert_eq!(signed.side, "SELL");
        assert_eq!(signed.expiration, "0");
    }

    #[test]
    fn signed_order_serializes_api_field_names() {
        let order = OrderData {
            salt: U256::from(999u64),
            maker: TEST_ADDRESS.parse().unwrap(),
            signer: TEST_ADDRESS.parse().unwrap(),
            taker: Address::ZERO,
            token_id: U256::from(123u64),
            maker_amount: U256::from(100u64),
            taker_amount: U256::from(200u64),
            expiration: U256::ZERO,
            nonce: U256::ZERO,
            fee_rate_bps: U256::ZERO,
            side: 1,
            signature_type: SignatureType::PolyProxy.as_u8(),
        };

        let signed = SignedOrder::from_order_data(&order, "0xsig".into());
        let json = serde_json::to_string(&signed).unwrap();

        assert!(json.contains("makerAmount"));
        assert!(json.contains("tokenId"));
        assert!(json.contains("signatureType"));
        assert_eq!(signed.signature_type, 2);
    }
}
