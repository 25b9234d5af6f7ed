//! Assets, balances and trading pairs.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Volume;

const NATIVE: &str = "native";

/// A tradeable unit on the ledger.
///
/// Written as `native` for the reserve asset or `CODE:ISSUER` for credit assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Asset {
    /// The ledger's reserve asset.
    Native,
    /// An asset issued by an account.
    Credit { code: String, issuer: String },
}

impl Asset {
    /// Create a credit asset.
    pub fn credit(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self::Credit {
            code: code.into(),
            issuer: issuer.into(),
        }
    }

    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str(NATIVE),
            Self::Credit { code, issuer } => write!(f, "{code}:{issuer}"),
        }
    }
}

/// Error returned when an asset string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid asset '{0}': expected 'native' or 'CODE:ISSUER'")]
pub struct ParseAssetError(String);

impl FromStr for Asset {
    type Err = ParseAssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NATIVE) {
            return Ok(Self::Native);
        }
        match s.split_once(':') {
            Some((code, issuer))
                if !code.is_empty()
                    && code.len() <= 12
                    && !issuer.is_empty()
                    && !issuer.contains(':') =>
            {
                Ok(Self::credit(code, issuer))
            }
            _ => Err(ParseAssetError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Asset {
    type Error = ParseAssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}

/// Holdings of one asset, read fresh every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    /// Amount currently held.
    pub available: Volume,
    /// Maximum the account may hold; `None` means unlimited (native asset).
    pub trust_limit: Option<Volume>,
}

impl Balance {
    /// Balance of the native asset, which has no trust limit.
    pub const fn native(available: Volume) -> Self {
        Self {
            available,
            trust_limit: None,
        }
    }

    /// Balance of a credit asset held under a trustline.
    pub const fn credit(available: Volume, trust_limit: Volume) -> Self {
        Self {
            available,
            trust_limit: Some(trust_limit),
        }
    }

    /// An empty balance with no trust limit.
    pub const fn empty() -> Self {
        Self::native(Decimal::ZERO)
    }
}

/// The base and quote assets a bot trades. Prices are quote-per-base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct TradingPair {
    pub base: Asset,
    pub quote: Asset,
}

impl TradingPair {
    pub fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Balances of both assets of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairBalances {
    pub base: Balance,
    pub quote: Balance,
}

impl PairBalances {
    pub const fn new(base: Balance, quote: Balance) -> Self {
        Self { base, quote }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_native_and_credit() {
        assert_eq!("native".parse::<Asset>().unwrap(), Asset::Native);
        assert_eq!(
            "USD:GISSUER".parse::<Asset>().unwrap(),
            Asset::credit("USD", "GISSUER")
        );
    }

    #[test]
    fn rejects_malformed_assets() {
        assert!("USD".parse::<Asset>().is_err());
        assert!(":GISSUER".parse::<Asset>().is_err());
        assert!("USD:".parse::<Asset>().is_err());
        assert!("WAYTOOLONGCODE1:G".parse::<Asset>().is_err());
    }

    #[test]
    fn display_matches_parse_format() {
        let asset = Asset::credit("EUR", "GX");
        assert_eq!(asset.to_string(), "EUR:GX");
        assert_eq!(asset.to_string().parse::<Asset>().unwrap(), asset);
    }

    #[test]
    fn assets_compare_structurally() {
        assert_eq!(Asset::credit("USD", "G1"), Asset::credit("USD", "G1"));
        assert_ne!(Asset::credit("USD", "G1"), Asset::credit("USD", "G2"));
    }

    #[test]
    fn deserializes_from_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            asset: Asset,
        }
        let parsed: Wrapper = toml::from_str("asset = \"BTC:GANCHOR\"").unwrap();
        assert_eq!(parsed.asset, Asset::credit("BTC", "GANCHOR"));
    }
}
