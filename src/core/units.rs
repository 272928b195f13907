use crate::core::error::{BetSyncError, Result};
use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Largest scale `Decimal` can carry.
pub const MAX_DECIMALS: u32 = 28;

/// Conversion between ledger base units (wei-like integers) and the
/// human-scaled display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUnit {
    decimals: u32,
}

impl Default for TokenUnit {
    fn default() -> Self {
        Self::ETHER
    }
}

impl TokenUnit {
    pub const ETHER: TokenUnit = TokenUnit { decimals: 18 };

    pub fn new(decimals: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(
            decimals <= MAX_DECIMALS,
            "token decimals {decimals} exceed the supported maximum of {MAX_DECIMALS}"
        );
        Ok(Self { decimals })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Exact conversion from base units. Amounts that do not fit a `Decimal`
    /// are rejected rather than rounded.
    pub fn to_display(&self, base: U256) -> Result<Decimal> {
        let raw = u128::try_from(base)
            .ok()
            .and_then(|v| i128::try_from(v).ok())
            .ok_or_else(|| BetSyncError::bad_record(None, format!("stake {base} out of range")))?;

        Decimal::try_from_i128_with_scale(raw, self.decimals)
            .map(|d| d.normalize())
            .map_err(|e| BetSyncError::bad_record(None, format!("stake {base}: {e}")))
    }

    /// Exact conversion to base units, used when submitting stakes.
    pub fn to_base(&self, amount: Decimal) -> anyhow::Result<U256> {
        anyhow::ensure!(!amount.is_sign_negative(), "negative amount {amount}");

        let amount = amount.normalize();
        let scale = amount.scale();
        anyhow::ensure!(
            scale <= self.decimals,
            "amount {amount} is finer than one base unit"
        );

        let mantissa = u128::try_from(amount.mantissa())?;
        let factor = U256::from(10u8).pow(U256::from(self.decimals - scale));
        Ok(U256::from(mantissa) * factor)
    }
}

/// The default wei -> ether conversion handed to the classifier.
pub fn wei_to_ether(wei: U256) -> Result<Decimal> {
    TokenUnit::ETHER.to_display(wei)
}
