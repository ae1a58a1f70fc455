//! Gas prices and transaction fees.

use std::{fmt, str::FromStr};

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeStruct};

use super::Coin;

/// Maximum number of fractional digits accepted in a gas price.
const MAX_FRACTIONAL_DIGITS: u32 = 18;

/// Largest scaled amount accepted in a gas price. Any `u64` gas limit times this fits in a `u128`.
const MAX_ATOMICS: u128 = u64::MAX as u128;

/// Price of one unit of gas, e.g. `0.025uaura`.
///
/// The amount is kept as an integer scaled by `10^decimals` so fee math stays exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    atomics: u128,
    decimals: u32,
    denom: String,
}

impl GasPrice {
    /// `0.025` per unit of gas in `denom`.
    pub fn default_for(denom: impl Into<String>) -> Self {
        Self {
            atomics: 25,
            decimals: 3,
            denom: denom.into(),
        }
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }
}

impl FromStr for GasPrice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .with_context(|| format!("Gas price `{}` has no denom", s))?;
        let (amount, denom) = s.split_at(split);

        if amount.is_empty() {
            anyhow::bail!("Gas price `{}` has no amount", s);
        }
        if denom.len() < 3 || !denom.chars().all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c)) {
            anyhow::bail!("Invalid denom `{}` in gas price `{}`", denom, s);
        }

        let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
        if fraction.contains('.') {
            anyhow::bail!("Invalid gas price amount `{}`", amount);
        }
        let decimals = fraction.len() as u32;
        if decimals > MAX_FRACTIONAL_DIGITS {
            anyhow::bail!(
                "Gas price `{}` has more than {} fractional digits",
                s,
                MAX_FRACTIONAL_DIGITS
            );
        }

        let atomics = format!("{}{}", whole, fraction)
            .parse::<u128>()
            .with_context(|| format!("Invalid gas price amount `{}`", amount))?;
        if atomics > MAX_ATOMICS {
            anyhow::bail!("Gas price `{}` is too large", s);
        }

        Ok(Self {
            atomics,
            decimals,
            denom: denom.to_string(),
        })
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10u128.pow(self.decimals);
        let whole = self.atomics / scale;
        let fraction = self.atomics % scale;
        if self.decimals == 0 {
            write!(f, "{}{}", whole, self.denom)
        } else {
            write!(
                f,
                "{}.{:0width$}{}",
                whole,
                fraction,
                self.denom,
                width = self.decimals as usize
            )
        }
    }
}

impl Serialize for GasPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GasPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An explicit fee: coins paid and the gas limit they buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    #[serde(with = "gas_string")]
    pub gas: u64,
}

/// Fee mode for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fee {
    /// Let the chain client simulate and estimate the fee.
    Auto,
    /// Use a precomputed fee.
    Fixed(StdFee),
}

impl Serialize for Fee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Fee::Auto => serializer.serialize_str("auto"),
            Fee::Fixed(fee) => {
                let mut state = serializer.serialize_struct("StdFee", 2)?;
                state.serialize_field("amount", &fee.amount)?;
                state.serialize_field("gas", &fee.gas.to_string())?;
                state.end()
            }
        }
    }
}

/// Compute the fee for `gas_limit` units of gas at `gas_price`, rounding up.
pub fn calculate_fee(gas_limit: u64, gas_price: &GasPrice) -> anyhow::Result<StdFee> {
    let scale = 10u128.pow(gas_price.decimals);
    let product = u128::from(gas_limit)
        .checked_mul(gas_price.atomics)
        .with_context(|| format!("Fee for {} gas at {} overflows", gas_limit, gas_price))?;
    let amount = product.div_ceil(scale);

    Ok(StdFee {
        amount: vec![Coin::new(amount, gas_price.denom.clone())],
        gas: gas_limit,
    })
}

mod gas_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
