//! Tradable instrument shapes, independent of any venue.
//!
//! An instrument is a discriminated base row plus exactly one subtype row
//! (spot pair, perpetual, dated future, option series, or lending position).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::InvalidEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentType {
    Spot,
    Perpetual,
    Future,
    Option,
    LendingDeposit,
    LendingBorrow,
}

impl InstrumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Perpetual => "perpetual",
            Self::Future => "future",
            Self::Option => "option",
            Self::LendingDeposit => "lending_deposit",
            Self::LendingBorrow => "lending_borrow",
        }
    }
}

impl FromStr for InstrumentType {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(Self::Spot),
            "perpetual" => Ok(Self::Perpetual),
            "future" => Ok(Self::Future),
            "option" => Ok(Self::Option),
            "lending_deposit" => Ok(Self::LendingDeposit),
            "lending_borrow" => Ok(Self::LendingBorrow),
            other => Err(InvalidEnum::new("instrument type", other)),
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

impl FromStr for OptionType {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            other => Err(InvalidEnum::new("option type", other)),
        }
    }
}

/// Validated exercise styles for option series.
pub const EXERCISE_STYLES: &[&str] = &["european", "american", "bermudan"];

/// Base instrument row. `code` is a short unique human handle
/// ("spot:eth_usdt", "perp:btc_usd").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: Uuid,
    pub instrument_type: InstrumentType,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotInstrument {
    pub instrument_id: Uuid,
    pub base_asset_id: Uuid,
    pub quote_asset_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerpContract {
    pub instrument_id: Uuid,
    pub underlying_asset_id: Uuid,
    pub is_inverse: bool,
    pub is_quanto: bool,
    pub contract_multiplier: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureContract {
    pub instrument_id: Uuid,
    pub underlying_asset_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub is_inverse: bool,
    pub is_quanto: bool,
    pub contract_multiplier: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSeries {
    pub instrument_id: Uuid,
    pub underlying_asset_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub exercise_style: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shared row shape of `lending_deposits` and `lending_borrows`; which table
/// it came from is carried by the owning instrument's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingPosition {
    pub instrument_id: Uuid,
    pub underlying_asset_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The subtype row joined onto its instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instrument_type", rename_all = "snake_case")]
pub enum InstrumentDetail {
    Spot(SpotInstrument),
    Perpetual(PerpContract),
    Future(FutureContract),
    Option(OptionSeries),
    LendingDeposit(LendingPosition),
    LendingBorrow(LendingPosition),
}

impl InstrumentDetail {
    pub fn instrument_type(&self) -> InstrumentType {
        match self {
            Self::Spot(_) => InstrumentType::Spot,
            Self::Perpetual(_) => InstrumentType::Perpetual,
            Self::Future(_) => InstrumentType::Future,
            Self::Option(_) => InstrumentType::Option,
            Self::LendingDeposit(_) => InstrumentType::LendingDeposit,
            Self::LendingBorrow(_) => InstrumentType::LendingBorrow,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSpotInstrument {
    pub code: String,
    pub base_asset_id: Uuid,
    pub quote_asset_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerpContract {
    pub code: String,
    pub underlying_asset_id: Uuid,
    #[serde(default)]
    pub is_inverse: bool,
    #[serde(default)]
    pub is_quanto: bool,
    #[serde(default = "default_multiplier")]
    pub contract_multiplier: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFutureContract {
    pub code: String,
    pub underlying_asset_id: Uuid,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub is_inverse: bool,
    #[serde(default)]
    pub is_quanto: bool,
    #[serde(default = "default_multiplier")]
    pub contract_multiplier: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOptionSeries {
    pub code: String,
    pub underlying_asset_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub exercise_style: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLendingPosition {
    pub code: String,
    pub underlying_asset_id: Uuid,
}

fn default_multiplier() -> Decimal {
    Decimal::ONE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_type_round_trips() {
        for t in [
            InstrumentType::Spot,
            InstrumentType::Perpetual,
            InstrumentType::Future,
            InstrumentType::Option,
            InstrumentType::LendingDeposit,
            InstrumentType::LendingBorrow,
        ] {
            assert_eq!(t.as_str().parse::<InstrumentType>().unwrap(), t);
        }
    }

    #[test]
    fn detail_reports_matching_type() {
        let now = Utc::now();
        let detail = InstrumentDetail::Spot(SpotInstrument {
            instrument_id: Uuid::new_v4(),
            base_asset_id: Uuid::new_v4(),
            quote_asset_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        });
        assert_eq!(detail.instrument_type(), InstrumentType::Spot);
    }

    #[test]
    fn exercise_styles_are_lowercase() {
        for style in EXERCISE_STYLES {
            assert_eq!(*style, style.to_lowercase());
        }
    }
}
