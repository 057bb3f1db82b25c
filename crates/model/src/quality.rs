//! Quality flags: severity-tagged annotations on assets that can gate
//! downstream trading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::InvalidEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    Scam,
    Rugpull,
    Exploited,
    Deprecated,
    Paused,
    Unverified,
    LowLiquidity,
    Honeypot,
    TaxToken,
}

impl FlagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scam => "scam",
            Self::Rugpull => "rugpull",
            Self::Exploited => "exploited",
            Self::Deprecated => "deprecated",
            Self::Paused => "paused",
            Self::Unverified => "unverified",
            Self::LowLiquidity => "low_liquidity",
            Self::Honeypot => "honeypot",
            Self::TaxToken => "tax_token",
        }
    }
}

impl FromStr for FlagType {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scam" => Ok(Self::Scam),
            "rugpull" => Ok(Self::Rugpull),
            "exploited" => Ok(Self::Exploited),
            "deprecated" => Ok(Self::Deprecated),
            "paused" => Ok(Self::Paused),
            "unverified" => Ok(Self::Unverified),
            "low_liquidity" => Ok(Self::LowLiquidity),
            "honeypot" => Ok(Self::Honeypot),
            "tax_token" => Ok(Self::TaxToken),
            other => Err(InvalidEnum::new("flag type", other)),
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flag severity, ordered. Only `Critical` gates tradability; the rest are
/// advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Severity {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(InvalidEnum::new("severity", other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raised flag. Lifecycle is one-way: active (resolved_at empty) to
/// resolved. Re-raising means a new row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFlag {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub flag_type: FlagType,
    pub severity: Severity,
    pub source: String,
    pub reason: String,
    pub raised_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QualityFlag {
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }

    /// Whether this flag alone makes its asset untradable.
    pub fn blocks_trading(&self) -> bool {
        self.is_active() && self.severity == Severity::Critical
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQualityFlag {
    pub asset_id: Uuid,
    pub flag_type: FlagType,
    pub severity: Severity,
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagFilter {
    #[serde(default)]
    pub asset_id: Option<Uuid>,
    #[serde(default)]
    pub flag_type: Option<FlagType>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub active_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn flag(severity: Severity, resolved: bool) -> QualityFlag {
        let now = Utc::now();
        QualityFlag {
            id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            flag_type: FlagType::Scam,
            severity,
            source: "unit".to_string(),
            reason: "test".to_string(),
            raised_at: now,
            resolved_at: resolved.then_some(now),
            resolved_by: resolved.then(|| "ops".to_string()),
            resolution_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn only_active_critical_blocks_trading() {
        assert!(flag(Severity::Critical, false).blocks_trading());
        assert!(!flag(Severity::Critical, true).blocks_trading());
        assert!(!flag(Severity::High, false).blocks_trading());
    }

    #[test]
    fn flag_type_round_trips() {
        for t in [
            FlagType::Scam,
            FlagType::Rugpull,
            FlagType::Exploited,
            FlagType::Deprecated,
            FlagType::Paused,
            FlagType::Unverified,
            FlagType::LowLiquidity,
            FlagType::Honeypot,
            FlagType::TaxToken,
        ] {
            assert_eq!(t.as_str().parse::<FlagType>().unwrap(), t);
        }
    }
}
