//! Rank fee schedule: the static table of monthly dues per rank.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MemberError, Result};
use crate::ledger::BucketKind;

/// One-time fee charged at registration.
pub const REGISTRATION_FEE: i64 = 600;

/// Monthly fee used for any rank title the schedule does not know.
pub const DEFAULT_MONTHLY_FEE: i64 = 500;

/// Upper bound for configurable fees. A full ledger is at most 31 of these.
pub const MAX_FEE: i64 = i64::MAX / 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "Lt/Capt/Maj")]
    LtCaptMaj,
    #[serde(rename = "Lt Col/Col")]
    LtColCol,
    #[serde(rename = "Brig")]
    Brig,
    #[serde(rename = "Maj Gen")]
    MajGen,
    #[serde(rename = "Lt Gen")]
    LtGen,
    #[serde(rename = "Gen")]
    Gen,
}

impl Rank {
    /// Schedule order, junior to senior.
    pub const ALL: [Rank; 6] = [
        Rank::LtCaptMaj,
        Rank::LtColCol,
        Rank::Brig,
        Rank::MajGen,
        Rank::LtGen,
        Rank::Gen,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Rank::LtCaptMaj => "Lt/Capt/Maj",
            Rank::LtColCol => "Lt Col/Col",
            Rank::Brig => "Brig",
            Rank::MajGen => "Maj Gen",
            Rank::LtGen => "Lt Gen",
            Rank::Gen => "Gen",
        }
    }

    pub fn monthly_fee(self) -> i64 {
        match self {
            Rank::LtCaptMaj => 500,
            Rank::LtColCol => 1000,
            Rank::Brig => 1200,
            Rank::MajGen => 1500,
            Rank::LtGen | Rank::Gen => 2000,
        }
    }

    /// Exact title match; surrounding whitespace is ignored.
    pub fn from_title(title: &str) -> Option<Rank> {
        let title = title.trim();
        Rank::ALL.into_iter().find(|rank| rank.title() == title)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Rank {
    type Err = MemberError;

    fn from_str(s: &str) -> Result<Self> {
        Rank::from_title(s).ok_or_else(|| MemberError::UnknownRank(s.to_string()))
    }
}

/// Monthly fee for a rank title. Unknown titles get [`DEFAULT_MONTHLY_FEE`]
/// so free-text ranks never break fee computation.
pub fn monthly_fee(rank: &str) -> i64 {
    FeeSchedule::standard().monthly_fee(rank)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankRate {
    pub rank: Rank,
    pub monthly_fee: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentPeriod {
    pub kind: BucketKind,
    pub months: i64,
    pub calculation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    registration_fee: i64,
    default_monthly_fee: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeeSchedule {
    pub const fn standard() -> Self {
        Self {
            registration_fee: REGISTRATION_FEE,
            default_monthly_fee: DEFAULT_MONTHLY_FEE,
        }
    }

    pub fn new(registration_fee: i64, default_monthly_fee: i64) -> Result<Self> {
        if registration_fee < 0 {
            return Err(MemberError::NegativeAmount {
                kind: BucketKind::Registration,
                amount: registration_fee,
            });
        }
        if default_monthly_fee <= 0 {
            return Err(MemberError::NonPositiveFee(default_monthly_fee));
        }
        if registration_fee > MAX_FEE {
            return Err(MemberError::FeeTooLarge(registration_fee));
        }
        if default_monthly_fee > MAX_FEE {
            return Err(MemberError::FeeTooLarge(default_monthly_fee));
        }
        Ok(Self {
            registration_fee,
            default_monthly_fee,
        })
    }

    pub fn registration_fee(&self) -> i64 {
        self.registration_fee
    }

    pub fn default_monthly_fee(&self) -> i64 {
        self.default_monthly_fee
    }

    pub fn monthly_fee(&self, rank: &str) -> i64 {
        Rank::from_title(rank)
            .map(Rank::monthly_fee)
            .unwrap_or(self.default_monthly_fee)
    }

    pub fn rates(&self) -> Vec<RankRate> {
        Rank::ALL
            .into_iter()
            .map(|rank| RankRate {
                rank,
                monthly_fee: rank.monthly_fee(),
            })
            .collect()
    }

    pub fn periods(&self) -> Vec<PaymentPeriod> {
        BucketKind::PERIODIC
            .into_iter()
            .map(|kind| {
                let months = kind.months();
                PaymentPeriod {
                    kind,
                    months,
                    calculation: format!("{} × Monthly Fee", months),
                }
            })
            .collect()
    }
}
