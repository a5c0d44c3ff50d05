use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MemberError, Result};
use crate::schedule::FeeSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BucketKind {
    Registration,
    Quarterly,
    SixMonth,
    NineMonth,
    Yearly,
}

impl BucketKind {
    pub const ALL: [BucketKind; 5] = [
        BucketKind::Registration,
        BucketKind::Quarterly,
        BucketKind::SixMonth,
        BucketKind::NineMonth,
        BucketKind::Yearly,
    ];

    pub const PERIODIC: [BucketKind; 4] = [
        BucketKind::Quarterly,
        BucketKind::SixMonth,
        BucketKind::NineMonth,
        BucketKind::Yearly,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn months(self) -> i64 {
        match self {
            BucketKind::Registration => 0,
            BucketKind::Quarterly => 3,
            BucketKind::SixMonth => 6,
            BucketKind::NineMonth => 9,
            BucketKind::Yearly => 12,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BucketKind::Registration => "Registration",
            BucketKind::Quarterly => "Quarterly",
            BucketKind::SixMonth => "Six Months",
            BucketKind::NineMonth => "Nine Months",
            BucketKind::Yearly => "Yearly",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            BucketKind::Registration => "registration",
            BucketKind::Quarterly => "quarterly",
            BucketKind::SixMonth => "six-month",
            BucketKind::NineMonth => "nine-month",
            BucketKind::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BucketKind {
    type Err = MemberError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "registration" | "registrationfee" => Ok(BucketKind::Registration),
            "quarterly" | "quarterlyfee" => Ok(BucketKind::Quarterly),
            "sixmonth" | "sixmonths" | "sixmonthfee" => Ok(BucketKind::SixMonth),
            "ninemonth" | "ninemonths" | "ninemonthfee" => Ok(BucketKind::NineMonth),
            "yearly" | "yearlyfee" => Ok(BucketKind::Yearly),
            _ => Err(MemberError::UnknownBucket(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBucket {
    paid: bool,
    amount: i64,
}

impl FeeBucket {
    pub fn new(kind: BucketKind, amount: i64, paid: bool) -> Result<Self> {
        if amount < 0 {
            return Err(MemberError::NegativeAmount { kind, amount });
        }
        Ok(Self { paid, amount })
    }

    fn unpaid(amount: i64) -> Self {
        Self {
            paid: false,
            amount,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeTiers {
    pub quarterly: i64,
    pub six_months: i64,
    pub nine_months: i64,
    pub yearly: i64,
}

impl FeeTiers {
    fn checked(monthly_fee: i64) -> Option<Self> {
        let times = |kind: BucketKind| monthly_fee.checked_mul(kind.months());
        Some(Self {
            quarterly: times(BucketKind::Quarterly)?,
            six_months: times(BucketKind::SixMonth)?,
            nine_months: times(BucketKind::NineMonth)?,
            yearly: times(BucketKind::Yearly)?,
        })
    }

    pub fn amount(&self, kind: BucketKind) -> Option<i64> {
        match kind {
            BucketKind::Registration => None,
            BucketKind::Quarterly => Some(self.quarterly),
            BucketKind::SixMonth => Some(self.six_months),
            BucketKind::NineMonth => Some(self.nine_months),
            BucketKind::Yearly => Some(self.yearly),
        }
    }
}

pub fn tiers_for(monthly_fee: i64) -> Result<FeeTiers> {
    if monthly_fee <= 0 {
        return Err(MemberError::NonPositiveFee(monthly_fee));
    }
    FeeTiers::checked(monthly_fee).ok_or(MemberError::AmountOverflow)
}

fn checked_total(buckets: &[FeeBucket; 5]) -> Result<i64> {
    buckets.iter().try_fold(0i64, |sum, bucket| {
        sum.checked_add(bucket.amount).ok_or(MemberError::AmountOverflow)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LedgerRecord", into = "LedgerRecord")]
pub struct Ledger {
    buckets: [FeeBucket; 5],
    total_fee_paid: i64,
    fee_remaining: i64,
}

// The bucket sum always fits in i64; every constructor checks it.
impl Ledger {
    pub fn from_buckets(buckets: [FeeBucket; 5]) -> Result<Self> {
        checked_total(&buckets)?;
        let mut ledger = Self {
            buckets,
            total_fee_paid: 0,
            fee_remaining: 0,
        };
        ledger.recompute_totals();
        Ok(ledger)
    }

    pub fn bucket(&self, kind: BucketKind) -> &FeeBucket {
        &self.buckets[kind.index()]
    }

    pub fn buckets(&self) -> impl Iterator<Item = (BucketKind, &FeeBucket)> + '_ {
        BucketKind::ALL.into_iter().zip(self.buckets.iter())
    }

    pub fn set_paid(&mut self, kind: BucketKind, paid: bool) -> bool {
        let bucket = &mut self.buckets[kind.index()];
        let changed = bucket.paid != paid;
        bucket.paid = paid;
        self.recompute_totals();
        changed
    }

    /// Paid buckets keep the amount they were settled at.
    pub fn reprice(&mut self, schedule: &FeeSchedule, rank: &str) -> Result<()> {
        let tiers = tiers_for(schedule.monthly_fee(rank))?;
        let mut buckets = self.buckets;
        for kind in BucketKind::ALL {
            let bucket = &mut buckets[kind.index()];
            if bucket.paid {
                continue;
            }
            bucket.amount = tiers
                .amount(kind)
                .unwrap_or_else(|| schedule.registration_fee());
        }
        checked_total(&buckets)?;
        self.buckets = buckets;
        self.recompute_totals();
        Ok(())
    }

    pub fn total_fee_paid(&self) -> i64 {
        self.total_fee_paid
    }

    pub fn fee_remaining(&self) -> i64 {
        self.fee_remaining
    }

    pub fn total_obligation(&self) -> i64 {
        self.buckets.iter().map(|b| b.amount).sum()
    }

    pub fn is_settled(&self) -> bool {
        self.fee_remaining == 0
    }

    /// Reporting figure, not a balance.
    pub fn whole_fee_paid_till_joining(&self, years_since_joining: i64) -> i64 {
        self.total_fee_paid.saturating_mul(years_since_joining.max(1))
    }

    fn recompute_totals(&mut self) {
        let paid: i64 = self
            .buckets
            .iter()
            .filter(|b| b.paid)
            .map(|b| b.amount)
            .sum();
        self.total_fee_paid = paid;
        self.fee_remaining = self.total_obligation() - paid;
    }
}

pub fn init_ledger(rank: &str) -> Ledger {
    FeeSchedule::standard().init_ledger(rank)
}

pub fn recompute(mut ledger: Ledger) -> Ledger {
    ledger.recompute_totals();
    ledger
}

impl FeeSchedule {
    // Schedule fees are capped at MAX_FEE, so a fresh ledger always fits.
    pub fn init_ledger(&self, rank: &str) -> Ledger {
        let monthly = self.monthly_fee(rank);
        let tier = |kind: BucketKind| FeeBucket::unpaid(monthly * kind.months());
        let mut ledger = Ledger {
            buckets: [
                FeeBucket::unpaid(self.registration_fee()),
                tier(BucketKind::Quarterly),
                tier(BucketKind::SixMonth),
                tier(BucketKind::NineMonth),
                tier(BucketKind::Yearly),
            ],
            total_fee_paid: 0,
            fee_remaining: 0,
        };
        ledger.recompute_totals();
        ledger
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerRecord {
    registration_fee: FeeBucket,
    quarterly_fee: FeeBucket,
    six_month_fee: FeeBucket,
    nine_month_fee: FeeBucket,
    yearly_fee: FeeBucket,
    #[serde(default)]
    total_fee_paid: i64,
    #[serde(default)]
    fee_remaining: i64,
}

impl TryFrom<LedgerRecord> for Ledger {
    type Error = MemberError;

    fn try_from(record: LedgerRecord) -> Result<Self> {
        let buckets = [
            record.registration_fee,
            record.quarterly_fee,
            record.six_month_fee,
            record.nine_month_fee,
            record.yearly_fee,
        ];
        for (kind, bucket) in BucketKind::ALL.into_iter().zip(buckets.iter()) {
            FeeBucket::new(kind, bucket.amount, bucket.paid)?;
        }
        Ledger::from_buckets(buckets)
    }
}

impl From<Ledger> for LedgerRecord {
    fn from(ledger: Ledger) -> Self {
        let [registration_fee, quarterly_fee, six_month_fee, nine_month_fee, yearly_fee] =
            ledger.buckets;
        Self {
            registration_fee,
            quarterly_fee,
            six_month_fee,
            nine_month_fee,
            yearly_fee,
            total_fee_paid: ledger.total_fee_paid,
            fee_remaining: ledger.fee_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn amounts(ledger: &Ledger) -> Vec<i64> {
        ledger.buckets().map(|(_, b)| b.amount()).collect()
    }

    #[test]
    fn brig_ledger_matches_schedule() {
        let ledger = init_ledger("Brig");
        assert_eq!(amounts(&ledger), vec![600, 3600, 7200, 10800, 14400]);
        assert_eq!(ledger.total_fee_paid(), 0);
        assert_eq!(ledger.fee_remaining(), 36600);
        assert!(ledger.buckets().all(|(_, b)| !b.is_paid()));
    }

    #[test]
    fn paying_quarterly_updates_totals() {
        let mut ledger = init_ledger("Brig");
        assert!(ledger.set_paid(BucketKind::Quarterly, true));
        assert_eq!(ledger.total_fee_paid(), 3600);
        assert_eq!(ledger.fee_remaining(), 33000);

        assert!(!ledger.set_paid(BucketKind::Quarterly, true));
        assert!(ledger.set_paid(BucketKind::Quarterly, false));
        assert_eq!(ledger.fee_remaining(), 36600);
    }

    #[test]
    fn unknown_rank_ledger_uses_default_fee() {
        let ledger = init_ledger("Field Marshal");
        assert_eq!(amounts(&ledger), vec![600, 1500, 3000, 4500, 6000]);
        assert_eq!(ledger.fee_remaining(), 600 + 30 * 500);
    }

    #[test]
    fn tiers_reject_non_positive_fee() {
        assert!(matches!(tiers_for(0), Err(MemberError::NonPositiveFee(0))));
        assert!(matches!(
            tiers_for(-200),
            Err(MemberError::NonPositiveFee(-200))
        ));
    }

    #[test]
    fn negative_bucket_amount_rejected() {
        let err = FeeBucket::new(BucketKind::Yearly, -1, false).unwrap_err();
        assert!(matches!(
            err,
            MemberError::NegativeAmount {
                kind: BucketKind::Yearly,
                amount: -1
            }
        ));
    }

    #[test]
    fn reprice_keeps_paid_buckets_frozen() {
        let schedule = FeeSchedule::standard();
        let mut ledger = schedule.init_ledger("Lt/Capt/Maj");
        ledger.set_paid(BucketKind::Registration, true);
        ledger.set_paid(BucketKind::Quarterly, true);

        ledger.reprice(&schedule, "Maj Gen").unwrap();

        assert_eq!(amounts(&ledger), vec![600, 1500, 9000, 13500, 18000]);
        assert_eq!(ledger.total_fee_paid(), 2100);
        assert_eq!(ledger.fee_remaining(), 9000 + 13500 + 18000);
    }

    #[test]
    fn whole_fee_paid_uses_at_least_one_year() {
        let mut ledger = init_ledger("Gen");
        ledger.set_paid(BucketKind::Registration, true);
        assert_eq!(ledger.whole_fee_paid_till_joining(0), 600);
        assert_eq!(ledger.whole_fee_paid_till_joining(1), 600);
        assert_eq!(ledger.whole_fee_paid_till_joining(7), 4200);
    }

    #[test]
    fn deserialize_ignores_stale_totals() {
        let json = r#"{
            "registrationFee": {"paid": true, "amount": 600},
            "quarterlyFee": {"paid": false, "amount": 1500},
            "sixMonthFee": {"paid": false, "amount": 3000},
            "nineMonthFee": {"paid": false, "amount": 4500},
            "yearlyFee": {"paid": true, "amount": 6000},
            "totalFeePaid": 1,
            "feeRemaining": 2
        }"#;
        let ledger: Ledger = serde_json::from_str(json).expect("ledger");
        assert_eq!(ledger.total_fee_paid(), 6600);
        assert_eq!(ledger.fee_remaining(), 9000);

        let value = serde_json::to_value(&ledger).unwrap();
        assert_eq!(value["totalFeePaid"], 6600);
        assert_eq!(value["sixMonthFee"]["amount"], 3000);
    }

    #[test]
    fn deserialize_rejects_negative_amount() {
        let json = r#"{
            "registrationFee": {"paid": false, "amount": 600},
            "quarterlyFee": {"paid": false, "amount": -3},
            "sixMonthFee": {"paid": false, "amount": 3000},
            "nineMonthFee": {"paid": false, "amount": 4500},
            "yearlyFee": {"paid": false, "amount": 6000}
        }"#;
        assert!(serde_json::from_str::<Ledger>(json).is_err());
    }

    #[test]
    fn tiers_for_huge_fee_is_an_error() {
        assert!(matches!(
            tiers_for(i64::MAX / 4),
            Err(MemberError::AmountOverflow)
        ));
        assert_eq!(tiers_for(i64::MAX / 12).unwrap().yearly, i64::MAX / 12 * 12);
    }

    #[test]
    fn deserialize_rejects_overflowing_amounts() {
        let half = i64::MAX / 2 + 1;
        let json = format!(
            r#"{{
            "registrationFee": {{"paid": true, "amount": {half}}},
            "quarterlyFee": {{"paid": true, "amount": {half}}},
            "sixMonthFee": {{"paid": false, "amount": 0}},
            "nineMonthFee": {{"paid": false, "amount": 0}},
            "yearlyFee": {{"paid": false, "amount": 0}}
        }}"#
        );
        let err = serde_json::from_str::<Ledger>(&json).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn reprice_refuses_to_overflow_and_leaves_ledger_alone() {
        let big = FeeBucket::new(BucketKind::Registration, i64::MAX - 100, true).unwrap();
        let zero = FeeBucket::new(BucketKind::Quarterly, 0, false).unwrap();
        let mut ledger = Ledger::from_buckets([big, zero, zero, zero, zero]).unwrap();
        let before = ledger.clone();

        let err = ledger.reprice(&FeeSchedule::standard(), "Gen").unwrap_err();
        assert!(matches!(err, MemberError::AmountOverflow));
        assert_eq!(ledger, before);
    }

    #[test]
    fn largest_schedule_builds_a_ledger() {
        use crate::schedule::MAX_FEE;

        let schedule = FeeSchedule::new(MAX_FEE, MAX_FEE).unwrap();
        let ledger = schedule.init_ledger("unknown");
        assert_eq!(ledger.fee_remaining(), 31 * MAX_FEE);
    }

    #[test]
    fn bucket_kind_parses_cli_and_record_names() {
        assert_eq!("six-month".parse::<BucketKind>().unwrap(), BucketKind::SixMonth);
        assert_eq!("nineMonthFee".parse::<BucketKind>().unwrap(), BucketKind::NineMonth);
        assert_eq!("Yearly".parse::<BucketKind>().unwrap(), BucketKind::Yearly);
        assert!("monthly".parse::<BucketKind>().is_err());
    }

    fn arb_bucket() -> impl Strategy<Value = FeeBucket> {
        (any::<bool>(), 0i64..1_000_000).prop_map(|(paid, amount)| FeeBucket { paid, amount })
    }

    proptest! {
        #[test]
        fn proptest_tiers_scale_with_fee(fee in 1i64..1_000_000) {
            let tiers = tiers_for(fee).expect("positive fee");
            prop_assert_eq!(tiers.yearly, fee * 12);
            prop_assert_eq!(tiers.yearly, 4 * tiers.quarterly);
            prop_assert!(tiers.yearly >= tiers.nine_months);
            prop_assert!(tiers.nine_months >= tiers.six_months);
            prop_assert!(tiers.six_months >= tiers.quarterly);
            prop_assert!(tiers.quarterly >= fee);
        }

        #[test]
        fn proptest_totals_cover_obligation(
            buckets in prop::array::uniform5(arb_bucket()),
            toggles in prop::collection::vec((0usize..5, any::<bool>()), 0..10),
        ) {
            let mut ledger = recompute(Ledger::from_buckets(buckets).unwrap());
            for (idx, paid) in toggles {
                ledger.set_paid(BucketKind::ALL[idx], paid);
            }
            let sum: i64 = ledger.buckets().map(|(_, b)| b.amount()).sum();
            prop_assert_eq!(ledger.total_fee_paid() + ledger.fee_remaining(), sum);
        }

        #[test]
        fn proptest_fresh_ledger_owes_everything(fee in 1i64..100_000) {
            let schedule = FeeSchedule::new(600, fee).expect("schedule");
            let ledger = schedule.init_ledger("not a rank");
            prop_assert_eq!(ledger.fee_remaining(), 600 + 3 * fee + 6 * fee + 9 * fee + 12 * fee);
            prop_assert_eq!(ledger.total_fee_paid(), 0);
        }
    }
}
