use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{MemberError, Result};
use crate::ledger::{BucketKind, Ledger};
use crate::schedule::{FeeSchedule, Rank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Serving,
    Retired,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Serving => "Serving",
            Status::Retired => "Retired",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = MemberError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "serving" => Ok(Status::Serving),
            "retired" => Ok(Status::Retired),
            _ => Err(MemberError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalData {
    pub full_name: String,
    pub rank: Rank,
    pub status: Status,
    pub cnic: String,
    pub whatsapp: String,
    pub office_address: String,
    pub residence_address: String,
    pub appointment: String,
    pub personal_number: String,
    pub personal_assistant: Contact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    #[serde(flatten)]
    pub ledger: Ledger,
    pub card_receiver: Contact,
    pub remarks: String,
}

/// Badge shown next to a member: anything outstanding is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaymentBadge {
    Cleared,
    Pending,
}

pub fn membership_number(id: u32) -> String {
    format!("MEM{:04}", id)
}

pub fn personal_number(id: u32) -> String {
    format!("P{:05}", 10000 + u64::from(id))
}

pub(crate) fn rank_remarks(fee: i64) -> String {
    format!("Rank Fee: {}/- per month", fee)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    id: u32,
    serial_number: u32,
    membership_number: String,
    pub date_of_joining: NaiveDate,
    pub date_of_leaving: Option<NaiveDate>,
    pub personal_data: PersonalData,
    pub account_data: AccountData,
}

/// Operator input for a new member. Defaults mirror a blank "add" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub full_name: String,
    pub rank: Rank,
    pub status: Status,
    pub cnic: String,
    pub whatsapp: String,
    pub office_address: String,
    pub residence_address: String,
    pub appointment: String,
    pub personal_assistant: Contact,
    pub card_receiver: Contact,
    /// `None` means the day the member is added.
    pub date_of_joining: Option<NaiveDate>,
    pub date_of_leaving: Option<NaiveDate>,
}

impl Default for NewMember {
    fn default() -> Self {
        Self {
            full_name: "New Member".to_string(),
            rank: Rank::LtCaptMaj,
            status: Status::Serving,
            cnic: String::new(),
            whatsapp: String::new(),
            office_address: String::new(),
            residence_address: String::new(),
            appointment: String::new(),
            personal_assistant: Contact::default(),
            card_receiver: Contact::default(),
            date_of_joining: None,
            date_of_leaving: None,
        }
    }
}

impl Member {
    pub fn create(
        id: u32,
        draft: NewMember,
        schedule: &FeeSchedule,
        today: NaiveDate,
    ) -> Result<Self> {
        let fee = schedule.monthly_fee(draft.rank.title());
        let member = Self {
            id,
            serial_number: id,
            membership_number: membership_number(id),
            date_of_joining: draft.date_of_joining.unwrap_or(today),
            date_of_leaving: draft.date_of_leaving,
            personal_data: PersonalData {
                full_name: draft.full_name.trim().to_string(),
                rank: draft.rank,
                status: draft.status,
                cnic: draft.cnic,
                whatsapp: draft.whatsapp,
                office_address: draft.office_address,
                residence_address: draft.residence_address,
                appointment: draft.appointment,
                personal_number: personal_number(id),
                personal_assistant: draft.personal_assistant,
            },
            account_data: AccountData {
                ledger: schedule.init_ledger(draft.rank.title()),
                card_receiver: draft.card_receiver,
                remarks: format!("New member - {}", rank_remarks(fee)),
            },
        };
        member.validate()?;
        Ok(member)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(MemberError::InvalidId(0));
        }
        if self.personal_data.full_name.trim().is_empty() {
            return Err(MemberError::EmptyName);
        }
        if let Some(leaving) = self.date_of_leaving {
            if leaving < self.date_of_joining {
                return Err(MemberError::LeavingBeforeJoining {
                    joining: self.date_of_joining,
                    leaving,
                });
            }
        }
        Ok(())
    }

    /// Re-derive id-based fields after loading a record.
    pub(crate) fn normalize_identity(&mut self) {
        self.serial_number = self.id;
        self.membership_number = membership_number(self.id);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn serial_number(&self) -> u32 {
        self.serial_number
    }

    pub fn membership_number(&self) -> &str {
        &self.membership_number
    }

    pub fn full_name(&self) -> &str {
        &self.personal_data.full_name
    }

    pub fn rank(&self) -> Rank {
        self.personal_data.rank
    }

    pub fn status(&self) -> Status {
        self.personal_data.status
    }

    pub fn ledger(&self) -> &Ledger {
        &self.account_data.ledger
    }

    pub fn set_fee_paid(&mut self, kind: BucketKind, paid: bool) -> bool {
        self.account_data.ledger.set_paid(kind, paid)
    }

    pub fn change_rank(&mut self, rank: Rank, schedule: &FeeSchedule) -> Result<()> {
        self.account_data.ledger.reprice(schedule, rank.title())?;
        self.personal_data.rank = rank;
        self.account_data.remarks = rank_remarks(schedule.monthly_fee(rank.title()));
        Ok(())
    }

    pub fn payment_badge(&self) -> PaymentBadge {
        if self.ledger().fee_remaining() > 0 {
            PaymentBadge::Pending
        } else {
            PaymentBadge::Cleared
        }
    }

    /// Whole years of membership, up to leaving or `today`.
    pub fn membership_period_years(&self, today: NaiveDate) -> i64 {
        let end = self.date_of_leaving.unwrap_or(today);
        let days = (end - self.date_of_joining).num_days().max(0);
        (days as f64 / 365.25).floor() as i64
    }

    pub fn membership_period(&self, today: NaiveDate) -> String {
        format!("{} years", self.membership_period_years(today))
    }

    pub fn years_since_joining(&self, today: NaiveDate) -> i64 {
        i64::from(today.year() - self.date_of_joining.year())
    }

    pub fn whole_fee_paid_till_joining(&self, today: NaiveDate) -> i64 {
        self.ledger()
            .whole_fee_paid_till_joining(self.years_since_joining(today))
    }
}
