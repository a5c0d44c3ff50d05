use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{MemberError, Result};
use crate::ledger::BucketKind;
use crate::member::{Member, NewMember, Status};
use crate::schedule::{FeeSchedule, Rank};

#[derive(Debug, Clone, Default)]
pub struct Roster {
    schedule: FeeSchedule,
    members: Vec<Member>,
}

impl Roster {
    pub fn new(schedule: FeeSchedule) -> Self {
        Self {
            schedule,
            members: Vec::new(),
        }
    }

    pub fn from_members(schedule: FeeSchedule, mut members: Vec<Member>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(members.len());
        for member in &mut members {
            member.validate()?;
            member.normalize_identity();
            if !seen.insert(member.id()) {
                return Err(MemberError::DuplicateId(member.id()));
            }
        }
        Ok(Self { schedule, members })
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Member> {
        self.members.iter().find(|m| m.id() == id)
    }

    fn get_mut(&mut self, id: u32) -> Result<&mut Member> {
        self.members
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(MemberError::MemberNotFound(id))
    }

    pub fn next_id(&self) -> Result<u32> {
        match self.members.iter().map(Member::id).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or(MemberError::IdsExhausted(max)),
        }
    }

    pub fn add_member(&mut self, draft: NewMember, today: NaiveDate) -> Result<&Member> {
        let id = self.next_id()?;
        let member = Member::create(id, draft, &self.schedule, today)?;
        info!(
            id,
            membership_number = member.membership_number(),
            rank = %member.rank(),
            "member added"
        );
        self.members.push(member);
        Ok(&self.members[self.members.len() - 1])
    }

    /// A rank edit re-prices like [`Roster::change_rank`].
    pub fn update_member(&mut self, mut member: Member) -> Result<&Member> {
        member.validate()?;
        let schedule = self.schedule;
        let slot = self.get_mut(member.id())?;
        let rank = member.rank();
        if rank != slot.rank() {
            member.personal_data.rank = slot.rank();
            member.change_rank(rank, &schedule)?;
            info!(id = member.id(), rank = %rank, "rank changed");
        }
        *slot = member;
        debug!(id = slot.id(), "member updated");
        Ok(slot)
    }

    pub fn set_fee_paid(&mut self, id: u32, kind: BucketKind, paid: bool) -> Result<&Member> {
        let member = self.get_mut(id)?;
        if member.set_fee_paid(kind, paid) {
            info!(
                id,
                bucket = kind.key(),
                paid,
                remaining = member.ledger().fee_remaining(),
                "fee bucket toggled"
            );
        }
        Ok(member)
    }

    pub fn change_rank(&mut self, id: u32, rank: Rank) -> Result<&Member> {
        let schedule = self.schedule;
        let member = self.get_mut(id)?;
        member.change_rank(rank, &schedule)?;
        info!(id, rank = %rank, "rank changed");
        Ok(member)
    }

    pub fn change_status(&mut self, id: u32, status: Status) -> Result<&Member> {
        let member = self.get_mut(id)?;
        member.personal_data.status = status;
        info!(id, status = %status, "status changed");
        Ok(member)
    }
}

fn matches_query(member: &Member, query: &str, query_lower: &str) -> bool {
    member.full_name().to_lowercase().contains(query_lower)
        || member.membership_number().to_lowercase().contains(query_lower)
        || member.personal_data.cnic.contains(query)
        || member.rank().title().to_lowercase().contains(query_lower)
}

/// Case-sensitive on CNIC only. An empty query returns every member.
pub fn search<'a>(members: &'a [Member], query: &str) -> Vec<&'a Member> {
    if query.is_empty() {
        return members.iter().collect();
    }
    let query_lower = query.to_lowercase();
    members
        .iter()
        .filter(|m| matches_query(m, query, &query_lower))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    pub query: Option<String>,
    pub status: Option<Status>,
    pub rank: Option<Rank>,
    pub pending_only: bool,
}

pub fn filter<'a>(members: &'a [Member], filter: &MemberFilter) -> Vec<&'a Member> {
    let query = filter.query.as_deref().unwrap_or("");
    search(members, query)
        .into_iter()
        .filter(|m| filter.status.map_or(true, |s| m.status() == s))
        .filter(|m| filter.rank.map_or(true, |r| m.rank() == r))
        .filter(|m| !filter.pending_only || m.ledger().fee_remaining() > 0)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterStats {
    pub total: usize,
    pub serving: usize,
    pub retired: usize,
    pub pending_payment: usize,
    pub total_collected: i64,
    pub total_outstanding: i64,
}

pub fn stats(members: &[Member]) -> RosterStats {
    members.iter().fold(
        RosterStats {
            total: members.len(),
            ..RosterStats::default()
        },
        |mut acc, m| {
            match m.status() {
                Status::Serving => acc.serving += 1,
                Status::Retired => acc.retired += 1,
            }
            let ledger = m.ledger();
            if ledger.fee_remaining() > 0 {
                acc.pending_payment += 1;
            }
            acc.total_collected += ledger.total_fee_paid();
            acc.total_outstanding += ledger.fee_remaining();
            acc
        },
    )
}
