//! Deterministic demo roster.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::ledger::BucketKind;
use crate::member::{rank_remarks, Contact, NewMember, Status};
use crate::roster::Roster;
use crate::schedule::{FeeSchedule, Rank};

pub const DEFAULT_ROSTER_SIZE: u32 = 500;

const CITIES: [&str; 6] = [
    "Rawalpindi",
    "Islamabad",
    "Lahore",
    "Karachi",
    "Quetta",
    "Peshawar",
];

/// Chance that each bucket is already paid, in [`BucketKind::ALL`] order.
const PAID_ODDS: [f64; 5] = [0.7, 0.6, 0.5, 0.4, 0.3];

fn phone(rng: &mut StdRng) -> String {
    format!("03{}", rng.gen_range(10_000_000..100_000_000))
}

fn random_date(rng: &mut StdRng, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, rng.gen_range(1..=12), rng.gen_range(1..=28))
}

/// `count` members with ids `1..=count`; the same seed always yields the
/// same roster.
pub fn generate_roster(
    count: u32,
    seed: u64,
    schedule: FeeSchedule,
    today: NaiveDate,
) -> Result<Roster> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut roster = Roster::new(schedule);

    for i in 1..=count {
        let rank = Rank::ALL[rng.gen_range(0..Rank::ALL.len())];
        let status = if rng.gen_bool(0.5) {
            Status::Serving
        } else {
            Status::Retired
        };
        let join_year = 2000 + rng.gen_range(0..25);
        let date_of_joining = random_date(&mut rng, join_year);
        let date_of_leaving = if rng.gen_bool(0.3) {
            let leave_year = join_year + rng.gen_range(0..(today.year() - join_year).max(1));
            random_date(&mut rng, leave_year).filter(|leaving| Some(*leaving) >= date_of_joining)
        } else {
            None
        };

        let draft = NewMember {
            full_name: format!("Member {} Name", i),
            rank,
            status,
            cnic: format!("XXXXX-{:07}-X", 1_000_000 + i),
            whatsapp: phone(&mut rng),
            office_address: format!(
                "{} Street, {}",
                rng.gen_range(0..100),
                CITIES[rng.gen_range(0..CITIES.len())]
            ),
            residence_address: format!(
                "{} Avenue, {}",
                rng.gen_range(0..100),
                CITIES[rng.gen_range(0..CITIES.len())]
            ),
            appointment: format!("Appointment {}", rng.gen_range(1..=10)),
            personal_assistant: Contact {
                name: format!("Assistant {}", i),
                contact: phone(&mut rng),
            },
            card_receiver: Contact {
                name: format!("Receiver {}", i),
                contact: phone(&mut rng),
            },
            date_of_joining,
            date_of_leaving,
        };

        // Seeded members are established, not newly joined.
        let mut member = roster.add_member(draft, today)?.clone();
        member.account_data.remarks = rank_remarks(schedule.monthly_fee(rank.title()));
        let id = roster.update_member(member)?.id();
        for (kind, odds) in BucketKind::ALL.into_iter().zip(PAID_ODDS) {
            if rng.gen_bool(odds) {
                roster.set_fee_paid(id, kind, true)?;
            }
        }
    }

    Ok(roster)
}
