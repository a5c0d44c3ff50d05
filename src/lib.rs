pub mod cli;
pub mod db;
pub mod error;
pub mod export;
pub mod ledger;
pub mod member;
pub mod roster;
pub mod sample;
pub mod schedule;

pub use cli::run;
pub use error::{ExportError, MemberError, Result};
pub use export::{to_csv, CsvExport};
pub use ledger::{init_ledger, recompute, tiers_for, BucketKind, FeeBucket, FeeTiers, Ledger};
pub use member::{Contact, Member, NewMember, PaymentBadge, Status};
pub use roster::{filter, search, stats, MemberFilter, Roster, RosterStats};
pub use schedule::{monthly_fee, FeeSchedule, Rank, MAX_FEE};
