//! Operator shell: a command-line front end over the roster store.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::db::{self, DuesConfig};
use crate::export::{self, CsvExport};
use crate::ledger::BucketKind;
use crate::member::{Contact, Member, NewMember, PaymentBadge, Status};
use crate::roster::{self, MemberFilter};
use crate::sample::{self, DEFAULT_ROSTER_SIZE};
use crate::schedule::{FeeSchedule, Rank};

#[derive(Parser)]
#[command(version, about = "Membership records and dues tracking")]
struct Cli {
    /// SQLite database holding the roster.
    #[arg(long, env = "MEMBERS_DB", default_value = "members.sqlite", global = true)]
    db: PathBuf,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill an empty database with a generated demo roster.
    Seed {
        #[arg(long, default_value_t = DEFAULT_ROSTER_SIZE)]
        count: u32,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },

    /// List members, optionally filtered.
    List {
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        rank: Option<Rank>,
        /// Only members with an outstanding balance.
        #[arg(long)]
        pending: bool,
        #[arg(long)]
        json: bool,
    },

    /// Search name, membership number, rank and CNIC.
    Search { query: String },

    /// Show one member with the full ledger.
    Show {
        id: u32,
        #[arg(long)]
        json: bool,
    },

    /// Roster totals.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Print the fee structure.
    Fees,

    /// Add a member. Rank and status default to a blank form.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "Lt/Capt/Maj")]
        rank: Rank,
        #[arg(long, default_value = "Serving")]
        status: Status,
        #[arg(long, default_value = "")]
        cnic: String,
        #[arg(long, default_value = "")]
        whatsapp: String,
        #[arg(long, default_value = "")]
        office_address: String,
        #[arg(long, default_value = "")]
        residence_address: String,
        #[arg(long, default_value = "")]
        appointment: String,
        #[arg(long, default_value = "")]
        assistant_name: String,
        #[arg(long, default_value = "")]
        assistant_contact: String,
        /// YYYY-MM-DD, defaults to today.
        #[arg(long)]
        joined: Option<NaiveDate>,
        #[arg(long)]
        left: Option<NaiveDate>,
    },

    /// Mark a fee bucket paid (registration, quarterly, six-month, nine-month, yearly).
    Pay { id: u32, bucket: BucketKind },

    /// Mark a fee bucket unpaid.
    Unpay { id: u32, bucket: BucketKind },

    /// Change rank; unpaid buckets are re-priced.
    SetRank { id: u32, rank: Rank },

    SetStatus { id: u32, status: Status },

    /// Record or clear the date of leaving.
    SetLeaving {
        id: u32,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show or update the dues configuration.
    Config {
        #[arg(long)]
        registration_fee: Option<i64>,
        #[arg(long)]
        default_monthly_fee: Option<i64>,
    },

    /// Write the roster as CSV.
    Export {
        #[arg(long, env = "MEMBERS_EXPORT_DIR", default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberView<'a> {
    #[serde(flatten)]
    member: &'a Member,
    membership_period: String,
    whole_fee_paid_till_joining: i64,
    badge: PaymentBadge,
}

impl<'a> MemberView<'a> {
    fn new(member: &'a Member, today: NaiveDate) -> Self {
        Self {
            member,
            membership_period: member.membership_period(today),
            whole_fee_paid_till_joining: member.whole_fee_paid_till_joining(today),
            badge: member.payment_badge(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_row(member: &Member) {
    let ledger = member.ledger();
    let badge = match member.payment_badge() {
        PaymentBadge::Cleared => "paid",
        PaymentBadge::Pending => "pending",
    };
    println!(
        "{} | {:<18} | {:<11} | {:<7} | paid: {:>7} | remaining: {:>7} [{}]",
        member.membership_number(),
        member.full_name(),
        member.rank().title(),
        member.status().as_str(),
        ledger.total_fee_paid(),
        ledger.fee_remaining(),
        badge,
    );
}

fn print_rows<'a>(members: impl IntoIterator<Item = &'a Member>) {
    let mut shown = 0;
    for member in members {
        print_row(member);
        shown += 1;
    }
    println!("\n{} member(s)", shown);
}

fn print_member(member: &Member, today: NaiveDate) {
    let personal = &member.personal_data;
    let ledger = member.ledger();
    println!("== {} ({}) ==", member.full_name(), member.membership_number());
    println!("serial no:      {}", member.serial_number());
    println!("personal no:    {}", personal.personal_number);
    println!("rank:           {}", personal.rank);
    println!("status:         {}", personal.status);
    println!("cnic:           {}", personal.cnic);
    println!("whatsapp:       {}", personal.whatsapp);
    println!("appointment:    {}", personal.appointment);
    println!("office:         {}", personal.office_address);
    println!("residence:      {}", personal.residence_address);
    println!(
        "assistant:      {} {}",
        personal.personal_assistant.name, personal.personal_assistant.contact
    );
    println!("joined:         {}", member.date_of_joining);
    match member.date_of_leaving {
        Some(left) => println!("left:           {}", left),
        None => println!("left:           -"),
    }
    println!("membership:     {}", member.membership_period(today));
    println!();
    for (kind, bucket) in ledger.buckets() {
        let state = if bucket.is_paid() { "PAID" } else { "pending" };
        println!("{:<14} {:>7}  {}", kind.label(), bucket.amount(), state);
    }
    println!("{:<14} {:>7}", "Total paid", ledger.total_fee_paid());
    println!("{:<14} {:>7}", "Remaining", ledger.fee_remaining());
    println!(
        "{:<14} {:>7}",
        "Paid × years",
        member.whole_fee_paid_till_joining(today)
    );
    println!("remarks:        {}", member.account_data.remarks);
}

fn print_fees(schedule: &FeeSchedule) {
    println!("Registration Fee: {}/- (One Time)\n", schedule.registration_fee());
    println!("{:<12} {:>11}", "Rank", "Monthly Fee");
    for rate in schedule.rates() {
        println!("{:<12} {:>9}/-", rate.rank.title(), rate.monthly_fee);
    }
    println!(
        "{:<12} {:>9}/-  (any other rank)",
        "default",
        schedule.default_monthly_fee()
    );
    println!("\n{:<12} {}", "Period", "Calculation");
    for period in schedule.periods() {
        println!("{:<12} {}", period.kind.label(), period.calculation);
    }
}

fn save_and_show(conn: &Connection, member: &Member, today: NaiveDate) -> Result<()> {
    db::save_member(conn, member)?;
    print_member(member, today);
    Ok(())
}

pub fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut conn = db::open_connection(&cli.db)
        .with_context(|| format!("opening {}", cli.db.display()))?;
    db::init_db(&conn).context("initialising schema")?;
    let today = Local::now().date_naive();

    match cli.cmd {
        Commands::Seed { count, seed } => {
            let existing = db::member_count(&conn)?;
            if existing > 0 {
                bail!("database already holds {} members; refusing to seed", existing);
            }
            let schedule = db::fetch_config(&conn)?.schedule()?;
            let roster = sample::generate_roster(count, seed, schedule, today)?;
            db::save_roster(&mut conn, &roster)?;
            println!("seeded {} members into {}", roster.len(), cli.db.display());
        }
        Commands::List {
            status,
            rank,
            pending,
            json,
        } => {
            let roster = db::load_roster(&conn)?;
            let members = roster::filter(
                roster.members(),
                &MemberFilter {
                    query: None,
                    status,
                    rank,
                    pending_only: pending,
                },
            );
            if json {
                let views: Vec<MemberView> =
                    members.into_iter().map(|m| MemberView::new(m, today)).collect();
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                print_rows(members);
            }
        }
        Commands::Search { query } => {
            let roster = db::load_roster(&conn)?;
            print_rows(roster::search(roster.members(), &query));
        }
        Commands::Show { id, json } => {
            let roster = db::load_roster(&conn)?;
            let member = roster
                .get(id)
                .with_context(|| format!("member {} not found", id))?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&MemberView::new(member, today))?
                );
            } else {
                print_member(member, today);
            }
        }
        Commands::Stats { json } => {
            let roster = db::load_roster(&conn)?;
            let stats = roster::stats(roster.members());
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("total members:    {}", stats.total);
                println!("serving:          {}", stats.serving);
                println!("retired:          {}", stats.retired);
                println!("pending payment:  {}", stats.pending_payment);
                println!("collected:        {}", stats.total_collected);
                println!("outstanding:      {}", stats.total_outstanding);
            }
        }
        Commands::Fees => {
            let schedule = db::fetch_config(&conn)?.schedule()?;
            print_fees(&schedule);
        }
        Commands::Add {
            name,
            rank,
            status,
            cnic,
            whatsapp,
            office_address,
            residence_address,
            appointment,
            assistant_name,
            assistant_contact,
            joined,
            left,
        } => {
            let mut roster = db::load_roster(&conn)?;
            let draft = NewMember {
                full_name: name,
                rank,
                status,
                cnic,
                whatsapp,
                office_address,
                residence_address,
                appointment,
                personal_assistant: Contact {
                    name: assistant_name,
                    contact: assistant_contact,
                },
                card_receiver: Contact::default(),
                date_of_joining: joined,
                date_of_leaving: left,
            };
            let member = roster.add_member(draft, today)?;
            save_and_show(&conn, member, today)?;
        }
        Commands::Pay { id, bucket } => {
            let mut roster = db::load_roster(&conn)?;
            let member = roster.set_fee_paid(id, bucket, true)?;
            save_and_show(&conn, member, today)?;
        }
        Commands::Unpay { id, bucket } => {
            let mut roster = db::load_roster(&conn)?;
            let member = roster.set_fee_paid(id, bucket, false)?;
            save_and_show(&conn, member, today)?;
        }
        Commands::SetRank { id, rank } => {
            let mut roster = db::load_roster(&conn)?;
            let member = roster.change_rank(id, rank)?;
            save_and_show(&conn, member, today)?;
        }
        Commands::SetStatus { id, status } => {
            let mut roster = db::load_roster(&conn)?;
            let member = roster.change_status(id, status)?;
            save_and_show(&conn, member, today)?;
        }
        Commands::SetLeaving { id, date } => {
            let mut roster = db::load_roster(&conn)?;
            let mut edited = roster
                .get(id)
                .cloned()
                .with_context(|| format!("member {} not found", id))?;
            edited.date_of_leaving = date;
            let member = roster.update_member(edited)?;
            save_and_show(&conn, member, today)?;
        }
        Commands::Config {
            registration_fee,
            default_monthly_fee,
        } => {
            let current = db::fetch_config(&conn)?;
            let config = if registration_fee.is_none() && default_monthly_fee.is_none() {
                current
            } else {
                db::update_config(
                    &conn,
                    DuesConfig {
                        registration_fee: registration_fee.unwrap_or(current.registration_fee),
                        default_monthly_fee: default_monthly_fee
                            .unwrap_or(current.default_monthly_fee),
                    },
                )?
            };
            println!("registration fee:     {}", config.registration_fee);
            println!("default monthly fee:  {}", config.default_monthly_fee);
        }
        Commands::Export { out_dir } => {
            let roster = db::load_roster(&conn)?;
            let csv = CsvExport::build(roster.members(), today)?;
            let path = export::write_export(&out_dir, &csv)?;
            info!(mime_type = csv.mime_type, "export ready to share");
            println!("Export complete: {} members saved as {}", roster.len(), path.display());
        }
    }

    Ok(())
}
