use std::{fs, path::Path};

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MemberError, Result};
use crate::member::Member;
use crate::roster::Roster;
use crate::schedule::{FeeSchedule, DEFAULT_MONTHLY_FEE, MAX_FEE, REGISTRATION_FEE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuesConfig {
    pub registration_fee: i64,
    pub default_monthly_fee: i64,
}

impl DuesConfig {
    pub fn schedule(&self) -> Result<FeeSchedule> {
        FeeSchedule::new(self.registration_fee, self.default_monthly_fee)
    }
}

pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(Connection::open(path)?)
}

const MEMBERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS members (
  id INTEGER PRIMARY KEY,
  membership_number TEXT NOT NULL UNIQUE,
  record TEXT NOT NULL,
  updated_ts_utc INTEGER NOT NULL DEFAULT 0
);";

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(MEMBERS_TABLE)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS config (
          id INTEGER PRIMARY KEY CHECK (id = 1),
          registration_fee INTEGER NOT NULL,
          default_monthly_fee INTEGER NOT NULL,
          created_ts_utc INTEGER NOT NULL,
          updated_ts_utc INTEGER NOT NULL
        );",
    )?;

    ensure_config_row(conn)?;
    ensure_member_columns(conn)?;
    Ok(())
}

fn ensure_config_row(conn: &Connection) -> Result<()> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM config", [], |row| row.get(0))?;
    if existing == 0 {
        conn.execute(
            "INSERT INTO config (id, registration_fee, default_monthly_fee, created_ts_utc, updated_ts_utc)
             VALUES (1, ?1, ?2, ?3, ?3)",
            params![
                REGISTRATION_FEE,
                DEFAULT_MONTHLY_FEE,
                Utc::now().timestamp_millis()
            ],
        )?;
    }
    Ok(())
}

// Databases created before members carried a timestamp.
fn ensure_member_columns(conn: &Connection) -> Result<()> {
    if !table_has_column(conn, "members", "updated_ts_utc")? {
        conn.execute(
            "ALTER TABLE members ADD COLUMN updated_ts_utc INTEGER NOT NULL DEFAULT 0",
            [],
        )?;
    }
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn fetch_config(conn: &Connection) -> Result<DuesConfig> {
    let config = conn.query_row(
        "SELECT registration_fee, default_monthly_fee FROM config WHERE id = 1",
        [],
        |row| {
            Ok(DuesConfig {
                registration_fee: row.get(0)?,
                default_monthly_fee: row.get(1)?,
            })
        },
    )?;
    Ok(config)
}

pub fn update_config(conn: &Connection, payload: DuesConfig) -> Result<DuesConfig> {
    if payload.registration_fee < 0 {
        return Err(MemberError::InvalidConfig(
            "registration_fee must be >= 0".to_string(),
        ));
    }
    if payload.default_monthly_fee < 1 {
        return Err(MemberError::InvalidConfig(
            "default_monthly_fee must be >= 1".to_string(),
        ));
    }
    if payload.registration_fee > MAX_FEE || payload.default_monthly_fee > MAX_FEE {
        return Err(MemberError::InvalidConfig(format!("fees must be <= {}", MAX_FEE)));
    }

    conn.execute(
        "UPDATE config SET registration_fee = ?1, default_monthly_fee = ?2, updated_ts_utc = ?3 WHERE id = 1",
        params![
            payload.registration_fee,
            payload.default_monthly_fee,
            Utc::now().timestamp_millis()
        ],
    )?;
    info!(
        registration_fee = payload.registration_fee,
        default_monthly_fee = payload.default_monthly_fee,
        "dues config updated"
    );

    fetch_config(conn)
}

pub fn save_member(conn: &Connection, member: &Member) -> Result<()> {
    let record = serde_json::to_string(member)?;
    conn.execute(
        "INSERT INTO members (id, membership_number, record, updated_ts_utc) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           membership_number = excluded.membership_number,
           record = excluded.record,
           updated_ts_utc = excluded.updated_ts_utc",
        params![
            member.id(),
            member.membership_number(),
            record,
            Utc::now().timestamp_millis()
        ],
    )?;
    debug!(id = member.id(), "member saved");
    Ok(())
}

pub fn save_roster(conn: &mut Connection, roster: &Roster) -> Result<()> {
    let tx = conn.transaction()?;
    for member in roster.members() {
        save_member(&tx, member)?;
    }
    tx.commit()?;
    info!(count = roster.len(), "roster saved");
    Ok(())
}

pub fn member_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?)
}

pub fn load_roster(conn: &Connection) -> Result<Roster> {
    let schedule = fetch_config(conn)?.schedule()?;
    let mut stmt = conn.prepare("SELECT record FROM members ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut members = Vec::new();
    for row in rows {
        members.push(serde_json::from_str::<Member>(&row?)?);
    }

    debug!(count = members.len(), "roster loaded");
    Roster::from_members(schedule, members)
}
