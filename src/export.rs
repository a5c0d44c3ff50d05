use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::ExportError;
use crate::member::Member;

pub const CSV_MIME_TYPE: &str = "text/csv";

const HEADERS: [&str; 10] = [
    "Serial No",
    "Membership No",
    "Full Name",
    "Rank",
    "Status",
    "CNIC",
    "WhatsApp",
    "Joining Date",
    "Fee Paid",
    "Fee Remaining",
];

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_row(member: &Member) -> String {
    let personal = &member.personal_data;
    let ledger = member.ledger();
    [
        member.serial_number().to_string(),
        quoted(member.membership_number()),
        quoted(&personal.full_name),
        quoted(personal.rank.title()),
        personal.status.to_string(),
        quoted(&personal.cnic),
        quoted(&personal.whatsapp),
        member.date_of_joining.format("%Y-%m-%d").to_string(),
        ledger.total_fee_paid().to_string(),
        ledger.fee_remaining().to_string(),
    ]
    .join(",")
}

/// Rows follow roster order.
pub fn to_csv<'a, I>(members: I) -> String
where
    I: IntoIterator<Item = &'a Member>,
{
    let mut lines = vec![HEADERS.join(",")];
    lines.extend(members.into_iter().map(csv_row));
    lines.join("\n")
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("employees_{}.csv", date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
    pub mime_type: &'static str,
}

impl CsvExport {
    pub fn build(members: &[Member], date: NaiveDate) -> Result<Self, ExportError> {
        if members.is_empty() {
            return Err(ExportError::EmptyRoster);
        }
        Ok(Self {
            file_name: export_file_name(date),
            content: to_csv(members),
            mime_type: CSV_MIME_TYPE,
        })
    }
}

pub fn write_export(dir: &Path, export: &CsvExport) -> Result<PathBuf, ExportError> {
    let path = dir.join(&export.file_name);
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, &export.content))
        .map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), bytes = export.content.len(), "roster exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BucketKind;
    use crate::member::{NewMember, Status};
    use crate::roster::Roster;
    use crate::schedule::Rank;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn roster() -> Roster {
        let mut roster = Roster::default();
        roster
            .add_member(
                NewMember {
                    full_name: "Khan, Asad".to_string(),
                    rank: Rank::LtColCol,
                    cnic: "35202-1234567-1".to_string(),
                    whatsapp: "03001234567".to_string(),
                    date_of_joining: Some(date(2012, 4, 2)),
                    ..NewMember::default()
                },
                date(2025, 1, 1),
            )
            .unwrap();
        roster
            .add_member(
                NewMember {
                    full_name: "Sana Tariq".to_string(),
                    rank: Rank::Brig,
                    status: Status::Retired,
                    date_of_joining: Some(date(2008, 11, 20)),
                    ..NewMember::default()
                },
                date(2025, 1, 1),
            )
            .unwrap();
        roster.set_fee_paid(2, BucketKind::Quarterly, true).unwrap();
        roster
    }

    fn parse_line(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        fields.push(current);
        fields
    }

    #[test]
    fn csv_has_header_and_rows_in_order() {
        let roster = roster();
        let csv = to_csv(roster.members());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Serial No,Membership No,Full Name,Rank,Status,CNIC,WhatsApp,Joining Date,Fee Paid,Fee Remaining"
        );
        assert_eq!(
            lines[1],
            "1,\"MEM0001\",\"Khan, Asad\",\"Lt Col/Col\",Serving,\"35202-1234567-1\",\"03001234567\",2012-04-02,0,30600"
        );
        assert_eq!(
            lines[2],
            "2,\"MEM0002\",\"Sana Tariq\",\"Brig\",Retired,\"\",\"\",2008-11-20,3600,33000"
        );
    }

    #[test]
    fn csv_round_trips_field_values() {
        let roster = roster();
        let csv = to_csv(roster.members());
        for (line, member) in csv.lines().skip(1).zip(roster.members()) {
            let fields = parse_line(line);
            assert_eq!(fields.len(), 10);
            assert_eq!(fields[0], member.serial_number().to_string());
            assert_eq!(fields[1], member.membership_number());
            assert_eq!(fields[2], member.full_name());
            assert_eq!(fields[3], member.rank().title());
            assert_eq!(fields[4], member.status().as_str());
            assert_eq!(fields[5], member.personal_data.cnic);
            assert_eq!(fields[6], member.personal_data.whatsapp);
            assert_eq!(fields[7], member.date_of_joining.to_string());
            assert_eq!(fields[8], member.ledger().total_fee_paid().to_string());
            assert_eq!(fields[9], member.ledger().fee_remaining().to_string());
        }
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let mut roster = roster();
        let mut member = roster.get(2).unwrap().clone();
        member.personal_data.full_name = "Sana \"Sunny\" Tariq".to_string();
        roster.update_member(member).unwrap();
        let csv = to_csv(roster.members());
        let last = csv.lines().last().unwrap();
        assert!(last.contains("\"Sana \"\"Sunny\"\" Tariq\""));
        assert_eq!(parse_line(last)[2], "Sana \"Sunny\" Tariq");
    }

    #[test]
    fn empty_roster_exports_header_only_but_build_refuses() {
        assert_eq!(to_csv(&Vec::<Member>::new()).lines().count(), 1);
        assert!(matches!(
            CsvExport::build(&[], date(2025, 1, 1)),
            Err(ExportError::EmptyRoster)
        ));
    }

    #[test]
    fn write_export_creates_named_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let roster = roster();
        let export = CsvExport::build(roster.members(), date(2026, 10, 19)).unwrap();
        assert_eq!(export.file_name, "employees_2026-10-19.csv");
        assert_eq!(export.mime_type, "text/csv");

        let target = dir.path().join("exports");
        let path = write_export(&target, &export).expect("write");
        assert_eq!(path, target.join("employees_2026-10-19.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), export.content);
    }
}
