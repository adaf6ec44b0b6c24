//! CSV export shapes.
//!
//! One flat document per record kind: a fixed header row, then one row per
//! record. Every field is quoted and embedded quotes are doubled, which is
//! all the escaping a spreadsheet import needs here.
use crate::records::{ContactSubmission, EmailSignup, Record, SiteVisit};

/// How a record kind flattens into the download the dashboard offers.
pub trait CsvExport: Record {
    const HEADER: &'static str;
    const FILENAME: &'static str;
    const EMPTY_MESSAGE: &'static str;

    fn row(&self) -> String;
}

pub fn escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn to_csv<R: CsvExport>(records: &[R]) -> String {
    let mut csv = String::from(R::HEADER);
    csv.push('\n');

    for record in records {
        csv.push_str(&record.row());
        csv.push('\n');
    }

    csv
}

impl CsvExport for ContactSubmission {
    const HEADER: &'static str = "Timestamp,Name,Email,Message";
    const FILENAME: &'static str = "contact-submissions.csv";
    const EMPTY_MESSAGE: &'static str = "No contact submissions found";

    fn row(&self) -> String {
        [
            self.timestamp.as_str(),
            &self.name,
            &self.email,
            &self.message,
        ]
        .map(escape)
        .join(",")
    }
}

impl CsvExport for EmailSignup {
    const HEADER: &'static str = "Timestamp,Email";
    const FILENAME: &'static str = "email-signups.csv";
    const EMPTY_MESSAGE: &'static str = "No email signups found";

    fn row(&self) -> String {
        [self.timestamp.as_str(), &self.email].map(escape).join(",")
    }
}

impl CsvExport for SiteVisit {
    const HEADER: &'static str = "Timestamp,Page,Referrer,UserAgent";
    const FILENAME: &'static str = "site-visits.csv";
    const EMPTY_MESSAGE: &'static str = "No site visits found";

    fn row(&self) -> String {
        [
            self.timestamp.as_str(),
            &self.page,
            &self.referrer,
            &self.user_agent,
        ]
        .map(escape)
        .join(",")
    }
}
