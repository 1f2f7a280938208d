use std::str::FromStr;
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

use logsift_types::{FailureReason, LogRecord};

/// Combined access-log line: ip, ident, user, [date], "request", status, size, "referrer", "agent"
static COMBINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\S+) \S+ \S+ \[(.*?)\] "(.*?)" (\S+) (\S+) "(.*?)" "(.*?)""#)
        .expect("combined log pattern is valid")
});

/// Date layout inside the brackets, e.g. `10/Oct/2023:13:55:36 +0000`
const DATE_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Layout of a normalized timestamp, e.g. `2023-10-10T13:55:36+00:00`
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Result of parsing one line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The line matched and every field converted
    Matched(LogRecord),
    /// The line does not fit the grammar
    NoMatch,
    /// The line matched but a numeric field is not an integer
    FieldConversion { field: &'static str, value: String },
}

impl ParseOutcome {
    /// Split into the record or the reason it was rejected
    pub fn into_result(self) -> Result<LogRecord, FailureReason> {
        match self {
            Self::Matched(record) => Ok(record),
            Self::NoMatch => Err(FailureReason::NoMatch),
            Self::FieldConversion { field, value } => {
                Err(FailureReason::FieldConversion { field, value })
            }
        }
    }
}

/// Parser for combined-format access-log lines
pub struct LineParser;

impl LineParser {
    /// Parse a raw log line
    pub fn parse(raw: &str) -> ParseOutcome {
        let Some(caps) = COMBINED.captures(raw) else {
            return ParseOutcome::NoMatch;
        };
        // Groups 1..=7 always participate once the pattern matches
        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        let status = match parse_number::<u32>("status", group(4)) {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };
        let size = match parse_number::<u64>("size", group(5)) {
            Ok(v) => v,
            Err(outcome) => return outcome,
        };

        let (method, url) = Self::split_request(group(3));
        let user_agent = match group(7) {
            "-" => None,
            agent => Some(agent.to_string()),
        };

        ParseOutcome::Matched(LogRecord::new(
            group(1).to_string(),
            Self::normalize_timestamp(group(2)),
            method,
            url,
            status,
            size,
            user_agent,
        ))
    }

    /// Convert an access-log date to ISO-8601, keeping the raw text if it does not parse
    pub fn normalize_timestamp(raw: &str) -> String {
        match DateTime::parse_from_str(raw, DATE_FORMAT) {
            Ok(dt) => dt.format(ISO_FORMAT).to_string(),
            Err(_) => raw.to_string(),
        }
    }

    /// Method and URL from a request line; missing tokens become empty strings
    fn split_request(request: &str) -> (String, String) {
        let mut tokens = request.split_whitespace();
        let method = tokens.next().unwrap_or_default().to_string();
        let url = tokens.next().unwrap_or_default().to_string();
        (method, url)
    }
}

fn parse_number<T: FromStr>(field: &'static str, text: &str) -> Result<T, ParseOutcome> {
    text.parse::<T>().map_err(|_| ParseOutcome::FieldConversion {
        field,
        value: text.to_string(),
    })
}
