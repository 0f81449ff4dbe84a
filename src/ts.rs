use crate::error::CliError;
use crate::model::Timestamp;

/// RFC3339 with offset. The offset decides which calendar day the instant lands on.
pub fn parse_timestamp(ts: &str, label: &str) -> Result<Timestamp, CliError> {
    let t = ts.trim();
    if t.is_empty() {
        return Err(CliError::usage(format!("Invalid {}: (empty)", label)));
    }
    chrono::DateTime::parse_from_rfc3339(t)
        .map_err(|_| CliError::usage(format!("Invalid {}: {}", label, ts)))
}

pub fn system_now() -> Timestamp {
    chrono::Local::now().fixed_offset()
}
