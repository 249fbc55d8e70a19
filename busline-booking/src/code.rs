use chrono::NaiveDate;

pub const DEFAULT_PREFIX: &str = "BK";

/// Booking references: `<prefix><yyMMdd><daily sequence, 4+ digits>`.
#[derive(Debug, Clone)]
pub struct BookingCodeGenerator {
    prefix: String,
}

impl BookingCodeGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim().to_uppercase(),
        }
    }

    pub fn format(&self, day: NaiveDate, sequence: u32) -> String {
        format!("{}{}{:04}", self.prefix, day.format("%y%m%d"), sequence)
    }
}

impl Default for BookingCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
