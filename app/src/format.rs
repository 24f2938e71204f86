//! Display formatting for currency and kick-off times.

use chrono::{DateTime, Utc};

use crate::types::Money;

/// Format an amount for display, e.g. `KSh 2,500`.
#[must_use]
pub fn format_currency(amount: Money) -> String {
    amount.to_string()
}

/// Format a kick-off time for display, e.g. `Sun 01 Jun 2025, 15:00`.
#[must_use]
pub fn format_date(when: DateTime<Utc>) -> String {
    when.format("%a %d %b %Y, %H:%M").to_string()
}
