use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::queue::DeliveryError;

/// Canonical recipient handle: `<country code><last 10 digits>@<domain>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Strips all non-digit characters, keeps the last 10 digits, prefixes the
/// default country code and appends the gateway's address domain. Fewer
/// than 10 digits is an invalid number, never a silent truncation.
pub fn normalize_address(
    raw: &str,
    country_code: &str,
    domain: &str,
) -> Result<Address, DeliveryError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 10 {
        return Err(DeliveryError::InvalidPhoneNumber);
    }

    let local = &digits[digits.len() - 10..];

    Ok(Address(format!("{}{}@{}", country_code, local, domain)))
}
