use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Trimmed length must land in [2, 100] characters.
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < 2 {
        return Err("Name must be at least 2 characters long".to_string());
    }
    if len > 100 {
        return Err("Name must be less than 100 characters".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// YYYY-MM-DD, not in the future, implied age at most 150 years.
pub fn validate_date_of_birth(date: &str) -> Result<(), String> {
    if date.is_empty() {
        return Err("Date of birth is required".to_string());
    }
    let birth = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD".to_string())?;
    let today = Local::now().date_naive();
    if birth > today {
        return Err("Date of birth cannot be in the future".to_string());
    }
    let age = (today - birth).num_days() / 365;
    if age > 150 {
        return Err("Invalid birth date (too old)".to_string());
    }
    Ok(())
}

/// Combined check in name -> email -> date order; the first failure wins.
pub fn validate_registration(name: &str, email: &str, date: &str) -> Result<(), String> {
    validate_name(name)?;
    validate_email(email)?;
    validate_date_of_birth(date)?;
    Ok(())
}
