use crate::error::{MailerError, Result};

/// Basic email validation
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(MailerError::InvalidEmail("Email is empty".to_string()));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(MailerError::InvalidEmail(format!(
            "Email must not contain whitespace: {}",
            email
        )));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(MailerError::InvalidEmail(format!(
            "Invalid email format: {}",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(MailerError::InvalidEmail(format!(
            "Email parts cannot be empty: {}",
            email
        )));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(MailerError::InvalidEmail(format!(
            "Invalid domain in {}",
            email
        )));
    }

    Ok(())
}

/// Domain part of an address, used to qualify generated Message-IDs
pub fn email_domain(email: &str) -> Option<&str> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}
