/// E-mail: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("E-mail is required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("E-mail must be at most 254 characters".to_string());
    }
    if !trimmed.contains('@') || !trimmed.contains('.') {
        return Some("E-mail must be a valid address (contain '@' and '.')".to_string());
    }
    None
}

/// Display name: 1-100 chars.
pub fn validate_name(name: &str) -> Option<String> {
    validate_required(name, "Name", 100)
}

/// Password: min 8 chars.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.chars().count() < 8 {
        return Some("Password must be at least 8 characters".to_string());
    }
    None
}

pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Every sign-up problem, in form order.
pub fn validate_signup(email: &str, name: &str, password: &str) -> Vec<String> {
    [validate_email(email), validate_name(name), validate_password(password)]
        .into_iter()
        .flatten()
        .collect()
}
