use crate::models::StudentKeyed;

/// True when `email` ends in `@<domain>` for one of `domains`.
pub fn is_allowed_email(email: &str, domains: &[String]) -> bool {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domains.iter().any(|allowed| allowed == domain))
        .unwrap_or(false)
}

pub fn retain_allowed<T: StudentKeyed>(rows: Vec<T>, domains: &[String]) -> Vec<T> {
    rows.into_iter()
        .filter(|row| is_allowed_email(row.email(), domains))
        .collect()
}
