use std::env;

use anyhow::Context;

pub const DESTINATION_STUDENT_COURSE: &str = "/api/tempo_por_aluno_e_curso";
pub const DESTINATION_STUDENT: &str = "/api/tempo_por_aluno";
pub const DESTINATION_PROGRESS: &str = "/api/progresso_por_curso";

/// Time range passed to the reporting API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindow {
    pub from_completed: String,
    pub to_completed: String,
    pub from_updated: String,
    pub to_updated: String,
}

impl ReportWindow {
    pub fn query(&self) -> [(&'static str, &str); 4] {
        [
            ("fromCompleted", self.from_completed.as_str()),
            ("toCompleted", self.to_completed.as_str()),
            ("fromUpdated", self.from_updated.as_str()),
            ("toUpdated", self.to_updated.as_str()),
        ]
    }
}

impl Default for ReportWindow {
    fn default() -> Self {
        Self {
            from_completed: "2024-12-01T03:00:00.000Z".to_string(),
            to_completed: "2026-01-01T02:59:59.000Z".to_string(),
            from_updated: "2024-12-01T03:00:00.000Z".to_string(),
            to_updated: "2026-01-01".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub report_url: String,
    pub window: ReportWindow,
    pub enrollment_url: String,
    pub enrollment_api_key: Option<String>,
    pub destination_base_url: String,
    pub allowed_domains: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_url: "https://presence.projetodesenvolve.online/watchtime".to_string(),
            window: ReportWindow::default(),
            enrollment_url: "https://form.pdinfinita.com.br/enrolled".to_string(),
            enrollment_api_key: None,
            destination_base_url: "http://127.0.0.1:5000".to_string(),
            allowed_domains: vec![
                "pditabira.com".to_string(),
                "pdbomdespacho.com.br".to_string(),
            ],
        }
    }
}

impl Config {
    /// Defaults overridden by whatever is set in the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Config::default();

        if let Some(url) = lookup("WATCHTIME_REPORT_URL") {
            config.report_url = url;
        }
        if let Some(value) = lookup("WATCHTIME_FROM_COMPLETED") {
            config.window.from_completed = value;
        }
        if let Some(value) = lookup("WATCHTIME_TO_COMPLETED") {
            config.window.to_completed = value;
        }
        if let Some(value) = lookup("WATCHTIME_FROM_UPDATED") {
            config.window.from_updated = value;
        }
        if let Some(value) = lookup("WATCHTIME_TO_UPDATED") {
            config.window.to_updated = value;
        }
        if let Some(url) = lookup("ENROLLMENT_URL") {
            config.enrollment_url = url;
        }
        config.enrollment_api_key = lookup("ENROLLMENT_API_KEY").filter(|key| !key.is_empty());
        if let Some(url) = lookup("DESTINATION_BASE_URL") {
            config.destination_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(list) = lookup("ALLOWED_EMAIL_DOMAINS") {
            let domains: Vec<String> = list
                .split(',')
                .map(|d| d.trim().trim_start_matches('@').to_string())
                .filter(|d| !d.is_empty())
                .collect();
            anyhow::ensure!(
                !domains.is_empty(),
                "ALLOWED_EMAIL_DOMAINS must list at least one domain"
            );
            config.allowed_domains = domains;
        }

        reqwest::Url::parse(&config.report_url).context("WATCHTIME_REPORT_URL is not a valid URL")?;
        reqwest::Url::parse(&config.enrollment_url).context("ENROLLMENT_URL is not a valid URL")?;
        reqwest::Url::parse(&config.destination_base_url)
            .context("DESTINATION_BASE_URL is not a valid URL")?;

        Ok(config)
    }

    pub fn destination(&self, path: &str) -> String {
        format!("{}{}", self.destination_base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_production_endpoints() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(
            config.destination(DESTINATION_STUDENT),
            "http://127.0.0.1:5000/api/tempo_por_aluno"
        );
        assert_eq!(config.allowed_domains.len(), 2);
        assert!(config.enrollment_api_key.is_none());
        assert_eq!(config.window.query()[3], ("toUpdated", "2026-01-01"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DESTINATION_BASE_URL", "http://localhost:8080/"),
            ("ENROLLMENT_API_KEY", "secret"),
            ("ALLOWED_EMAIL_DOMAINS", "@a.org, b.net"),
        ]))
        .unwrap();
        assert_eq!(
            config.destination(DESTINATION_PROGRESS),
            "http://localhost:8080/api/progresso_por_curso"
        );
        assert_eq!(config.enrollment_api_key.as_deref(), Some("secret"));
        assert_eq!(config.allowed_domains, vec!["a.org", "b.net"]);
    }

    #[test]
    fn rejects_empty_domain_list_and_bad_urls() {
        assert!(Config::from_lookup(lookup_from(&[("ALLOWED_EMAIL_DOMAINS", " , ")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ENROLLMENT_URL", "not a url")])).is_err());
    }
}
