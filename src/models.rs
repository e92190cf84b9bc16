use serde::Serialize;
use serde_json::Value;

use crate::duration;

/// One watch-time observation for a student in a course.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchRecord {
    pub email: String,
    pub full_name: String,
    pub course: String,
    pub watched_ms: u64,
    pub last_updated: String,
    pub days_since_update: Option<i64>,
}

/// Something keyed by a student's email.
pub trait StudentKeyed {
    fn email(&self) -> &str;
}

impl StudentKeyed for WatchRecord {
    fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentCourseTotal {
    pub full_name: String,
    pub course: String,
    pub email: String,
    pub watched_ms: u64,
    pub days_since_update: Option<i64>,
    pub last_updated: String,
}

impl StudentCourseTotal {
    pub fn watched_seconds(&self) -> u64 {
        self.watched_ms / 1000
    }

    pub fn formatted_total(&self) -> String {
        duration::seconds_to_time(self.watched_seconds())
    }
}

impl StudentKeyed for StudentCourseTotal {
    fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentTotal {
    pub full_name: String,
    pub email: String,
    pub watched_ms: u64,
    pub days_since_update: Option<i64>,
    pub last_updated: String,
}

impl StudentTotal {
    pub fn formatted_total(&self) -> String {
        duration::seconds_to_time(self.watched_ms / 1000)
    }
}

impl StudentKeyed for StudentTotal {
    fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseProgress {
    pub total: StudentCourseTotal,
    /// Percentage of the course watched, in [0, 100] with two decimals.
    pub progress: f64,
}

impl StudentKeyed for CourseProgress {
    fn email(&self) -> &str {
        &self.total.email
    }
}

/// Enrollment reference data. Code and status are passed through as the
/// enrollment API sent them; `Value::Null` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRecord {
    pub email: String,
    pub registration_code: Value,
    pub status: Value,
}

/// An aggregate row after the enrollment join.
#[derive(Debug, Clone, PartialEq)]
pub struct Enriched<T> {
    pub record: T,
    pub registration_code: Value,
    pub status: Value,
}

impl<T> Enriched<T> {
    pub fn bare(record: T) -> Self {
        Self {
            record,
            registration_code: Value::Null,
            status: Value::Null,
        }
    }
}

impl<T: StudentKeyed> StudentKeyed for Enriched<T> {
    fn email(&self) -> &str {
        self.record.email()
    }
}

/// Nulls go out as `0`, which is what the destination API stores for
/// students without an enrollment.
fn or_zero(value: &Value) -> Value {
    match value {
        Value::Null => Value::from(0),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentCourseRow {
    #[serde(rename = "Nome Completo")]
    pub full_name: String,
    #[serde(rename = "Curso")]
    pub course: String,
    #[serde(rename = "Email")]
    pub email: String,
    pub tempo_total_formatado: String,
    pub updated_at: String,
    pub registration_code: Value,
    pub status: Value,
}

impl From<&Enriched<StudentCourseTotal>> for StudentCourseRow {
    fn from(row: &Enriched<StudentCourseTotal>) -> Self {
        Self {
            full_name: row.record.full_name.clone(),
            course: row.record.course.clone(),
            email: row.record.email.clone(),
            tempo_total_formatado: row.record.formatted_total(),
            updated_at: row.record.last_updated.clone(),
            registration_code: or_zero(&row.registration_code),
            status: or_zero(&row.status),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    #[serde(rename = "Nome Completo")]
    pub full_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    pub tempo_total_formatado: String,
    pub updated_at: String,
    pub registration_code: Value,
    pub status: Value,
}

impl From<&Enriched<StudentTotal>> for StudentRow {
    fn from(row: &Enriched<StudentTotal>) -> Self {
        Self {
            full_name: row.record.full_name.clone(),
            email: row.record.email.clone(),
            tempo_total_formatado: row.record.formatted_total(),
            updated_at: row.record.last_updated.clone(),
            registration_code: or_zero(&row.registration_code),
            status: or_zero(&row.status),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressRow {
    #[serde(rename = "Curso")]
    pub course: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Nome Completo")]
    pub full_name: String,
    pub progresso: f64,
    pub registration_code: Value,
    pub status: Value,
    pub tempo_total_formatado: String,
    pub updated_at: String,
}

impl From<&Enriched<CourseProgress>> for ProgressRow {
    fn from(row: &Enriched<CourseProgress>) -> Self {
        let total = &row.record.total;
        Self {
            course: total.course.clone(),
            email: total.email.clone(),
            full_name: total.full_name.clone(),
            progresso: row.record.progress,
            registration_code: or_zero(&row.registration_code),
            status: or_zero(&row.status),
            tempo_total_formatado: total.formatted_total(),
            updated_at: total.last_updated.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_total() -> StudentCourseTotal {
        StudentCourseTotal {
            full_name: "Ana Souza".to_string(),
            course: "Python".to_string(),
            email: "ana@pditabira.com".to_string(),
            watched_ms: 5_400_999,
            days_since_update: Some(3),
            last_updated: "2025-03-01T10:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn missing_enrollment_serializes_as_zero() {
        let row = StudentCourseRow::from(&Enriched::bare(sample_total()));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["registration_code"], Value::from(0));
        assert_eq!(json["status"], Value::from(0));
        assert_eq!(json["tempo_total_formatado"], "01:30:00");
        assert_eq!(json["Nome Completo"], "Ana Souza");
        assert!(json.get("dias_sem_acesso").is_none());
    }

    #[test]
    fn progress_row_keeps_destination_column_order() {
        let enriched = Enriched {
            record: CourseProgress {
                total: sample_total(),
                progress: 9.56,
            },
            registration_code: Value::from("PD-1"),
            status: Value::Null,
        };
        let text = serde_json::to_string(&ProgressRow::from(&enriched)).unwrap();
        let curso = text.find("\"Curso\"").unwrap();
        let progresso = text.find("\"progresso\"").unwrap();
        let updated = text.find("\"updated_at\"").unwrap();
        assert!(curso < progresso && progresso < updated);
        assert!(text.contains("\"registration_code\":\"PD-1\""));
        assert!(text.contains("\"status\":0"));
    }

    #[test]
    fn numeric_registration_codes_pass_through() {
        let enriched = Enriched {
            record: sample_total(),
            registration_code: Value::from(12345),
            status: Value::from("ativo"),
        };
        let json = serde_json::to_value(StudentCourseRow::from(&enriched)).unwrap();
        assert_eq!(json["registration_code"], Value::from(12345));
        assert_eq!(json["status"], "ativo");
    }
}
