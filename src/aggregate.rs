use std::collections::{BTreeMap, BTreeSet};

use crate::duration;
use crate::models::{CourseProgress, StudentCourseTotal, StudentTotal, WatchRecord};

/// Maximum watch time per known course, as `HH:MM:SS`.
pub const COURSE_DURATIONS: [(&str, &str); 11] = [
    ("Linux", "06:49:11"),
    ("Scratch", "03:12:21"),
    ("Introdução a Web", "12:28:23"),
    ("No Code", "05:36:37"),
    ("Python", "15:41:33"),
    ("JavaScript", "09:32:53"),
    ("Programação Orientada a Objetos", "09:03:40"),
    ("Programação Intermediária com Python - Python II", "12:57:25"),
    ("Banco de Dados", "07:15:00"),
    ("Projetos II", "01:40:58"),
    ("Tutorial Plataforma", "01:00:00"),
];

pub fn course_max_seconds(course: &str) -> Option<u64> {
    COURSE_DURATIONS
        .iter()
        .find(|(name, _)| *name == course)
        .and_then(|(_, max)| duration::time_to_seconds(max))
}

#[derive(Debug, Clone, Default)]
struct Totals {
    watched_ms: u64,
    days_since_update: Option<i64>,
    last_updated: Option<String>,
}

impl Totals {
    fn add(&mut self, record: &WatchRecord) {
        self.watched_ms = self.watched_ms.saturating_add(record.watched_ms);
        self.days_since_update = match (self.days_since_update, record.days_since_update) {
            (Some(current), Some(days)) => Some(current.min(days)),
            (current, days) => current.or(days),
        };
        if self
            .last_updated
            .as_deref()
            .map_or(true, |current| record.last_updated.as_str() > current)
        {
            self.last_updated = Some(record.last_updated.clone());
        }
    }
}

fn group<K: Ord>(records: &[WatchRecord], key: impl Fn(&WatchRecord) -> K) -> BTreeMap<K, Totals> {
    let mut groups: BTreeMap<K, Totals> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().add(record);
    }
    groups
}

/// Groups by (name, course, email), sorted by that key.
pub fn group_by_student_course(records: &[WatchRecord]) -> Vec<StudentCourseTotal> {
    group(records, |r| {
        (r.full_name.clone(), r.course.clone(), r.email.clone())
    })
    .into_iter()
    .map(|((full_name, course, email), totals)| StudentCourseTotal {
        full_name,
        course,
        email,
        watched_ms: totals.watched_ms,
        days_since_update: totals.days_since_update,
        last_updated: totals.last_updated.unwrap_or_default(),
    })
    .collect()
}

/// Groups by (name, email), sorted by that key.
pub fn group_by_student(records: &[WatchRecord]) -> Vec<StudentTotal> {
    group(records, |r| (r.full_name.clone(), r.email.clone()))
        .into_iter()
        .map(|((full_name, email), totals)| StudentTotal {
            full_name,
            email,
            watched_ms: totals.watched_ms,
            days_since_update: totals.days_since_update,
            last_updated: totals.last_updated.unwrap_or_default(),
        })
        .collect()
}

pub fn progress_percent(watched_seconds: u64, course: &str) -> f64 {
    match course_max_seconds(course) {
        Some(max) if max > 0 => {
            let ratio = (watched_seconds as f64 / max as f64).min(1.0);
            (ratio * 100.0 * 100.0).round() / 100.0
        }
        _ => 0.0,
    }
}

pub fn course_progress(totals: &[StudentCourseTotal]) -> Vec<CourseProgress> {
    let unknown: BTreeSet<&str> = totals
        .iter()
        .map(|t| t.course.as_str())
        .filter(|course| course_max_seconds(course).is_none())
        .collect();
    for course in unknown {
        tracing::warn!(course = %course, "Course has no known duration, progress reported as 0");
    }

    totals
        .iter()
        .map(|total| CourseProgress {
            progress: progress_percent(total.watched_seconds(), &total.course),
            total: total.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, course: &str, ms: u64, days: Option<i64>, updated: &str) -> WatchRecord {
        WatchRecord {
            email: format!("{}@pditabira.com", name.to_lowercase()),
            full_name: name.to_string(),
            course: course.to_string(),
            watched_ms: ms,
            last_updated: updated.to_string(),
            days_since_update: days,
        }
    }

    fn sample() -> Vec<WatchRecord> {
        vec![
            record("Ana", "Python", 1_800_000, Some(10), "2025-05-01T10:00:00.000Z"),
            record("Ana", "Python", 3_600_000, Some(4), "2025-06-01T10:00:00.000Z"),
            record("Ana", "Linux", 600_000, None, "2025-04-01T10:00:00.000Z"),
            record("Bia", "Scratch", 20_000_000, Some(120), "2025-01-01T10:00:00.000Z"),
            record("Bia", "Robótica", 1_000, None, "2025-02-01T10:00:00.000Z"),
        ]
    }

    #[test]
    fn course_table_converts_to_seconds() {
        assert_eq!(course_max_seconds("Python"), Some(56_493));
        assert_eq!(course_max_seconds("Tutorial Plataforma"), Some(3600));
        assert_eq!(course_max_seconds("Robótica"), None);
        for (name, _) in COURSE_DURATIONS {
            assert!(course_max_seconds(name).is_some());
        }
    }

    #[test]
    fn sums_and_formats_per_student_and_course() {
        let totals = group_by_student_course(&sample());
        let python = totals
            .iter()
            .find(|t| t.full_name == "Ana" && t.course == "Python")
            .unwrap();
        assert_eq!(python.watched_seconds(), 5400);
        assert_eq!(python.formatted_total(), "01:30:00");
        assert_eq!(python.days_since_update, Some(4));
        assert_eq!(python.last_updated, "2025-06-01T10:00:00.000Z");

        let linux = totals.iter().find(|t| t.course == "Linux").unwrap();
        assert_eq!(linux.days_since_update, None);
    }

    #[test]
    fn student_view_merges_courses() {
        let totals = group_by_student(&sample());
        assert_eq!(totals.len(), 2);
        let ana = &totals[0];
        assert_eq!(ana.full_name, "Ana");
        assert_eq!(ana.watched_ms, 6_000_000);
        assert_eq!(ana.formatted_total(), "01:40:00");
        assert_eq!(ana.days_since_update, Some(4));
        assert_eq!(ana.last_updated, "2025-06-01T10:00:00.000Z");
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = sample();
        let mut reversed = sample();
        reversed.reverse();
        let mut rotated = sample();
        rotated.rotate_left(2);

        for shuffled in [reversed, rotated] {
            assert_eq!(group_by_student_course(&forward), group_by_student_course(&shuffled));
            assert_eq!(group_by_student(&forward), group_by_student(&shuffled));
        }
    }

    #[test]
    fn progress_matches_reference_scenario() {
        let totals = group_by_student_course(&sample());
        let progress = course_progress(&totals);
        let python = progress.iter().find(|p| p.total.course == "Python").unwrap();
        assert_eq!(python.progress, 9.56);
    }

    #[test]
    fn progress_is_capped_and_unknown_courses_are_zero() {
        let progress = course_progress(&group_by_student_course(&sample()));
        let scratch = progress.iter().find(|p| p.total.course == "Scratch").unwrap();
        assert_eq!(scratch.progress, 100.0);
        let unknown = progress.iter().find(|p| p.total.course == "Robótica").unwrap();
        assert_eq!(unknown.progress, 0.0);
        for p in &progress {
            assert!((0.0..=100.0).contains(&p.progress));
        }
    }

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let records = vec![
            record("Ana", "Linux", u64::MAX, Some(1), "2025-01-01T00:00:00.000Z"),
            record("Ana", "Linux", u64::MAX, Some(2), "2025-01-02T00:00:00.000Z"),
        ];
        let totals = group_by_student_course(&records);
        assert_eq!(totals[0].watched_ms, u64::MAX);
        assert_eq!(group_by_student(&records)[0].watched_ms, u64::MAX);
    }

    #[test]
    fn progress_truncates_to_whole_seconds_first() {
        assert_eq!(progress_percent(0, "Linux"), 0.0);
        assert_eq!(progress_percent(3600, "Tutorial Plataforma"), 100.0);
        assert_eq!(progress_percent(1800, "Tutorial Plataforma"), 50.0);
        assert_eq!(progress_percent(u64::MAX / 2, "Linux"), 100.0);
    }
}
