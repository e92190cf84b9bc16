use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::Instrument;

use crate::aggregate;
use crate::config::{Config, DESTINATION_PROGRESS, DESTINATION_STUDENT, DESTINATION_STUDENT_COURSE};
use crate::enrich;
use crate::export;
use crate::fetch;
use crate::filter;
use crate::models::{ProgressRow, StudentCourseRow, StudentRow};
use crate::publish::{self, DeleteOutcome, PublishOutcome};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Fetch and aggregate, but leave the destination untouched.
    pub dry_run: bool,
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    FetchFailed,
    NoAllowedRecords,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationReport {
    pub url: String,
    pub rows: usize,
    pub deleted: DeleteOutcome,
    pub published: PublishOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub watch_records: usize,
    pub enriched: bool,
    pub destinations: Vec<DestinationReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Aborted(AbortReason),
    Completed(RunSummary),
}

pub async fn run(
    client: &reqwest::Client,
    config: &Config,
    options: &RunOptions,
    now: DateTime<Utc>,
) -> anyhow::Result<RunOutcome> {
    let span = tracing::info_span!("sync", run_id = %uuid::Uuid::new_v4());
    run_stages(client, config, options, now).instrument(span).await
}

async fn run_stages(
    client: &reqwest::Client,
    config: &Config,
    options: &RunOptions,
    now: DateTime<Utc>,
) -> anyhow::Result<RunOutcome> {
    let records = match fetch::fetch_watch_records(client, config, now).await {
        Ok(records) => records,
        Err(err) => {
            tracing::error!(error = %err, "Could not load watch times, aborting");
            return Ok(RunOutcome::Aborted(AbortReason::FetchFailed));
        }
    };
    let fetched = records.len();
    let records = filter::retain_allowed(records, &config.allowed_domains);
    tracing::info!(fetched, kept = records.len(), "Filtered watch times by email domain");
    if records.is_empty() {
        tracing::warn!("No records left after the initial email filter, aborting");
        return Ok(RunOutcome::Aborted(AbortReason::NoAllowedRecords));
    }

    let per_course = aggregate::group_by_student_course(&records);
    let per_student = aggregate::group_by_student(&records);
    let progress = aggregate::course_progress(&per_course);

    let enrollments = match enrich::fetch_enrollments(client, config).await {
        Ok(enrollments) => {
            tracing::info!(count = enrollments.len(), "Loaded enrollments");
            Some(enrollments)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Enrollment data unavailable, publishing without it");
            None
        }
    };
    let enrollments = enrollments.as_deref();

    let course_rows: Vec<StudentCourseRow> = publish::project(
        &enrich::enrich(&per_course, enrollments),
        &config.allowed_domains,
    );
    let student_rows: Vec<StudentRow> = publish::project(
        &enrich::enrich(&per_student, enrollments),
        &config.allowed_domains,
    );
    let progress_rows: Vec<ProgressRow> = publish::project(
        &enrich::enrich(&progress, enrollments),
        &config.allowed_domains,
    );

    if let Some(dir) = &options.export_dir {
        for path in [
            export::write_csv(dir, "tempo_por_aluno_e_curso", &course_rows)?,
            export::write_csv(dir, "tempo_por_aluno", &student_rows)?,
            export::write_csv(dir, "progresso_por_curso", &progress_rows)?,
        ] {
            tracing::info!(path = %path.display(), "Exported view");
        }
    }

    let urls = [
        config.destination(DESTINATION_STUDENT_COURSE),
        config.destination(DESTINATION_STUDENT),
        config.destination(DESTINATION_PROGRESS),
    ];

    let mut deleted = Vec::with_capacity(urls.len());
    for url in &urls {
        deleted.push(if options.dry_run {
            tracing::info!(url = %url, "Dry run, skipping delete");
            DeleteOutcome::Skipped
        } else {
            publish::clear_destination(client, url).await
        });
    }

    let row_counts = [course_rows.len(), student_rows.len(), progress_rows.len()];
    let published = if options.dry_run {
        for (url, rows) in urls.iter().zip(row_counts) {
            tracing::info!(url = %url, rows, "Dry run, skipping upload");
        }
        [PublishOutcome::Skipped; 3]
    } else {
        [
            publish::upload(client, &urls[0], &course_rows).await,
            publish::upload(client, &urls[1], &student_rows).await,
            publish::upload(client, &urls[2], &progress_rows).await,
        ]
    };

    let destinations = urls
        .into_iter()
        .zip(row_counts)
        .zip(deleted.into_iter().zip(published))
        .map(|((url, rows), (deleted, published))| DestinationReport {
            url,
            rows,
            deleted,
            published,
        })
        .collect();

    Ok(RunOutcome::Completed(RunSummary {
        watch_records: records.len(),
        enriched: enrollments.is_some(),
        destinations,
    }))
}
