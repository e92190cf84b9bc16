use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

pub fn write_csv<R: Serialize>(dir: &Path, name: &str, rows: &[R]) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(format!("{name}.csv"));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Enriched, StudentRow, StudentTotal};

    #[test]
    fn writes_destination_headers_and_zero_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let row = StudentRow::from(&Enriched::bare(StudentTotal {
            full_name: "Ana Souza".to_string(),
            email: "ana@pditabira.com".to_string(),
            watched_ms: 3_600_000,
            days_since_update: Some(1),
            last_updated: "2025-01-01T00:00:00.000Z".to_string(),
        }));

        let path = write_csv(dir.path(), "tempo_por_aluno", &[row]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Nome Completo,Email,tempo_total_formatado,updated_at,registration_code,status")
        );
        assert_eq!(
            lines.next(),
            Some("Ana Souza,ana@pditabira.com,01:00:00,2025-01-01T00:00:00.000Z,0,0")
        );
    }
}
