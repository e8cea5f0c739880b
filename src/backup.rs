//! Rotating JSON snapshots of the transaction collection, taken before operations that replace
//! or bulk-insert data.

use crate::error::Res;
use crate::model::FuelTransaction;
use crate::{utils, Config};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;
use tracing::debug;

/// Prefix for the snapshot taken before a spreadsheet import.
pub const IMPORT_PRE: &str = "import-pre";

/// Prefix for the snapshot taken before the local collection is replaced by a download.
pub const SYNC_DOWN_PRE: &str = "sync-down-pre";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
///
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Writes `transactions` as `{prefix}.YYYY-MM-DD-NNN.json`, where NNN counts up within a day,
    /// then deletes the oldest files of that prefix beyond `backup_copies`.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_json(&self, prefix: &str, transactions: &[FuelTransaction]) -> Res<PathBuf> {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{EXTENSION}"));

        let json = serde_json::to_string_pretty(transactions)
            .context("Failed to serialize transactions for backup")?;
        utils::write(&path, json).await?;
        debug!("Wrote backup {}", path.display());

        self.rotate(prefix).await?;
        Ok(path)
    }

    /// The names of the backup files with `prefix`, oldest first.
    async fn list(&self, prefix: &str) -> Res<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }
        // The date and zero-padded sequence number make names sort chronologically.
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Res<u32> {
        let max_seq = self
            .list(prefix)
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    async fn rotate(&self, prefix: &str) -> Res<()> {
        let files = self.list(prefix).await?;
        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }
        Ok(())
    }
}

fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number("import-pre.2025-12-14-001.json", IMPORT_PRE, "2025-12-14"),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("import-pre.2025-12-14-042.json", IMPORT_PRE, "2025-12-14"),
            Some(42)
        );
        assert_eq!(
            parse_sequence_number("sync-down-pre.2025-12-14-001.json", IMPORT_PRE, "2025-12-14"),
            None
        );
        assert_eq!(
            parse_sequence_number("import-pre.2025-12-13-001.json", IMPORT_PRE, "2025-12-14"),
            None
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file("import-pre.2025-12-14-001.json", IMPORT_PRE));
        assert!(is_backup_file("sync-down-pre.2025-12-14-001.json", SYNC_DOWN_PRE));
        assert!(!is_backup_file("sync-down-pre.2025-12-14-001.json", IMPORT_PRE));
        assert!(!is_backup_file("import-pre.2025-12-14-001.txt", IMPORT_PRE));
    }

    #[tokio::test]
    async fn test_save_json_rotates() {
        let env = TestEnv::new().await;
        let backup = env.config().backup();
        let mut paths = Vec::new();
        for _ in 0..7 {
            paths.push(backup.save_json(IMPORT_PRE, &[]).await.unwrap());
        }
        backup.save_json(SYNC_DOWN_PRE, &[]).await.unwrap();

        let kept = backup.list(IMPORT_PRE).await.unwrap();
        assert_eq!(kept.len(), 5);
        assert!(!paths[0].exists());
        assert!(!paths[1].exists());
        assert!(paths[6].exists());
        assert!(paths[6].to_string_lossy().ends_with("-007.json"));
        assert_eq!(backup.list(SYNC_DOWN_PRE).await.unwrap().len(), 1);
        assert_eq!(utils::read(&paths[6]).await.unwrap(), "[]");
    }
}
