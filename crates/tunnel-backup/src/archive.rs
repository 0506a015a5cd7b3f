//! Archive naming and directory housekeeping.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use crate::error::BackupError;

/// Whether `name` looks like `backup_<hex>_<anything>.gz` with no path parts.
#[must_use]
pub fn is_archive_name(name: &str) -> bool {
    if name.contains(['/', '\\']) || name.contains("..") || !name.ends_with(".gz") {
        return false;
    }
    let Some(rest) = name.strip_prefix("backup_") else {
        return false;
    };
    let Some((hex, tail)) = rest.split_once('_') else {
        return false;
    };
    !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) && tail.len() > ".gz".len()
}

/// An archive found in the backup directory.
#[derive(Debug, Clone)]
pub(crate) struct ArchiveEntry {
    pub path: PathBuf,
    pub name: String,
    pub modified: SystemTime,
}

/// Archives in `dir`, newest first.
pub(crate) async fn list_archives(dir: &Path) -> Result<Vec<ArchiveEntry>, BackupError> {
    let mut entries = Vec::new();
    let mut reader = match tokio::fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let metadata = entry.metadata().await?;
        if metadata.is_file() && is_archive_name(&name) {
            entries.push(ArchiveEntry {
                path: entry.path(),
                name,
                modified: metadata.modified()?,
            });
        }
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(entries)
}

/// Delete all but the newest `keep` archives. Returns the deleted names.
pub(crate) async fn prune(dir: &Path, keep: usize) -> Result<Vec<String>, BackupError> {
    let mut deleted = Vec::new();
    for archive in list_archives(dir).await?.into_iter().skip(keep) {
        tokio::fs::remove_file(&archive.path).await?;
        info!(filename = %archive.name, "Archivo antiguo eliminado");
        deleted.push(archive.name);
    }
    Ok(deleted)
}

/// Delete archives older than `max_age`. Returns the deleted names.
pub(crate) async fn remove_expired(
    dir: &Path,
    max_age: Duration,
) -> Result<Vec<String>, BackupError> {
    let now = SystemTime::now();
    let mut deleted = Vec::new();
    for archive in list_archives(dir).await? {
        let age = now.duration_since(archive.modified).unwrap_or_default();
        if age > max_age {
            tokio::fs::remove_file(&archive.path).await?;
            debug!(filename = %archive.name, age_secs = age.as_secs(), "Archivo expirado eliminado");
            deleted.push(archive.name);
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_names() {
        assert!(is_archive_name("backup_1a2b3c_sicar_backup_2025-01-01_10-00-00.sql.gz"));
        assert!(is_archive_name("backup_ff_x.tar.gz"));

        assert!(!is_archive_name("backup__x.gz"));
        assert!(!is_archive_name("backup_xyz_x.gz"));
        assert!(!is_archive_name("backup_ab_x.sql"));
        assert!(!is_archive_name("backup_ab_.gz"));
        assert!(!is_archive_name("../backup_ab_x.gz"));
        assert!(!is_archive_name("backup_ab_x/../../etc.gz"));
        assert!(!is_archive_name("sicar_backup.sql.gz"));
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        for (i, name) in ["backup_a1_old.sql.gz", "backup_b2_mid.sql.gz", "backup_c3_new.sql.gz"]
            .iter()
            .enumerate()
        {
            let path = dir.path().join(name);
            std::fs::write(&path, b"x").unwrap();
            let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000 + i as u64);
            std::fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(mtime)
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        let deleted = prune(dir.path(), 1).await.unwrap();

        assert_eq!(deleted.len(), 2);
        assert!(dir.path().join("backup_c3_new.sql.gz").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archives = list_archives(&dir.path().join("absent")).await.unwrap();
        assert!(archives.is_empty());
    }

    #[tokio::test]
    async fn test_remove_expired() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("backup_aa_old.sql.gz");
        std::fs::write(&old, b"x").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(7 * 3600))
            .unwrap();
        std::fs::write(dir.path().join("backup_bb_fresh.sql.gz"), b"x").unwrap();

        let deleted = remove_expired(dir.path(), Duration::from_secs(6 * 3600))
            .await
            .unwrap();

        assert_eq!(deleted, vec!["backup_aa_old.sql.gz".to_string()]);
        assert!(dir.path().join("backup_bb_fresh.sql.gz").exists());
    }
}
