//! Timestamped workbook copies kept next to the original

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::WriteError;

const BACKUP_MARKER: &str = "_backup_";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// `<stem>_backup_<YYYYmmddTHHMMSS>.<ext>` in the workbook's directory
pub fn backup_path(path: &Path, at: NaiveDateTime) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let mut name = format!("{stem}{BACKUP_MARKER}{}", at.format(TIMESTAMP_FORMAT));
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

/// Copy the workbook to a fresh backup file and return its path
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    create_backup_at(path, Local::now().naive_local())
}

/// Backups taken within the same second get a zero-padded counter, which
/// sorts after the plain name and in creation order
fn numbered_backup_path(path: &Path, at: NaiveDateTime, attempt: u32) -> PathBuf {
    let base = backup_path(path, at);
    if attempt == 0 {
        return base;
    }
    let mut name = format!(
        "{}_{attempt:04}",
        base.file_stem().unwrap_or_default().to_string_lossy()
    );
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

fn create_backup_at(path: &Path, at: NaiveDateTime) -> Result<PathBuf> {
    let mut attempt = 0;
    let mut backup = numbered_backup_path(path, at, attempt);
    while backup.exists() {
        attempt += 1;
        backup = numbered_backup_path(path, at, attempt);
    }

    fs::copy(path, &backup).with_context(|| {
        format!(
            "Failed to back up {} to {}",
            path.display(),
            backup.display()
        )
    })?;
    info!(backup = %backup.display(), "workbook backed up");
    Ok(backup)
}

/// Newest backup of `path`, judged by the timestamp in its name
pub fn latest_backup(path: &Path) -> Result<Option<PathBuf>> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = format!(
        "{}{BACKUP_MARKER}",
        path.file_stem().unwrap_or_default().to_string_lossy()
    );
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut newest: Option<(String, PathBuf)> = None;
    for entry in fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        let candidate = entry.path();
        let Some(name) = candidate.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !name.starts_with(&prefix) {
            continue;
        }
        if candidate.extension().map(|e| e.to_string_lossy().into_owned()) != extension {
            continue;
        }
        if newest.as_ref().is_none_or(|(best, _)| name > *best) {
            newest = Some((name, candidate));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Copy `backup` over the workbook, or the newest backup when none is given
pub fn restore_backup(path: &Path, backup: Option<&Path>) -> Result<PathBuf> {
    let backup = match backup {
        Some(backup) => backup.to_path_buf(),
        None => latest_backup(path)?.ok_or_else(|| WriteError::NoBackup(path.to_path_buf()))?,
    };
    if !backup.exists() {
        return Err(WriteError::NoBackup(path.to_path_buf()).into());
    }

    fs::copy(&backup, path).with_context(|| {
        format!(
            "Failed to restore {} from {}",
            path.display(),
            backup.display()
        )
    })?;
    info!(backup = %backup.display(), "workbook restored");
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 3)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_backup_name() {
        let path = Path::new("data/REPORTE FTTH.xlsx");
        assert_eq!(
            backup_path(path, at(9, 5, 7)),
            Path::new("data/REPORTE FTTH_backup_20260203T090507.xlsx")
        );
    }

    #[test]
    fn test_backup_restore_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = dir.path().join("report.xlsx");
        fs::write(&workbook, b"original").unwrap();

        assert!(latest_backup(&workbook).unwrap().is_none());
        assert!(restore_backup(&workbook, None).is_err());

        let first = create_backup(&workbook).unwrap();
        let second = create_backup(&workbook).unwrap();
        assert_ne!(first, second);
        // Unrelated files are ignored
        fs::write(dir.path().join("other_backup_20990101T000000.xlsx"), b"x").unwrap();
        fs::write(dir.path().join("report_backup_20990101T000000.csv"), b"x").unwrap();

        let older = dir.path().join("report_backup_20000101T000000.xlsx");
        fs::write(&older, b"older").unwrap();
        let latest = latest_backup(&workbook).unwrap().unwrap();
        assert_ne!(latest, older);

        fs::write(&workbook, b"patched").unwrap();
        restore_backup(&workbook, None).unwrap();
        assert_eq!(fs::read(&workbook).unwrap(), b"original");

        restore_backup(&workbook, Some(&older)).unwrap();
        assert_eq!(fs::read(&workbook).unwrap(), b"older");
    }

    #[test]
    fn test_same_second_backups_sort_in_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = dir.path().join("report.xlsx");
        let when = at(10, 0, 0);

        let mut created = Vec::new();
        for n in 0..12 {
            fs::write(&workbook, format!("version {n}")).unwrap();
            created.push(create_backup_at(&workbook, when).unwrap());
        }

        assert_eq!(
            created[0].file_name().unwrap(),
            "report_backup_20260203T100000.xlsx"
        );
        assert_eq!(
            created[11].file_name().unwrap(),
            "report_backup_20260203T100000_0011.xlsx"
        );
        assert_eq!(latest_backup(&workbook).unwrap(), Some(created[11].clone()));

        fs::write(&workbook, b"patched").unwrap();
        restore_backup(&workbook, None).unwrap();
        assert_eq!(fs::read(&workbook).unwrap(), b"version 11");
    }
}
