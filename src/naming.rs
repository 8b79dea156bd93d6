// File Namer - `<start>-<end>[-N].<ext>` without clobbering earlier exports

use crate::dates::format_for_file;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// First free name for a batch spanning `start..=end` inside `dir`.
///
/// Tries `20230101-20230131.qif`, then `20230101-20230131-1.qif`,
/// `-2`, … and returns the first path that does not exist yet.
pub fn next_available_name(dir: &Path, start: NaiveDate, end: NaiveDate, ext: &str) -> PathBuf {
    let stem = format!("{}-{}", format_for_file(start), format_for_file(end));

    let mut suffix = 0u32;
    loop {
        let file_name = if suffix == 0 {
            format!("{}.{}", stem, ext)
        } else {
            format!("{}-{}.{}", stem, suffix, ext)
        };

        let candidate = dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_base_name_when_free() {
        let dir = tempdir().unwrap();

        let path = next_available_name(dir.path(), ymd(2023, 1, 5), ymd(2023, 2, 1), "qif");

        assert_eq!(path, dir.path().join("20230105-20230201.qif"));
    }

    #[test]
    fn test_suffixes_increase_as_files_appear() {
        let dir = tempdir().unwrap();
        let (start, end) = (ymd(2023, 1, 5), ymd(2023, 1, 31));

        let mut names = Vec::new();
        for _ in 0..4 {
            let path = next_available_name(dir.path(), start, end, "csv");
            assert!(!path.exists());
            fs::write(&path, "taken").unwrap();
            names.push(path.file_name().unwrap().to_string_lossy().into_owned());
        }

        assert_eq!(
            names,
            vec![
                "20230105-20230131.csv",
                "20230105-20230131-1.csv",
                "20230105-20230131-2.csv",
                "20230105-20230131-3.csv",
            ]
        );
    }

    #[test]
    fn test_fills_first_gap() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("20230105-20230105.qif"), "").unwrap();
        fs::write(dir.path().join("20230105-20230105-2.qif"), "").unwrap();

        let path = next_available_name(dir.path(), ymd(2023, 1, 5), ymd(2023, 1, 5), "qif");

        assert_eq!(path, dir.path().join("20230105-20230105-1.qif"));
    }

    #[test]
    fn test_extension_is_part_of_collision_check() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("20230105-20230110.qif"), "").unwrap();

        let path = next_available_name(dir.path(), ymd(2023, 1, 5), ymd(2023, 1, 10), "csv");

        assert_eq!(path, dir.path().join("20230105-20230110.csv"));
    }
}
