//! Database file naming
//!
//! The storage engine encodes the role of every file in its name. This module
//! parses those names back into a [`FileType`] and builds them from a file
//! number, and defines the [`FileClassifier`] seam the backup coordinator
//! uses to decide what to copy.

use std::fmt;
use std::path::{Path, PathBuf};

/// Role of a file inside a database directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Write-ahead log (`000123.log`), may still be appended to
    Log,
    /// Database lock file (`LOCK`)
    Lock,
    /// Immutable sorted table (`000123.ldb` or `000123.sst`)
    Table,
    /// Manifest / descriptor (`MANIFEST-000123`)
    Descriptor,
    /// Pointer to the live descriptor (`CURRENT`)
    Current,
    /// Temporary file (`000123.dbtmp`)
    Temp,
    /// Informational log (`LOG` or `LOG.old`)
    InfoLog,
}

impl FileType {
    /// Check if a backup must include files of this type
    #[inline]
    pub const fn is_backup_eligible(&self) -> bool {
        matches!(
            self,
            FileType::Log
                | FileType::Table
                | FileType::Descriptor
                | FileType::Current
                | FileType::InfoLog
        )
    }

    /// Check if files of this type can change after they are written
    ///
    /// Only tables are immutable; everything else has to be copied up to the
    /// length observed when the backup was planned.
    #[inline]
    pub const fn is_copy_bound_sensitive(&self) -> bool {
        !matches!(self, FileType::Table)
    }

    /// Get the type as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            FileType::Log => "Log",
            FileType::Lock => "Lock",
            FileType::Table => "Table",
            FileType::Descriptor => "Descriptor",
            FileType::Current => "Current",
            FileType::Temp => "Temp",
            FileType::InfoLog => "InfoLog",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Parse a database file name into its number and type
///
/// Returns `None` for names the engine does not own. Files without a number
/// (`CURRENT`, `LOCK`, `LOG`, `LOG.old`) report number `0`.
pub fn parse_file_name(name: &str) -> Option<(u64, FileType)> {
    match name {
        "CURRENT" => return Some((0, FileType::Current)),
        "LOCK" => return Some((0, FileType::Lock)),
        "LOG" | "LOG.old" => return Some((0, FileType::InfoLog)),
        _ => {}
    }

    if let Some(rest) = name.strip_prefix("MANIFEST-") {
        let (number, suffix) = consume_decimal(rest)?;
        return suffix.is_empty().then_some((number, FileType::Descriptor));
    }

    let (number, suffix) = consume_decimal(name)?;
    let file_type = match suffix {
        ".log" => FileType::Log,
        ".sst" | ".ldb" => FileType::Table,
        ".dbtmp" => FileType::Temp,
        _ => return None,
    };
    Some((number, file_type))
}

/// Split a leading decimal number off `input`
///
/// Fails when there are no digits or the value does not fit in a `u64`.
fn consume_decimal(input: &str) -> Option<(u64, &str)> {
    let digits = input.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let number = input[..digits].parse::<u64>().ok()?;
    Some((number, &input[digits..]))
}

fn numbered(dbname: &Path, number: u64, suffix: &str) -> PathBuf {
    dbname.join(format!("{number:06}.{suffix}"))
}

/// Path of the write-ahead log with the given number
pub fn log_file_name(dbname: impl AsRef<Path>, number: u64) -> PathBuf {
    numbered(dbname.as_ref(), number, "log")
}

/// Path of the table with the given number
pub fn table_file_name(dbname: impl AsRef<Path>, number: u64) -> PathBuf {
    numbered(dbname.as_ref(), number, "ldb")
}

/// Path of the temporary file with the given number
pub fn temp_file_name(dbname: impl AsRef<Path>, number: u64) -> PathBuf {
    numbered(dbname.as_ref(), number, "dbtmp")
}

/// Path of the descriptor with the given number
pub fn descriptor_file_name(dbname: impl AsRef<Path>, number: u64) -> PathBuf {
    dbname.as_ref().join(format!("MANIFEST-{number:06}"))
}

/// Path of the `CURRENT` file
pub fn current_file_name(dbname: impl AsRef<Path>) -> PathBuf {
    dbname.as_ref().join("CURRENT")
}

/// Path of the `LOCK` file
pub fn lock_file_name(dbname: impl AsRef<Path>) -> PathBuf {
    dbname.as_ref().join("LOCK")
}

/// Path of the informational log
pub fn info_log_file_name(dbname: impl AsRef<Path>) -> PathBuf {
    dbname.as_ref().join("LOG")
}

/// Maps a file name to the role it plays in the database
pub trait FileClassifier: Send + Sync {
    /// Classify `name`, or return `None` if it is not a database file
    fn classify(&self, name: &str) -> Option<FileType>;
}

/// Classifier using the engine's own naming rules ([`parse_file_name`])
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelDbClassifier;

impl FileClassifier for LevelDbClassifier {
    fn classify(&self, name: &str) -> Option<FileType> {
        parse_file_name(name).map(|(_, file_type)| file_type)
    }
}

impl<F> FileClassifier for F
where
    F: Fn(&str) -> Option<FileType> + Send + Sync,
{
    fn classify(&self, name: &str) -> Option<FileType> {
        self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        let cases = [
            ("100.log", 100, FileType::Log),
            ("0.log", 0, FileType::Log),
            ("0.sst", 0, FileType::Table),
            ("0.ldb", 0, FileType::Table),
            ("CURRENT", 0, FileType::Current),
            ("LOCK", 0, FileType::Lock),
            ("MANIFEST-2", 2, FileType::Descriptor),
            ("MANIFEST-7", 7, FileType::Descriptor),
            ("LOG", 0, FileType::InfoLog),
            ("LOG.old", 0, FileType::InfoLog),
            ("18446744073709551615.log", u64::MAX, FileType::Log),
            ("000042.dbtmp", 42, FileType::Temp),
        ];
        for (name, number, file_type) in cases {
            assert_eq!(
                parse_file_name(name),
                Some((number, file_type)),
                "parsing {name}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        let errors = [
            "",
            "foo",
            "foo-dx-100.log",
            ".log",
            "manifest",
            "CURREN",
            "CURRENTX",
            "MANIFES",
            "MANIFEST",
            "MANIFEST-",
            "XMANIFEST-3",
            "MANIFEST-3x",
            "LOC",
            "LOCKx",
            "LO",
            "LOGx",
            "18446744073709551616.log",
            "184467440737095516150.log",
            "100",
            "100.",
            "100.lop",
            ".hidden.log",
        ];
        for name in errors {
            assert_eq!(parse_file_name(name), None, "parsing {name:?}");
        }
    }

    #[test]
    fn test_builders_roundtrip_through_parser() {
        let dir = Path::new("/db");
        let built = [
            (log_file_name(dir, 192), 192, FileType::Log),
            (table_file_name(dir, 200), 200, FileType::Table),
            (descriptor_file_name(dir, 100), 100, FileType::Descriptor),
            (temp_file_name(dir, 999), 999, FileType::Temp),
            (current_file_name(dir), 0, FileType::Current),
            (lock_file_name(dir), 0, FileType::Lock),
            (info_log_file_name(dir), 0, FileType::InfoLog),
        ];
        for (path, number, file_type) in built {
            assert_eq!(path.parent(), Some(dir));
            let name = path.file_name().unwrap().to_str().unwrap();
            assert_eq!(parse_file_name(name), Some((number, file_type)));
        }
        assert_eq!(log_file_name(dir, 1), Path::new("/db/000001.log"));
    }

    #[test]
    fn test_eligibility() {
        assert!(FileType::Log.is_backup_eligible());
        assert!(FileType::Table.is_backup_eligible());
        assert!(FileType::Descriptor.is_backup_eligible());
        assert!(FileType::Current.is_backup_eligible());
        assert!(FileType::InfoLog.is_backup_eligible());
        assert!(!FileType::Lock.is_backup_eligible());
        assert!(!FileType::Temp.is_backup_eligible());

        assert!(!FileType::Table.is_copy_bound_sensitive());
        assert!(FileType::Log.is_copy_bound_sensitive());
        assert!(FileType::Current.is_copy_bound_sensitive());
    }

    #[test]
    fn test_closure_classifier() {
        let only_logs = |name: &str| name.ends_with(".log").then_some(FileType::Log);
        assert_eq!(only_logs.classify("1.log"), Some(FileType::Log));
        assert_eq!(only_logs.classify("CURRENT"), None);
        assert_eq!(LevelDbClassifier.classify("CURRENT"), Some(FileType::Current));
    }
}
