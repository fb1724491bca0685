//! Backup sinks
//!
//! A sink receives every planned file, in listing order, and is responsible
//! for moving its bytes somewhere safe. Returning an error stops the backup.

use std::io;
use std::path::{Path, PathBuf};

use crate::backup::{CopyBound, FileEntry};
use crate::env::Env;

/// Default chunk size used by [`DirCopySink`]
pub const DEFAULT_COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Receives the files of a backup
pub trait BackupSink {
    /// Copy `entry`, honoring `entry.bound`
    fn copy_file(&mut self, entry: &FileEntry) -> io::Result<()>;
}

impl<F> BackupSink for F
where
    F: FnMut(&FileEntry) -> io::Result<()>,
{
    fn copy_file(&mut self, entry: &FileEntry) -> io::Result<()> {
        self(entry)
    }
}

/// Sink that copies files into a directory
///
/// Reads the source through one environment and writes the copy through
/// another (both may be the same). At most `bound` bytes are copied, so a
/// log that keeps growing during the backup is cut at the planned length.
pub struct DirCopySink<S: Env, D: Env> {
    source: S,
    dest_env: D,
    dest_dir: PathBuf,
    chunk_size: usize,
    files_copied: u64,
    bytes_copied: u64,
}

impl<S: Env, D: Env> DirCopySink<S, D> {
    /// Create a sink copying into `dest_dir`
    pub fn new(source: S, dest_env: D, dest_dir: impl AsRef<Path>) -> Self {
        Self {
            source,
            dest_env,
            dest_dir: dest_dir.as_ref().to_path_buf(),
            chunk_size: DEFAULT_COPY_CHUNK_SIZE,
            files_copied: 0,
            bytes_copied: 0,
        }
    }

    /// Set the read chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Destination directory
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Number of files copied so far
    pub fn files_copied(&self) -> u64 {
        self.files_copied
    }

    /// Number of bytes copied so far
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied
    }
}

impl<S: Env, D: Env> BackupSink for DirCopySink<S, D> {
    fn copy_file(&mut self, entry: &FileEntry) -> io::Result<()> {
        if self.files_copied == 0 {
            self.dest_env.create_dir(&self.dest_dir)?;
        }

        let target = self.dest_dir.join(&entry.name);
        self.dest_env.write_file(&target, &[])?;

        let mut buf = vec![0u8; self.chunk_size];
        let mut offset = 0u64;
        loop {
            let want = match entry.bound {
                CopyBound::EntireFile => buf.len(),
                CopyBound::Prefix(n) => {
                    let remaining = n - offset;
                    if remaining == 0 {
                        break;
                    }
                    remaining.min(buf.len() as u64) as usize
                }
            };

            let read = self.source.read_at(&entry.path, offset, &mut buf[..want])?;
            if read == 0 {
                if let CopyBound::Prefix(n) = entry.bound {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "{} shrank below its planned length ({offset} of {n} bytes)",
                            entry.path.display()
                        ),
                    ));
                }
                break;
            }

            self.dest_env.append_file(&target, &buf[..read])?;
            offset += read as u64;
        }

        self.files_copied += 1;
        self.bytes_copied += offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemEnv;
    use crate::filename::FileType;

    fn entry(name: &str, file_type: FileType, bound: CopyBound) -> FileEntry {
        FileEntry::new(Path::new("/db"), name, file_type, bound)
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        let mut sink = |e: &FileEntry| -> io::Result<()> {
            seen.push(e.name.clone());
            Ok(())
        };
        sink.copy_file(&entry("CURRENT", FileType::Current, CopyBound::Prefix(1)))
            .unwrap();
        assert_eq!(seen, vec!["CURRENT"]);
    }

    #[test]
    fn test_dir_copy_sink_respects_prefix() {
        let env = MemEnv::new();
        env.write_file(Path::new("/db/000001.log"), b"0123456789")
            .unwrap();
        env.write_file(Path::new("/db/000002.ldb"), &[7u8; 100])
            .unwrap();

        let mut sink = DirCopySink::new(&env, &env, "/backup").with_chunk_size(3);
        sink.copy_file(&entry("000001.log", FileType::Log, CopyBound::Prefix(5)))
            .unwrap();
        sink.copy_file(&entry("000002.ldb", FileType::Table, CopyBound::EntireFile))
            .unwrap();

        assert_eq!(env.contents("/backup/000001.log"), Some(b"01234".to_vec()));
        assert_eq!(env.contents("/backup/000002.ldb"), Some(vec![7u8; 100]));
        assert_eq!(sink.files_copied(), 2);
        assert_eq!(sink.bytes_copied(), 105);
    }

    #[test]
    fn test_dir_copy_sink_empty_prefix() {
        let env = MemEnv::new();
        env.write_file(Path::new("/db/LOG"), b"info").unwrap();

        let mut sink = DirCopySink::new(&env, &env, "/backup");
        sink.copy_file(&entry("LOG", FileType::InfoLog, CopyBound::Prefix(0)))
            .unwrap();
        assert_eq!(env.contents("/backup/LOG"), Some(Vec::new()));
    }

    #[test]
    fn test_dir_copy_sink_detects_shrunk_file() {
        let env = MemEnv::new();
        env.write_file(Path::new("/db/000003.log"), b"abc").unwrap();

        let mut sink = DirCopySink::new(&env, &env, "/backup");
        let err = sink
            .copy_file(&entry("000003.log", FileType::Log, CopyBound::Prefix(10)))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_dir_copy_sink_missing_source() {
        let env = MemEnv::new();
        let mut sink = DirCopySink::new(&env, &env, "/backup");
        let err = sink
            .copy_file(&entry("000009.ldb", FileType::Table, CopyBound::EntireFile))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
