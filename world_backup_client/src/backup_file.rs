/**
 * Backup File
 *
 * Newline-delimited JSON, one `ObjectRecord` per line, no header. The file
 * is reopened for every append so each record is on disk before the next
 * object is touched.
 */
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use world_backup_common::{codec, CodecError, ObjectRecord};

use crate::error::BackupError;

#[derive(Debug, Clone)]
pub struct BackupFile {
    path: PathBuf,
}

impl BackupFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a new backup, discarding whatever a previous run recorded
    pub fn reset(&self) -> Result<(), BackupError> {
        File::create(&self.path)
            .map(|_| ())
            .map_err(|source| BackupError::Open { path: self.path.clone(), source })
    }

    /// Append one encoded record
    pub fn append(&self, record: &ObjectRecord) -> Result<(), BackupError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| BackupError::Open { path: self.path.clone(), source })?;
        file.write_all(codec::encode(record).as_bytes())
            .map_err(|source| BackupError::Write { path: self.path.clone(), source })
    }

    /// Read the file back lazily, one line at a time
    pub fn reader(&self) -> Result<BackupReader, BackupError> {
        let file = File::open(&self.path)
            .map_err(|source| BackupError::Open { path: self.path.clone(), source })?;
        Ok(BackupReader {
            path: self.path.clone(),
            reader: BufReader::new(file),
            line: 0,
            done: false,
        })
    }
}

/// One non-blank line of a backup file
#[derive(Debug)]
pub enum BackupLine {
    Record { line: usize, record: ObjectRecord },
    Corrupt { line: usize, error: CodecError },
}

/// Yields decoded lines; only an I/O failure is an `Err`, after which
/// reading stops
pub struct BackupReader {
    path: PathBuf,
    reader: BufReader<File>,
    line: usize,
    done: bool,
}

impl Iterator for BackupReader {
    type Item = Result<BackupLine, BackupError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        while !self.done {
            buf.clear();
            self.line += 1;
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => self.done = true,
                Ok(_) if buf.iter().all(u8::is_ascii_whitespace) => continue,
                Ok(_) => {
                    let line = self.line;
                    return Some(Ok(match codec::decode_bytes(&buf) {
                        Ok(record) => BackupLine::Record { line, record },
                        Err(error) => BackupLine::Corrupt { line, error },
                    }));
                }
                Err(source) => {
                    self.done = true;
                    return Some(Err(BackupError::Read { path: self.path.clone(), line: self.line, source }));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline_world::tests::cell;

    #[test]
    fn appended_records_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupFile::new(dir.path().join("backup.txt"));
        backup.reset().unwrap();
        backup.append(&cell(1, 0, 0, "a").into()).unwrap();
        backup.append(&cell(2, 0, 0, "b").into()).unwrap();

        let text = std::fs::read_to_string(backup.path()).unwrap();
        assert_eq!(text.lines().count(), 2);

        let numbers: Vec<u32> = backup.reader().unwrap()
            .map(|l| match l.unwrap() {
                BackupLine::Record { record, .. } => record.number,
                BackupLine::Corrupt { line, .. } => panic!("corrupt line {}", line),
            })
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn reset_discards_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupFile::new(dir.path().join("backup.txt"));
        backup.append(&cell(1, 0, 0, "a").into()).unwrap();
        backup.reset().unwrap();
        assert_eq!(backup.reader().unwrap().count(), 0);
    }

    #[test]
    fn corrupt_lines_keep_their_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.txt");
        let good = codec::encode(&cell(5, 0, 0, "a").into());
        let mut bytes = format!("\n{}{{\"number\":6,\"ty\n{}", good, good).into_bytes();
        bytes.extend_from_slice(b"{\"number\":7,\"model\":\"\xff\xfe\"}\n");
        bytes.extend_from_slice(good.as_bytes());
        std::fs::write(&path, bytes).unwrap();

        let lines: Vec<BackupLine> = BackupFile::new(&path).reader().unwrap().map(Result::unwrap).collect();
        assert_eq!(lines.len(), 5);
        assert!(matches!(lines[0], BackupLine::Record { line: 2, .. }));
        assert!(matches!(lines[1], BackupLine::Corrupt { line: 3, .. }));
        assert!(matches!(lines[2], BackupLine::Record { line: 4, .. }));
        assert!(matches!(lines[3], BackupLine::Corrupt { line: 5, .. }), "invalid UTF-8 is corrupt, not fatal");
        assert!(matches!(lines[4], BackupLine::Record { line: 6, .. }));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupFile::new(dir.path().join("nope.txt"));
        assert!(matches!(backup.reader(), Err(BackupError::Open { .. })));
    }
}
