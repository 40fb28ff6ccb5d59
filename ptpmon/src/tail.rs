//! Incremental reader for a growing log file.
//!
//! Lines are only consumed once they are complete: when the file has no new
//! data, or ends in a partially written line, the read offset stays where it
//! was and the next call retries from there.

use log::info;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Where to begin reading a freshly opened log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartAt {
    #[default]
    Beginning,
    End,
}

pub struct LogTail {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    line: Vec<u8>,
}

impl LogTail {
    pub fn open<P: AsRef<Path>>(path: P, start: StartAt) -> io::Result<LogTail> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);
        let offset = match start {
            StartAt::Beginning => 0,
            StartAt::End => reader.seek(SeekFrom::End(0))?,
        };
        Ok(LogTail {
            path,
            reader,
            offset,
            line: Vec::new(),
        })
    }

    /// Byte offset of the next unread line.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the next complete line, without its terminator, or `None` if
    /// there is none yet. Never blocks waiting for data. The bytes are not
    /// checked for UTF-8; that is up to the decoder.
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let len = self.reader.get_ref().metadata()?.len();
        if len < self.offset {
            info!(
                "{} shrank to {} bytes (was reading at {}), restarting from the top",
                self.path.display(),
                len,
                self.offset
            );
            self.offset = 0;
            self.reader.seek(SeekFrom::Start(0))?;
        }

        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line)?;
        if n == 0 {
            return Ok(None);
        }
        if self.line.last() != Some(&b'\n') {
            // Writer is mid-line; retry later from the same place.
            self.reader.seek(SeekFrom::Start(self.offset))?;
            return Ok(None);
        }

        self.offset += n as u64;
        let mut end = self.line.len() - 1;
        if end > 0 && self.line[end - 1] == b'\r' {
            end -= 1;
        }
        Ok(Some(self.line[..end].to_vec()))
    }
}
