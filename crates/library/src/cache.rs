use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::LibraryError;

pub struct PathCache {
    path: PathBuf,
    writer: Mutex<File>,
}

impl PathCache {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let writer = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, entry: &str) -> Result<bool, LibraryError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let needle = entry.as_bytes();
        for line in reader.split(b'\n') {
            let line = line?;
            let line = line.strip_suffix(b"\r").unwrap_or(&line);
            if line == needle {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn record(&self, entry: &str) -> Result<(), LibraryError> {
        if entry.contains('\n') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path cannot be cached: {:?}", entry),
            )
            .into());
        }
        let mut line = String::with_capacity(entry.len() + 1);
        line.push_str(entry);
        line.push('\n');

        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
