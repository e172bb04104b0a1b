use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Run-scoped failure log, one `<key>\t<message>` line per failure.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the previous run's log.
    pub fn truncate(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    pub fn append(&self, key: &str, message: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // Keep one entry per line whatever the message contains.
        let message = message.replace(['\n', '\r'], " ");
        writeln!(file, "{key}\t{message}")
    }

    /// All `(key, message)` pairs currently in the log.
    pub fn entries(&self) -> io::Result<Vec<(String, String)>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(content
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(key, message)| (key.to_string(), message.to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_truncate() {
        let tmp = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(tmp.path().join("error.log"));
        log.truncate().unwrap();
        log.append("plugin/foo", "no download URL").unwrap();
        log.append("oddtype:bar", "Unknown type\noddtype").unwrap();

        let raw = fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw, "plugin/foo\tno download URL\noddtype:bar\tUnknown type oddtype\n");
        assert_eq!(log.entries().unwrap().len(), 2);

        log.truncate().unwrap();
        assert!(!log.path().exists());
        assert!(log.entries().unwrap().is_empty());
    }
}
