// ==========================================
// Invoice Ingest - Line Supply
// ==========================================
// Responsibility: the ordered supply of UTF-8 text lines the core
// consumes. File-scoped failures here (missing file, wrong extension,
// size ceiling, unreadable bytes) abort the whole operation, unlike
// row-scoped problems.
// ==========================================

use crate::parser::error::{ParseError, ParseResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Collaborator seam: anything that can hand the core an ordered list
/// of text lines.
pub trait LineSupplier {
    fn supply_lines(&self) -> ParseResult<Vec<String>>;
}

// ==========================================
// FileLineSupplier
// ==========================================
pub struct FileLineSupplier {
    path: PathBuf,
    max_bytes: u64,
}

impl FileLineSupplier {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_bytes: crate::config::defaults::MAX_FILE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl LineSupplier for FileLineSupplier {
    fn supply_lines(&self) -> ParseResult<Vec<String>> {
        if !self.path.exists() {
            return Err(ParseError::FileNotFound(self.path.display().to_string()));
        }

        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" && ext != "txt" {
            return Err(ParseError::UnsupportedFormat(ext));
        }

        let size = fs::metadata(&self.path)?.len();
        if size > self.max_bytes {
            return Err(ParseError::FileTooLarge {
                size,
                ceiling: self.max_bytes,
            });
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_csv(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_supply_lines_in_order() {
        let file = temp_csv("first\nsecond\nthird\n");
        let lines = FileLineSupplier::new(file.path()).supply_lines().unwrap();
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_file_not_found() {
        let result = FileLineSupplier::new("no_such_file.csv").supply_lines();
        assert!(matches!(result, Err(ParseError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new()
            .suffix(".xlsx")
            .tempfile()
            .unwrap();
        let result = FileLineSupplier::new(file.path()).supply_lines();
        assert!(matches!(result, Err(ParseError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_size_ceiling() {
        let file = temp_csv("a,b,c\nd,e,f\n");
        let result = FileLineSupplier::new(file.path())
            .with_max_bytes(4)
            .supply_lines();
        assert!(matches!(result, Err(ParseError::FileTooLarge { .. })));
    }
}
