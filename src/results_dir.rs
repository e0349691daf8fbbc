use crate::error::PipelineError;
use crate::trial::TrialKey;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// The directory the benchmark harness writes its result files into.
///
/// Every trial leaves two files: `<type>-<rate>-<db>` with the psql output
/// and `<type>-<rate>-<db>-log` with the server log lines.
#[derive(Debug, Clone)]
pub struct ResultsDir {
    root: PathBuf,
    log_suffix: String,
}

impl ResultsDir {
    pub fn new(root: impl Into<PathBuf>, log_suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            log_suffix: log_suffix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to a trial's primary results file (e.g. `results/t-50-3`).
    pub fn trial_file(&self, key: &TrialKey) -> PathBuf {
        self.root.join(key.to_string())
    }

    /// Path to a trial's companion log (e.g. `results/t-50-3-log`).
    pub fn log_file(&self, key: &TrialKey) -> PathBuf {
        self.root.join(format!("{key}{}", self.log_suffix))
    }
}

/// Read a whole file as lines. The file is closed before this returns.
pub fn read_lines(path: &Path) -> Result<Vec<String>, PipelineError> {
    let io_err = |e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let file = std::fs::File::open(path).map_err(io_err)?;
    let reader = std::io::BufReader::new(file);
    reader.lines().collect::<Result<_, _>>().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::{Configuration, TrialType};
    use tempfile::TempDir;

    fn key() -> TrialKey {
        TrialKey {
            config: Configuration {
                trial_type: TrialType::Probabilistic,
                rate: 70,
            },
            db: 9,
        }
    }

    #[test]
    fn file_names_follow_harness_convention() {
        let dir = ResultsDir::new("results", "-log");
        assert_eq!(dir.trial_file(&key()), PathBuf::from("results/p-70-9"));
        assert_eq!(dir.log_file(&key()), PathBuf::from("results/p-70-9-log"));
    }

    #[test]
    fn read_lines_strips_newlines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p-70-9");
        std::fs::write(&path, "a\nb | 2\r\nTime: 1 ms\n").unwrap();
        let lines = read_lines(&path).unwrap();
        assert_eq!(lines, vec!["a", "b | 2", "Time: 1 ms"]);
    }

    #[test]
    fn missing_file_is_an_io_error_naming_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t-10-0");
        let err = read_lines(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
        assert!(err.to_string().contains("t-10-0"));
    }
}
