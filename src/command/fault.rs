//! Recoverable Subversion working-copy faults
//!
//! Two failures of the `svn` client are known to be repairable:
//! a missing pristine blob (E155010/E155032) and a stale working-copy lock
//! (E155004). Both are recognised from the captured output, in English or
//! in the French locale the server runs with.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static PRISTINE_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)E155010|E155032|texte de référence|pristine text").expect("valid regex")
});

static LOCK_SIGNATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)E155004|verrouillée|' locked").expect("valid regex"));

static SHA1: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9a-fA-F]{40}\b").expect("valid regex"));

/// A fault the runner knows how to repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The pristine copy with this SHA-1 is missing from the working copy
    MissingPristine { working_copy: PathBuf, sha1: String },
    /// The working copy is locked by an interrupted operation
    StaleLock { working_copy: PathBuf },
}

impl Fault {
    pub fn working_copy(&self) -> &Path {
        match self {
            Self::MissingPristine { working_copy, .. } | Self::StaleLock { working_copy } => {
                working_copy
            },
        }
    }
}

/// Recognises [`Fault`]s in the output of a failed command
#[derive(Debug, Clone)]
pub struct FaultClassifier {
    working_copy_root: String,
}

impl FaultClassifier {
    /// `working_copy_root` is the directory prefix shared by all working copies
    pub fn new(working_copy_root: impl Into<String>) -> Self {
        Self {
            working_copy_root: working_copy_root.into(),
        }
    }

    /// First repairable fault in `lines`, in output order
    pub fn classify(&self, command: &str, lines: &[String]) -> Option<Fault> {
        lines.iter().find_map(|line| {
            if PRISTINE_SIGNATURE.is_match(line) {
                self.missing_pristine(command, line)
            } else if LOCK_SIGNATURE.is_match(line) {
                self.stale_lock(line)
            } else {
                None
            }
        })
    }

    /// The working copy is named by the failing command, not the message
    fn missing_pristine(&self, command: &str, line: &str) -> Option<Fault> {
        let sha1 = SHA1.find(line)?.as_str().to_ascii_lowercase();
        let start = command.find(&self.working_copy_root)?;
        let rest = &command[start..];
        let end = rest.find(['"', ';']).unwrap_or(rest.len());
        let mut working_copy = PathBuf::from(rest[..end].trim());
        if working_copy.is_file() {
            working_copy.pop();
        }
        if working_copy.as_os_str().is_empty() {
            return None;
        }
        Some(Fault::MissingPristine { working_copy, sha1 })
    }

    /// The lock message quotes the locked directory
    fn stale_lock(&self, line: &str) -> Option<Fault> {
        let start = line.find(&self.working_copy_root)?;
        let rest = &line[start..];
        let end = rest.rfind('\'').unwrap_or(rest.len());
        let working_copy = rest[..end].trim();
        if working_copy.is_empty() {
            return None;
        }
        Some(Fault::StaleLock {
            working_copy: PathBuf::from(working_copy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/var/cache/trac/tickets/";
    const SHA: &str = "0a4d55a8d778e5022fab701977c5d840bbc486d0";

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_missing_pristine_in_english() {
        let classifier = FaultClassifier::new(ROOT);
        let command = r#"svn update --non-interactive "/var/cache/trac/tickets/E05058/t42/doc""#;
        let output = lines(&[
            "svn: E155010: Update failed",
            &format!("svn: E155032: Pristine text with checksum '$sha1${SHA}' was not found"),
        ]);

        let fault = classifier.classify(command, &output).unwrap();
        assert_eq!(
            fault,
            Fault::MissingPristine {
                working_copy: PathBuf::from("/var/cache/trac/tickets/E05058/t42/doc"),
                sha1: SHA.to_string(),
            }
        );
    }

    #[test]
    fn test_missing_pristine_in_french() {
        let classifier = FaultClassifier::new(ROOT);
        let command = "cd /var/cache/trac/tickets/E05058/t7;svn commit -m x";
        let output = lines(&[&format!(
            "svn: E155032: Le texte de référence de somme de contrôle '{SHA}' est introuvable"
        )]);

        let fault = classifier.classify(command, &output).unwrap();
        assert_eq!(fault.working_copy(), Path::new("/var/cache/trac/tickets/E05058/t7"));
    }

    #[test]
    fn test_pristine_without_checksum_is_not_repairable() {
        let classifier = FaultClassifier::new(ROOT);
        let command = r#"svn update "/var/cache/trac/tickets/E05058/t42""#;
        let output = lines(&["svn: E155010: pristine text missing"]);

        assert_eq!(classifier.classify(command, &output), None);
    }

    #[test]
    fn test_pristine_outside_working_copy_root_is_not_repairable() {
        let classifier = FaultClassifier::new(ROOT);
        let output = lines(&[&format!("svn: E155032: Pristine text '{SHA}' not found")]);

        assert_eq!(classifier.classify("svn update /home/me/wc", &output), None);
    }

    #[test]
    fn test_stale_lock_in_french() {
        let classifier = FaultClassifier::new(ROOT);
        let output = lines(&[
            "svn: E155004: La copie de travail '/var/cache/trac/tickets/E05058/t9' est verrouillée.",
        ]);

        let fault = classifier.classify("svn update", &output).unwrap();
        assert_eq!(
            fault,
            Fault::StaleLock {
                working_copy: PathBuf::from("/var/cache/trac/tickets/E05058/t9"),
            }
        );
    }

    #[test]
    fn test_stale_lock_in_english() {
        let classifier = FaultClassifier::new(ROOT);
        let output = lines(&["svn: E155004: Working copy '/var/cache/trac/tickets/P/t1' locked."]);

        let fault = classifier.classify("svn commit", &output).unwrap();
        assert_eq!(fault.working_copy(), Path::new("/var/cache/trac/tickets/P/t1"));
    }

    #[test]
    fn test_unrelated_failure_is_not_classified() {
        let classifier = FaultClassifier::new(ROOT);
        let output = lines(&["svn: E170000: URL 'https://svn/x' doesn't exist"]);

        assert_eq!(classifier.classify("svn info https://svn/x", &output), None);
    }
}
