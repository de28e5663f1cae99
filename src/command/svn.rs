//! Subversion command lines
//!
//! Every `svn` invocation goes through the shared service account and never
//! prompts.

use super::CommandRunner;
use crate::browser::strip_revision;
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static COPY_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((?:de|from) (/(?:trunk|branches)[^:)]*):(\d+)\)").expect("valid regex")
});

/// `svn <subcommand> --non-interactive --username <user> ` (note the trailing space)
pub fn svn_command(user: &str, subcommand: &str) -> String {
    format!("svn {subcommand} --non-interactive --username {user} ")
}

/// Release stale locks of a working copy
pub fn cleanup_command(user: &str, working_copy: &Path) -> String {
    format!("{}\"{}\"", svn_command(user, "cleanup"), working_copy.display())
}

/// Restore a missing pristine blob from the side-channel store
pub fn fetch_pristine_command(script: &str, working_copy: &Path, sha1: &str) -> String {
    format!("cd \"{}\";{} {}", working_copy.display(), script, sha1)
}

/// Silenced `svn info` probe for `url`
pub fn info_probe(user: &str, url: &str) -> String {
    format!(
        "{}\"{}\" &> /dev/null",
        svn_command(user, "info"),
        strip_revision(url)
    )
}

/// Flat zip archive of `files`, built with `zip`
pub fn archive_command(zip: &str, archive: &Path, files: &[PathBuf]) -> String {
    let quoted: Vec<String> = files
        .iter()
        .map(|f| format!("\"{}\"", f.display()))
        .collect();
    format!("{} -j \"{}\" {}", zip, archive.display(), quoted.join(" "))
}

/// Copy source `(path, revision)` of a `svn log --verbose` line
///
/// Matches both `(from /trunk/x:12)` and the French `(de /trunk/x:12)`.
pub fn copy_source(line: &str) -> Option<(String, String)> {
    let captures = COPY_SOURCE.captures(line)?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

impl CommandRunner {
    /// Whether `url` (revision suffix ignored) exists in the repository
    pub fn exists_in_repo(&self, url: &str, location: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        let probe = info_probe(&self.settings().svn_user, url);
        self.run(&[probe], location).success()
    }

    /// Build a flat zip of `files`, replacing any previous archive
    pub fn create_archive(&self, archive: &Path, files: &[PathBuf], location: &str) -> Result<()> {
        if archive.exists() {
            std::fs::remove_file(archive)?;
        }
        let command = archive_command(&self.settings().zip_program, archive, files);
        self.run_checked(&[command], location)?;
        Ok(())
    }

    /// Trunk or branch path and revision a tag was copied from
    ///
    /// `None` when the tag was not created by a copy (e.g. built by CI).
    pub fn copy_origin(&self, repository_url: &str, location: &str) -> Option<(String, String)> {
        let command = format!(
            "{}\"{}\" | grep -E \"\\((de|from) /(trunk|branches)\"",
            svn_command(&self.settings().svn_user, "log --verbose"),
            repository_url
        );
        let outcome = self.run(&[command], location);
        outcome.lines.first().and_then(|line| copy_source(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArtusError;
    use crate::test_utils::TestEnvironment;

    fn runner(env: &TestEnvironment) -> CommandRunner {
        let settings = crate::config::CommandSettings {
            zip_program: env.bin_dir.join("zip").display().to_string(),
            ..env.command_settings()
        };
        CommandRunner::new(settings)
    }

    #[test]
    fn test_svn_command_template() {
        assert_eq!(
            svn_command("trac", "info"),
            "svn info --non-interactive --username trac "
        );
    }

    #[test]
    fn test_cleanup_quotes_working_copy() {
        assert_eq!(
            cleanup_command("trac", Path::new("/var/cache/trac/tickets/P/t 1")),
            "svn cleanup --non-interactive --username trac \"/var/cache/trac/tickets/P/t 1\""
        );
    }

    #[test]
    fn test_fetch_pristine_runs_in_working_copy() {
        assert_eq!(
            fetch_pristine_command("/srv/fetch.sh", Path::new("/wc"), "abc"),
            "cd \"/wc\";/srv/fetch.sh abc"
        );
    }

    #[test]
    fn test_info_probe_drops_revision_and_is_silenced() {
        let probe = info_probe("trac", "https://svn/repo/trunk/doc?rev=12");
        assert_eq!(
            probe,
            "svn info --non-interactive --username trac \"https://svn/repo/trunk/doc\" &> /dev/null"
        );
        assert!(crate::command::is_silenced(&probe));
    }

    #[test]
    fn test_archive_quotes_each_file() {
        let command = archive_command(
            "/usr/bin/zip",
            Path::new("/tmp/out.zip"),
            &[PathBuf::from("/a/x.pdf"), PathBuf::from("/a/y z.pdf")],
        );
        assert_eq!(command, "/usr/bin/zip -j \"/tmp/out.zip\" \"/a/x.pdf\" \"/a/y z.pdf\"");
    }

    #[test]
    fn test_copy_source_french_and_english() {
        assert_eq!(
            copy_source("   A /tags/versions/DOC_v1 (de /trunk/doc/DOC:1234)"),
            Some(("/trunk/doc/DOC".to_string(), "1234".to_string()))
        );
        assert_eq!(
            copy_source("   A /tags/versions/DOC_v2 (from /branches/B2/DOC:77)"),
            Some(("/branches/B2/DOC".to_string(), "77".to_string()))
        );
        assert_eq!(copy_source("   M /trunk/doc/DOC"), None);
    }

    #[test]
    fn test_create_archive_replaces_previous_archive() {
        let env = TestEnvironment::new();
        // fake zip refuses to append to an existing archive
        env.write_script(
            "zip",
            "archive=\"$2\"; shift 2\n\
             if [ -e \"$archive\" ]; then echo \"stale $archive\"; exit 9; fi\n\
             cat \"$@\" > \"$archive\"\n",
        );
        let first = env.path().join("a.pdf");
        let second = env.path().join("b c.pdf");
        std::fs::write(&first, "A").unwrap();
        std::fs::write(&second, "B").unwrap();
        let archive = env.path().join("job_42.zip");
        std::fs::write(&archive, "old").unwrap();

        runner(&env)
            .create_archive(&archive, &[first, second], crate::here!())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&archive).unwrap(), "AB");
    }

    #[test]
    fn test_create_archive_failure_is_command_failed() {
        let env = TestEnvironment::new();
        env.write_script("zip", "echo \"zip error: Nothing to do!\"; exit 12\n");
        let archive = env.path().join("job_43.zip");

        let err = runner(&env)
            .create_archive(&archive, &[env.path().join("missing.pdf")], crate::here!())
            .unwrap_err();
        match err {
            ArtusError::CommandFailed { code, output } => {
                assert_eq!(code, 12);
                assert_eq!(output, "zip error: Nothing to do!");
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!archive.exists());
    }

    #[test]
    fn test_copy_origin_reads_french_log() {
        let env = TestEnvironment::new();
        env.write_script(
            "svn",
            "echo r1240\n\
             echo 'Chemins modifiés :'\n\
             echo '   A /tags/versions/DOC_v1 (de /trunk/doc/DOC:1234)'\n\
             echo '   M /trunk/doc/DOC/plan.docx'\n",
        );

        let origin = runner(&env).copy_origin("https://svn/E05058/tags/versions/DOC_v1", crate::here!());
        assert_eq!(origin, Some(("/trunk/doc/DOC".to_string(), "1234".to_string())));
    }

    #[test]
    fn test_copy_origin_reads_english_log() {
        let env = TestEnvironment::new();
        env.write_script(
            "svn",
            "echo 'Changed paths:'\n\
             echo '   A /tags/versions/DOC_v2 (from /branches/B2/DOC:77)'\n",
        );

        let origin = runner(&env).copy_origin("https://svn/E05058/tags/versions/DOC_v2", crate::here!());
        assert_eq!(origin, Some(("/branches/B2/DOC".to_string(), "77".to_string())));
    }

    #[test]
    fn test_copy_origin_none_without_copy() {
        let env = TestEnvironment::new();
        env.write_script("svn", "echo 'Changed paths:'\necho '   A /tags/versions/CI_build'\n");

        assert_eq!(runner(&env).copy_origin("https://svn/E05058/tags/versions/CI_build", crate::here!()), None);
    }
}
