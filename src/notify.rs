//! PDF printing job notifications
//!
//! When a batch conversion of tickets to PDF completes, the requester gets a
//! mail with the download link of the resulting archive.

use crate::browser::hostname;
use crate::config::Settings;
use crate::directory::{DirectoryResolver, SpecifiedEmailStore, resolve_email, transliterate};
use crate::error::{ArtusError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tera::{Context, Tera};

const TEXT_TEMPLATE: &str = "\
You have submitted a job of ticket(s) conversion to PDF. The job has just completed.

The tickets attachments, when they exist, are attached to the PDF files (ie included).

Here is the link to download the zip file containing the PDF files:

{{ link }}

This link will remain valid at least for 10 days. After that, the zip file will be removed.

You may reply to this mail if something goes wrong.

TRAC Admin";

/// A named mail address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub display_name: String,
    pub email: String,
}

impl Address {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    /// Address of a registered user
    ///
    /// The display name comes from `display_names` (username when absent).
    /// A user without any email address is a directory error.
    pub fn of_user(
        username: &str,
        resolver: &DirectoryResolver,
        store: &dyn SpecifiedEmailStore,
        display_names: &HashMap<String, String>,
    ) -> Result<Self> {
        let email = resolve_email(resolver, store, username)?
            .ok_or_else(|| ArtusError::Directory(format!("No email address for '{username}'")))?;
        let display_name = display_names.get(username).map_or(username, String::as_str);
        Ok(Self::new(display_name, email))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" <{}>", transliterate(&self.display_name), self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BodyKind {
    Plain,
    Html,
}

/// A mail ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub envelope_from: String,
    pub recipients: Vec<String>,
    pub headers: Vec<(String, String)>,
    pub body_kind: BodyKind,
    pub body: String,
}

impl Message {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// RFC 5322 rendering
    pub fn to_rfc5322(&self) -> String {
        let mut text = String::new();
        for (name, value) in &self.headers {
            text.push_str(&format!("{name}: {value}\r\n"));
        }
        let subtype = match self.body_kind {
            BodyKind::Plain => "plain",
            BodyKind::Html => "html",
        };
        text.push_str("MIME-Version: 1.0\r\n");
        text.push_str(&format!("Content-Type: text/{subtype}; charset=\"utf-8\"\r\n"));
        text.push_str("Content-Transfer-Encoding: 8bit\r\n\r\n");
        text.push_str(&self.body.replace('\n', "\r\n"));
        text.push_str("\r\n");
        text
    }
}

/// Mail delivery
#[cfg_attr(test, mockall::automock)]
pub trait MailTransport {
    fn send(&self, message: &Message) -> Result<()>;
}

/// Delivery through the local `sendmail` binary
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    program: PathBuf,
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new("/usr/sbin/sendmail")
    }
}

impl SendmailTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl MailTransport for SendmailTransport {
    fn send(&self, message: &Message) -> Result<()> {
        let mut child = Command::new(&self.program)
            .arg("-oi")
            .arg("-f")
            .arg(&message.envelope_from)
            .args(&message.recipients)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ArtusError::Mail(format!("cannot start {}: {e}", self.program.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message.to_rfc5322().as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ArtusError::Mail(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        tracing::info!("Mail sent to {}", message.recipients.join(", "));
        Ok(())
    }
}

/// Notice sent when a PDF printing job completes
#[derive(Debug, Clone)]
pub struct PdfJobNotice {
    scheme: String,
    hostname: String,
    project_name: String,
    project_description: String,
    sender: Address,
    html_template: Option<PathBuf>,
}

impl PdfJobNotice {
    pub fn new(settings: &Settings) -> Result<Self> {
        let project = &settings.project;
        let hostname = hostname(&project.scheme, &project.base_url).ok_or_else(|| {
            tracing::error!("Base URL '{}' does not match scheme '{}'", project.base_url, project.scheme);
            ArtusError::config("base_url does not match scheme")
        })?;
        Ok(Self {
            scheme: project.scheme.clone(),
            hostname,
            project_name: project.project_name.clone(),
            project_description: project.project_description.clone(),
            sender: Address::new(&settings.mail.smtp_from_name, &settings.mail.smtp_from),
            html_template: settings.mail.html_template.clone(),
        })
    }

    /// Download link of the archive built under `base_path`
    ///
    /// The job directory's parent names the environment:
    /// `.../E05058/job42` → `<scheme>://<host>/tracs/E05058/PDF-printing/job42.zip`.
    pub fn link(&self, base_path: &Path) -> String {
        let (env, job) = split_job_path(base_path);
        format!(
            "{}://{}/tracs/{}/PDF-printing/{}.zip",
            self.scheme, self.hostname, env, job
        )
    }

    fn context(&self, base_path: &Path) -> Context {
        let mut context = Context::new();
        context.insert("scheme", &self.scheme);
        context.insert("host_url", &format!("{}://{}", self.scheme, self.hostname));
        context.insert("host", self.hostname.split('.').next().unwrap_or_default());
        context.insert("project_name", &self.project_name);
        context.insert("project_desc", &self.project_description);
        context.insert("link", &self.link(base_path));
        context
    }

    /// Message body, HTML when a template is configured and present
    pub fn render_body(&self, base_path: &Path) -> Result<(BodyKind, String)> {
        let context = self.context(base_path);
        if let Some(path) = self.html_template.as_deref().filter(|p| p.exists()) {
            let source = std::fs::read_to_string(path)?;
            return Ok((BodyKind::Html, Tera::one_off(&source, &context, true)?));
        }
        Ok((BodyKind::Plain, Tera::one_off(TEXT_TEMPLATE, &context, false)?))
    }

    /// Complete message from `requester` to themself
    pub fn build(&self, base_path: &Path, requester: &Address, admin: &Address) -> Result<Message> {
        let (_, job) = split_job_path(base_path);
        let (body_kind, body) = self.render_body(base_path)?;
        let version = env!("CARGO_PKG_VERSION");
        let from = requester.to_string();

        let headers = vec![
            ("X-Mailer".to_string(), format!("artus-util v{version}")),
            ("X-ArtusUtil-Version".to_string(), version.to_string()),
            ("X-Trac-Project".to_string(), self.project_name.clone()),
            ("Precedence".to_string(), "bulk".to_string()),
            ("Auto-Submitted".to_string(), "auto-generated".to_string()),
            ("Accept-Language".to_string(), "en-GB".to_string()),
            ("Content-Language".to_string(), "en-GB".to_string()),
            ("Subject".to_string(), format!("TRAC PDF printing job: {job}")),
            ("From".to_string(), from.clone()),
            ("Sender".to_string(), self.sender.to_string()),
            ("To".to_string(), from),
            ("Reply-To".to_string(), admin.to_string()),
        ];

        Ok(Message {
            envelope_from: requester.email.clone(),
            recipients: vec![requester.email.clone()],
            headers,
            body_kind,
            body,
        })
    }

    /// Build and deliver the notice
    pub fn send(
        &self,
        transport: &dyn MailTransport,
        base_path: &Path,
        requester: &Address,
        admin: &Address,
    ) -> Result<Message> {
        let message = self.build(base_path, requester, admin)?;
        transport.send(&message)?;
        Ok(message)
    }
}

fn split_job_path(base_path: &Path) -> (String, String) {
    let job = base_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let env = base_path
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (env, job)
}
