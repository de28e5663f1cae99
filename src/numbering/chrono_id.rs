//! Chronological ticket identifiers
//!
//! Some ticket types are named after a per-type counter, e.g.
//! `RISK_E05058_HW_0012` or `MOM_E05058_SYS_REV_24-003`. This module knows
//! where each type keeps its counter and how the summary is laid out.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ArtusError, Result};

/// Ticket types that carry a chronological number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChronoKind {
    Efr,
    Ecr,
    Risk,
    Ai,
    Memo,
    Ecm,
    MomReview,
    MomAudit,
}

impl ChronoKind {
    /// Ticket type as stored by the ticketing system
    pub const fn ticket_type(self) -> &'static str {
        match self {
            Self::Efr => "EFR",
            Self::Ecr => "ECR",
            Self::Risk => "RISK",
            Self::Ai => "AI",
            Self::Memo => "MEMO",
            Self::Ecm => "ECM",
            Self::MomReview | Self::MomAudit => "MOM",
        }
    }
}

impl fmt::Display for ChronoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MomReview => f.write_str("MOM-REVIEW"),
            Self::MomAudit => f.write_str("MOM-AUDIT"),
            other => f.write_str(other.ticket_type()),
        }
    }
}

impl FromStr for ChronoKind {
    type Err = ArtusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EFR" => Ok(Self::Efr),
            "ECR" => Ok(Self::Ecr),
            "RISK" => Ok(Self::Risk),
            "AI" => Ok(Self::Ai),
            "MEMO" => Ok(Self::Memo),
            "ECM" => Ok(Self::Ecm),
            "MOM-REVIEW" | "REVIEW" => Ok(Self::MomReview),
            "MOM-AUDIT" | "AUDIT" => Ok(Self::MomAudit),
            _ => Err(ArtusError::InvalidInput(format!(
                "'{s}' has no chronological numbering"
            ))),
        }
    }
}

/// A ticket about to receive (or give back) a chronological number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChronoTicket {
    pub kind: ChronoKind,
    pub program: String,
    pub skill: String,
    /// Whether `SYS` is among the configured skills
    pub sys_skill_enabled: bool,
}

impl ChronoTicket {
    pub fn new(kind: ChronoKind, program: impl Into<String>, skill: impl Into<String>) -> Self {
        Self {
            kind,
            program: program.into(),
            skill: skill.into(),
            sys_skill_enabled: true,
        }
    }

    #[must_use]
    pub const fn with_sys_skill(mut self, enabled: bool) -> Self {
        self.sys_skill_enabled = enabled;
        self
    }

    /// Counter file: `<root>/<env>/tickets/<TYPE>/<TYPE><skill>nb`
    ///
    /// EFR and ECM counters are shared by all skills when `SYS` is enabled;
    /// MOM counters restart every year.
    pub fn counter_path(&self, root: &Path, env_name: &str, today: &impl Datelike) -> PathBuf {
        let skill = match self.kind {
            ChronoKind::Efr | ChronoKind::Ecm if self.sys_skill_enabled => String::new(),
            ChronoKind::MomReview | ChronoKind::MomAudit => {
                format!("{}{}", self.skill, year_suffix(today))
            },
            _ => self.skill.clone(),
        };
        let ticket_type = self.kind.ticket_type();
        root.join(env_name)
            .join("tickets")
            .join(ticket_type)
            .join(format!("{ticket_type}{skill}nb"))
    }

    /// Summary for chronological number `number`
    pub fn summary(&self, number: u64, today: &impl Datelike) -> String {
        let ticket_type = self.kind.ticket_type();
        match self.kind {
            ChronoKind::Efr if self.sys_skill_enabled => {
                format!("{ticket_type}_{}_{number:03}", self.program)
            },
            ChronoKind::Efr | ChronoKind::Ecr | ChronoKind::Memo => {
                format!("{ticket_type}_{}_{}_{number:03}", self.program, self.skill)
            },
            ChronoKind::Risk | ChronoKind::Ai => {
                format!("{ticket_type}_{}_{}_{number:04}", self.program, self.skill)
            },
            ChronoKind::Ecm => format!("{ticket_type}_{}_{number:03}", self.program),
            ChronoKind::MomReview | ChronoKind::MomAudit => {
                let tag = if self.kind == ChronoKind::MomReview { "REV" } else { "AUD" };
                format!(
                    "{ticket_type}_{}_{}_{tag}_{}-{number:03}",
                    self.program,
                    self.skill,
                    year_suffix(today)
                )
            },
        }
    }
}

/// Extract the chronological number back out of a summary
///
/// Returns `None` when the summary does not follow the layout of `kind`.
pub fn chrono_number(kind: ChronoKind, summary: &str) -> Option<u64> {
    let field = match kind {
        ChronoKind::Ecm => summary.split('_').nth(2)?,
        ChronoKind::MomReview | ChronoKind::MomAudit => summary.rsplit('-').next()?,
        _ => summary.rsplit('_').next()?,
    };
    field.parse().ok()
}

fn year_suffix(today: &impl Datelike) -> String {
    format!("{:02}", today.year().rem_euclid(100))
}
