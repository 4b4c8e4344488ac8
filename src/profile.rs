//! Assembled profile record and scrape diagnostics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::extract::{CompanyInfo, Education, Experience, Identity, ProfileSection, Project, SectionKind};

/// How a section ended up in the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    /// Extracted with at least one record
    Extracted,
    /// Present or absent on the page, but no records
    Empty,
    /// Extracted from a page whose truncation controls could not be expanded
    Truncated,
    /// Layout did not match; the value is empty
    Failed,
    NotRequested,
}

/// Where in the pipeline a diagnostic was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStage {
    Scroll,
    Expand,
    Snapshot,
    Extract,
    Restore,
    Company,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Non-fatal problem attached to one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub section: SectionKind,
    pub stage: DiagnosticStage,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning<M: Into<String>>(section: SectionKind, stage: DiagnosticStage, message: M) -> Self {
        Self {
            section,
            stage,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error<M: Into<String>>(section: SectionKind, stage: DiagnosticStage, message: M) -> Self {
        Self {
            section,
            stage,
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{} [{} / {:?}]: {}", severity, self.section, self.stage, self.message)
    }
}

/// One scraped profile. Absent identity fields are `null`, list sections
/// are `[]`, and `sections` tells "failed" apart from "empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub certifications: Vec<String>,
    pub projects: Vec<Project>,
    pub companies: Vec<CompanyInfo>,
    pub sections: BTreeMap<SectionKind, SectionStatus>,
}

impl Profile {
    /// Start from the identity; every list section is `not_requested` until
    /// the assembler reaches it
    pub fn new<S: Into<String>>(url: S, identity: Identity) -> Self {
        let sections = [
            SectionKind::Experience,
            SectionKind::Education,
            SectionKind::Skills,
            SectionKind::Certifications,
            SectionKind::Languages,
            SectionKind::Projects,
            SectionKind::Companies,
        ]
        .into_iter()
        .map(|kind| (kind, SectionStatus::NotRequested))
        .chain(std::iter::once((SectionKind::Identity, SectionStatus::Extracted)))
        .collect();

        Self {
            url: url.into(),
            fetched_at: Utc::now(),
            name: identity.name,
            headline: identity.headline,
            location: identity.location,
            summary: identity.summary,
            experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            languages: Vec::new(),
            certifications: Vec::new(),
            projects: Vec::new(),
            companies: Vec::new(),
            sections,
        }
    }

    /// Store an extracted section. `truncated` marks a section whose
    /// expansion failed.
    pub fn apply(&mut self, section: ProfileSection, truncated: bool) {
        let kind = section.kind();
        let status = if truncated {
            SectionStatus::Truncated
        } else if section.is_empty() {
            SectionStatus::Empty
        } else {
            SectionStatus::Extracted
        };

        match section {
            ProfileSection::Identity(identity) => {
                self.name = identity.name;
                self.headline = identity.headline;
                self.location = identity.location;
                self.summary = identity.summary;
            }
            ProfileSection::Experience(v) => self.experience = v,
            ProfileSection::Education(v) => self.education = v,
            ProfileSection::Skills(v) => self.skills = v,
            ProfileSection::Certifications(v) => self.certifications = v,
            ProfileSection::Languages(v) => self.languages = v,
            ProfileSection::Projects(v) => self.projects = v,
        }
        self.sections.insert(kind, status);
    }

    /// Empty the section and flag it as failed
    pub fn fail(&mut self, kind: SectionKind) {
        match kind {
            SectionKind::Experience => self.experience.clear(),
            SectionKind::Education => self.education.clear(),
            SectionKind::Skills => self.skills.clear(),
            SectionKind::Certifications => self.certifications.clear(),
            SectionKind::Languages => self.languages.clear(),
            SectionKind::Projects => self.projects.clear(),
            SectionKind::Companies => self.companies.clear(),
            SectionKind::Identity => {}
        }
        self.sections.insert(kind, SectionStatus::Failed);
    }

    pub fn status(&self, kind: SectionKind) -> Option<SectionStatus> {
        self.sections.get(&kind).copied()
    }

    pub fn set_status(&mut self, kind: SectionKind, status: SectionStatus) {
        self.sections.insert(kind, status);
    }
}

/// Overall result of a scrape that produced a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Complete,
    Partial,
}

/// A profile plus the diagnostics collected while building it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeReport {
    #[serde(flatten)]
    pub profile: Profile,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScrapeReport {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn outcome(&self) -> Outcome {
        if self.diagnostics.is_empty() {
            Outcome::Complete
        } else {
            Outcome::Partial
        }
    }

    /// Sections flagged as failed, in section order
    pub fn failed_sections(&self) -> Vec<SectionKind> {
        self.profile
            .sections
            .iter()
            .filter(|(_, status)| **status == SectionStatus::Failed)
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jane() -> Profile {
        Profile::new(
            "https://www.linkedin.com/in/jdoe/",
            Identity {
                name: "Jane Doe".into(),
                headline: Some("Engineer".into()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_absent_fields_serialize_explicitly() {
        let value = serde_json::to_value(ScrapeReport::new(jane())).unwrap();
        assert_eq!(value["name"], "Jane Doe");
        assert_eq!(value["location"], json!(null));
        assert_eq!(value["summary"], json!(null));
        assert_eq!(value["experience"], json!([]));
        assert_eq!(value["companies"], json!([]));
        assert_eq!(value["sections"]["skills"], "not_requested");
        assert_eq!(value["sections"]["identity"], "extracted");
        assert_eq!(value["diagnostics"], json!([]));
    }

    #[test]
    fn test_apply_and_fail_statuses() {
        let mut profile = jane();
        profile.apply(ProfileSection::Skills(vec!["Rust".into()]), false);
        profile.apply(ProfileSection::Languages(Vec::new()), false);
        profile.apply(ProfileSection::Projects(Vec::new()), true);
        profile.fail(SectionKind::Education);

        assert_eq!(profile.status(SectionKind::Skills), Some(SectionStatus::Extracted));
        assert_eq!(profile.status(SectionKind::Languages), Some(SectionStatus::Empty));
        assert_eq!(profile.status(SectionKind::Projects), Some(SectionStatus::Truncated));
        assert_eq!(profile.status(SectionKind::Education), Some(SectionStatus::Failed));
        assert!(profile.education.is_empty());
    }

    #[test]
    fn test_outcome_and_failed_sections() {
        let mut report = ScrapeReport::new(jane());
        assert_eq!(report.outcome(), Outcome::Complete);

        report.profile.fail(SectionKind::Experience);
        report.push(Diagnostic::error(SectionKind::Experience, DiagnosticStage::Extract, "no title"));
        assert_eq!(report.outcome(), Outcome::Partial);
        assert_eq!(report.failed_sections(), vec![SectionKind::Experience]);
        assert!(report.diagnostics[0].to_string().contains("experience"));
    }
}
