//! Sections that reduce to a list of titles: skills, languages, certifications

use scraper::Html;

use super::dom::{find_section, own_text, top_level_items, ItemSelectors};
use super::selectors::{SectionLayout, CERTIFICATIONS, LANGUAGES, SKILLS};
use super::{ProfileSection, SectionExtractor, SectionKind};
use crate::error::ExtractError;

/// One title per entry; duplicates (the same skill listed twice after
/// expansion) are kept once
#[derive(Debug, Clone, Copy)]
pub struct TitleListExtractor {
    kind: SectionKind,
    layout: SectionLayout,
}

impl TitleListExtractor {
    pub fn skills() -> Self {
        Self {
            kind: SectionKind::Skills,
            layout: SKILLS,
        }
    }

    pub fn languages() -> Self {
        Self {
            kind: SectionKind::Languages,
            layout: LANGUAGES,
        }
    }

    pub fn certifications() -> Self {
        Self {
            kind: SectionKind::Certifications,
            layout: CERTIFICATIONS,
        }
    }

    fn wrap(&self, titles: Vec<String>) -> ProfileSection {
        match self.kind {
            SectionKind::Languages => ProfileSection::Languages(titles),
            SectionKind::Certifications => ProfileSection::Certifications(titles),
            _ => ProfileSection::Skills(titles),
        }
    }
}

impl SectionExtractor for TitleListExtractor {
    fn kind(&self) -> SectionKind {
        self.kind
    }

    fn extract(&self, document: &Html) -> Result<ProfileSection, ExtractError> {
        let Some(scope) = find_section(document, &self.layout)? else {
            return Ok(self.wrap(Vec::new()));
        };
        let s = ItemSelectors::compile()?;

        let mut titles: Vec<String> = Vec::new();
        for (index, item) in top_level_items(&scope)?.iter().enumerate() {
            let title = own_text(item, &s.title).ok_or_else(|| {
                ExtractError::layout(self.kind.as_str(), format!("entry {} has no title", index + 1))
            })?;
            if !titles.contains(&title) {
                titles.push(title);
            }
        }
        Ok(self.wrap(titles))
    }
}
