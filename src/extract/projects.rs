//! Projects: name, dates, description, external link

use scraper::Html;

use super::dates::DateRange;
use super::dom::{find_section, own_text, top_level_items, ItemSelectors};
use super::selectors::PROJECTS;
use super::{Project, ProfileSection, SectionExtractor, SectionKind};
use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectsExtractor;

impl SectionExtractor for ProjectsExtractor {
    fn kind(&self) -> SectionKind {
        SectionKind::Projects
    }

    fn extract(&self, document: &Html) -> Result<ProfileSection, ExtractError> {
        let Some(scope) = find_section(document, &PROJECTS)? else {
            return Ok(ProfileSection::Projects(Vec::new()));
        };
        let s = ItemSelectors::compile()?;

        let mut projects = Vec::new();
        for (index, item) in top_level_items(&scope)?.iter().enumerate() {
            let name = own_text(item, &s.title).ok_or_else(|| {
                ExtractError::layout(self.kind().as_str(), format!("entry {} has no name", index + 1))
            })?;
            // Project dates sit on the subtitle line
            let date_range = match s.dates_and_location(item) {
                (Some(range), _) => Some(range),
                (None, _) => own_text(item, &s.subtitle).map(|text| DateRange::parse(&text)),
            };
            projects.push(Project {
                name,
                date_range,
                description: own_text(item, &s.description),
                url: s.href(item, &s.link).filter(|href| !href.contains("/in/")),
            });
        }
        Ok(ProfileSection::Projects(projects))
    }
}
