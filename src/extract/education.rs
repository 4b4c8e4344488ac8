//! Education entries: school, degree, dates

use scraper::Html;

use super::dom::{find_section, own_text, top_level_items, ItemSelectors};
use super::selectors::EDUCATION;
use super::{Education, ProfileSection, SectionExtractor, SectionKind};
use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, Default)]
pub struct EducationExtractor;

impl SectionExtractor for EducationExtractor {
    fn kind(&self) -> SectionKind {
        SectionKind::Education
    }

    fn extract(&self, document: &Html) -> Result<ProfileSection, ExtractError> {
        let Some(scope) = find_section(document, &EDUCATION)? else {
            return Ok(ProfileSection::Education(Vec::new()));
        };
        let s = ItemSelectors::compile()?;

        let entries = top_level_items(&scope)?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let school = own_text(item, &s.title).ok_or_else(|| {
                    ExtractError::layout(self.kind().as_str(), format!("entry {} has no school", index + 1))
                })?;
                let (date_range, _) = s.dates_and_location(item);
                Ok(Education {
                    school,
                    degree: own_text(item, &s.subtitle),
                    date_range,
                })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        Ok(ProfileSection::Education(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DateRange, PartialDate};

    fn education(html: &str) -> Result<Vec<Education>, ExtractError> {
        match EducationExtractor.extract_html(html)? {
            ProfileSection::Education(entries) => Ok(entries),
            other => panic!("unexpected section {:?}", other.kind()),
        }
    }

    #[test]
    fn test_profile_card_entry() {
        let html = r#"<main><section><div id="education"></div><h2>Education</h2><ul>
          <li class="artdeco-list__item">
            <div class="t-bold"><span aria-hidden="true">TU M&uuml;nchen</span></div>
            <span class="t-14 t-normal"><span aria-hidden="true">MSc, Computer Science</span></span>
            <span class="t-14 t-normal t-black--light"><span aria-hidden="true">2015 - 2017</span></span>
          </li></ul></section></main>"#;
        let entries = education(html).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].school, "TU München");
        assert_eq!(entries[0].degree.as_deref(), Some("MSc, Computer Science"));
        assert_eq!(
            entries[0].date_range,
            Some(DateRange::Parsed {
                start: PartialDate { year: 2015, month: None },
                end: Some(PartialDate { year: 2017, month: None }),
            })
        );
    }

    #[test]
    fn test_entry_without_school_fails_whole_section() {
        let html = r#"<main aria-label="Education"><ul>
          <li class="pvs-list__paged-list-item"><span class="t-14 t-normal"><span aria-hidden="true">BSc</span></span></li>
        </ul></main>"#;
        assert!(matches!(education(html), Err(ExtractError::Layout { .. })));
    }
}
