//! Work history
//!
//! An entry is either a single position (`title`, `Company · Type` line,
//! dates, location) or a company header with the positions held there nested
//! as sub-entries.

use scraper::{ElementRef, Html};

use super::dom::{find_section, own_text, sub_items, top_level_items, ItemSelectors};
use super::selectors::EXPERIENCE;
use super::{Experience, ProfileSection, SectionExtractor, SectionKind};
use crate::error::ExtractError;

/// `Acme Corp · Full-time` -> (`Acme Corp`, `Full-time`)
fn split_company_line(line: Option<String>) -> (Option<String>, Option<String>) {
    let Some(line) = line else {
        return (None, None);
    };
    let mut parts = line.split('\u{b7}').map(str::trim).filter(|p| !p.is_empty());
    let company = parts.next().map(str::to_string);
    let employment_type = parts.next().map(str::to_string);
    (company, employment_type)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExperienceExtractor;

impl ExperienceExtractor {
    fn position(
        &self,
        s: &ItemSelectors,
        item: &ElementRef<'_>,
        title: String,
        company: Option<String>,
        employment_type: Option<String>,
        company_url: Option<String>,
    ) -> Experience {
        let (date_range, location) = s.dates_and_location(item);
        Experience {
            title,
            company,
            employment_type,
            date_range,
            location,
            description: own_text(item, &s.description),
            company_url,
        }
    }
}

impl SectionExtractor for ExperienceExtractor {
    fn kind(&self) -> SectionKind {
        SectionKind::Experience
    }

    fn extract(&self, document: &Html) -> Result<ProfileSection, ExtractError> {
        let Some(scope) = find_section(document, &EXPERIENCE)? else {
            return Ok(ProfileSection::Experience(Vec::new()));
        };
        let s = ItemSelectors::compile()?;
        let mut entries = Vec::new();

        for (index, item) in top_level_items(&scope)?.iter().enumerate() {
            let title = own_text(item, &s.title).ok_or_else(|| {
                ExtractError::layout(self.kind().as_str(), format!("entry {} has no title", index + 1))
            })?;
            let company_url = s.href(item, &s.company_link);

            let positions: Vec<_> = sub_items(item)?
                .into_iter()
                .filter_map(|sub| own_text(&sub, &s.title).map(|role| (sub, role)))
                .collect();

            if positions.is_empty() {
                let (company, employment_type) = split_company_line(own_text(item, &s.subtitle));
                entries.push(self.position(&s, item, title, company, employment_type, company_url));
                continue;
            }

            // Grouped: the header's title is the company
            for (sub, role) in positions {
                let (employment_type, _) = split_company_line(own_text(&sub, &s.subtitle));
                let url = s.href(&sub, &s.company_link).or_else(|| company_url.clone());
                entries.push(self.position(&s, &sub, role, Some(title.clone()), employment_type, url));
            }
        }

        Ok(ProfileSection::Experience(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DateRange;

    fn experience(html: &str) -> Result<Vec<Experience>, ExtractError> {
        match ExperienceExtractor.extract_html(html)? {
            ProfileSection::Experience(entries) => Ok(entries),
            other => panic!("unexpected section {:?}", other.kind()),
        }
    }

    const CARD: &str = r#"<html><body><main><section class="artdeco-card">
      <div id="experience" class="pv-profile-card__anchor"></div>
      <div class="pvs-header"><h2><span aria-hidden="true">Experience</span></h2></div>
      <ul>
        <li class="artdeco-list__item">
          <a href="/company/acme/"><img alt="Acme logo"></a>
          <div class="t-bold"><span aria-hidden="true">Senior Engineer</span><span class="visually-hidden">Senior Engineer</span></div>
          <span class="t-14 t-normal"><span aria-hidden="true">Acme Corp · Full-time</span></span>
          <span class="t-14 t-normal t-black--light"><span class="pvs-entity__caption-wrapper" aria-hidden="true">Jan 2020 - Present · 4 yrs</span></span>
          <span class="t-14 t-normal t-black--light"><span aria-hidden="true">Berlin, Germany</span></span>
          <div class="inline-show-more-text"><span aria-hidden="true">Led the   platform team.</span></div>
        </li>
        <li class="artdeco-list__item">
          <div class="t-bold"><span aria-hidden="true">Intern</span></div>
          <span class="t-14 t-normal"><span aria-hidden="true">Initech</span></span>
          <span class="t-14 t-normal t-black--light"><span aria-hidden="true">Summer, some year</span></span>
        </li>
      </ul></section></main></body></html>"#;

    #[test]
    fn test_single_positions() {
        let entries = experience(CARD).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title, "Senior Engineer");
        assert_eq!(first.company.as_deref(), Some("Acme Corp"));
        assert_eq!(first.employment_type.as_deref(), Some("Full-time"));
        assert!(first.date_range.as_ref().unwrap().is_current());
        assert_eq!(first.location.as_deref(), Some("Berlin, Germany"));
        assert_eq!(first.description.as_deref(), Some("Led the platform team."));
        assert_eq!(first.company_url.as_deref(), Some("/company/acme/"));

        let second = &entries[1];
        assert_eq!(second.date_range, Some(DateRange::Raw("Summer, some year".into())));
        assert_eq!(second.location, None);
        assert_eq!(second.employment_type, None);
    }

    #[test]
    fn test_grouped_positions_inherit_company() {
        let html = r#"<main aria-label="Experience"><ul>
          <li class="pvs-list__paged-list-item">
            <a href="https://www.linkedin.com/company/globex/"><span class="t-bold"><span aria-hidden="true">Globex</span></span></a>
            <span class="t-14 t-normal"><span aria-hidden="true">Full-time · 6 yrs</span></span>
            <ul>
              <li class="pvs-list__paged-list-item"><div class="t-bold"><span aria-hidden="true">Director</span></div>
                <span class="t-14 t-normal t-black--light"><span aria-hidden="true">2021 - Present</span></span></li>
              <li class="pvs-list__paged-list-item"><div class="t-bold"><span aria-hidden="true">Manager</span></div>
                <span class="t-14 t-normal t-black--light"><span aria-hidden="true">2018 - 2021</span></span></li>
            </ul>
          </li></ul></main>"#;
        let entries = experience(html).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.company.as_deref() == Some("Globex")));
        assert_eq!(entries[0].title, "Director");
        assert_eq!(entries[1].company_url.as_deref(), Some("https://www.linkedin.com/company/globex/"));
        assert!(!entries[1].date_range.as_ref().unwrap().is_current());
    }

    #[test]
    fn test_missing_section_is_empty() {
        assert!(experience("<html><body><main></main></body></html>").unwrap().is_empty());
    }

    #[test]
    fn test_entry_without_title_is_a_layout_error() {
        let html = r#"<main aria-label="Experience"><ul>
          <li class="pvs-list__paged-list-item"><div class="t-bold"><span>Engineer</span></div></li>
          <li class="pvs-list__paged-list-item"><div class="entity-title">??</div></li>
        </ul></main>"#;
        let err = experience(html).unwrap_err();
        assert_eq!(err, ExtractError::layout("experience", "entry 2 has no title"));
    }
}
