//! Markup knowledge: every selector the extractors and the navigator rely on
//!
//! The site's markup drifts, so all of it lives here. Two layouts exist for
//! list sections: a card on the profile page (`section` holding an anchor
//! `div#<id>` and an `h2` header) and a detail page
//! (`main[aria-label="<Section>"]`).

use crate::navigator::TruncationSpec;
use crate::session::traits::Locator;

use super::SectionKind;

/// Top-level entries of a list section, both layouts
pub const LIST_ITEM: &str = "li.pvs-list__paged-list-item, li.artdeco-list__item";

/// Entry title (role, school, skill, certification name)
pub const ITEM_TITLE: &str = ".t-bold";
/// Line under the title: `Acme · Full-time`, degree, issuer
pub const ITEM_SUBTITLE: &str = "span.t-14.t-normal:not(.t-black--light)";
/// Dimmed metadata lines: dates, then location
pub const ITEM_META: &str = "span.t-14.t-normal.t-black--light";
pub const ITEM_CAPTION: &str = "span.pvs-entity__caption-wrapper";
pub const ITEM_DESCRIPTION: &str = ".inline-show-more-text";
pub const COMPANY_LINK: &str = r#"a[href*="/company/"]"#;
pub const ITEM_LINK: &str = "a[href]";

pub const SECTION_HEADER: &str = "h2";
pub const DETAIL_MAIN: &str = "main[aria-label]";

/// Identity
pub const NAME: [&str; 3] = ["h1.text-heading-xlarge", ".pv-top-card h1", "h1.top-card-layout__title"];
pub const HEADLINE: [&str; 2] = ["div.text-body-medium", ".top-card-layout__headline"];
pub const LOCATION: [&str; 2] = [
    "span.text-body-small.inline.t-black--light.break-words",
    ".top-card__subline-item",
];
pub const TOP_CARD: &str = ".pv-top-card, .top-card-layout";
pub const TITLE: &str = "title";

/// Company about page
pub const COMPANY_NAME: [&str; 3] = [
    "h1.org-top-card-summary__title",
    "h1.ember-view.t-24.t-black.t-bold",
    "h1.text-heading-xlarge",
];
pub const COMPANY_OVERVIEW: [&str; 4] = [
    "p.break-words.white-space-pre-wrap",
    "div.org-about-us-organization-description__text",
    "div.org-about-module__description",
    "div.org-page-details__description-content",
];
pub const DEFINITION_TERM: &str = "dl dt";

/// In-place "…see more" toggles on long descriptions
const SEE_MORE_BUTTON: &str = "button.inline-show-more-text__button";

/// Where a section lives in both layouts and how it is truncated
#[derive(Debug, Clone, Copy)]
pub struct SectionLayout {
    /// `id` of the card anchor on the profile page
    pub anchor_id: &'static str,
    /// Header text / detail page `aria-label` (matched case-insensitively)
    pub labels: &'static [&'static str],
    /// `/details/<slug>/` detail page
    pub detail_slug: &'static str,
    /// Suffix of the `#navigation-index-see-all-*` link
    pub see_all_id: &'static str,
}

pub const ABOUT: SectionLayout = SectionLayout {
    anchor_id: "about",
    labels: &["About"],
    detail_slug: "about",
    see_all_id: "about",
};

pub const EXPERIENCE: SectionLayout = SectionLayout {
    anchor_id: "experience",
    labels: &["Experience"],
    detail_slug: "experience",
    see_all_id: "experiences",
};

pub const EDUCATION: SectionLayout = SectionLayout {
    anchor_id: "education",
    labels: &["Education"],
    detail_slug: "education",
    see_all_id: "education",
};

pub const SKILLS: SectionLayout = SectionLayout {
    anchor_id: "skills",
    labels: &["Skills"],
    detail_slug: "skills",
    see_all_id: "skills",
};

pub const CERTIFICATIONS: SectionLayout = SectionLayout {
    anchor_id: "licenses_and_certifications",
    labels: &["Licenses", "Certifications"],
    detail_slug: "certifications",
    see_all_id: "licenses-and-certifications",
};

pub const LANGUAGES: SectionLayout = SectionLayout {
    anchor_id: "languages",
    labels: &["Languages", "Language"],
    detail_slug: "languages",
    see_all_id: "languages",
};

pub const PROJECTS: SectionLayout = SectionLayout {
    anchor_id: "projects",
    labels: &["Projects"],
    detail_slug: "projects",
    see_all_id: "projects",
};

impl SectionLayout {
    pub fn for_kind(kind: SectionKind) -> Option<SectionLayout> {
        match kind {
            SectionKind::Experience => Some(EXPERIENCE),
            SectionKind::Education => Some(EDUCATION),
            SectionKind::Skills => Some(SKILLS),
            SectionKind::Certifications => Some(CERTIFICATIONS),
            SectionKind::Languages => Some(LANGUAGES),
            SectionKind::Projects => Some(PROJECTS),
            SectionKind::Identity | SectionKind::Companies => None,
        }
    }

    pub fn matches_label(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.labels.iter().any(|label| text.contains(&label.to_lowercase()))
    }

    /// Scroll target on the profile page
    pub fn anchor(&self) -> Locator {
        Locator::css(format!("#{}", self.anchor_id))
    }

    /// "Show all" controls, most specific first, then the in-place toggles
    pub fn truncation(&self) -> TruncationSpec {
        let mut show_all = vec![Locator::css(format!("#navigation-index-see-all-{}", self.see_all_id))];
        if self.see_all_id == "skills" {
            show_all.push(Locator::css(r#"a[id*="navigation-index-Show-all"][id*="-skills"]"#));
        }
        show_all.push(Locator::css(format!(r#"a[href*="/details/{}"]"#, self.detail_slug)));
        show_all.push(Locator::css(format!("#{} ~ * a", self.anchor_id)).with_text("Show all"));

        let main = self
            .labels
            .iter()
            .map(|label| format!(r#"main[aria-label="{}"] {}"#, label, SEE_MORE_BUTTON))
            .collect::<Vec<_>>()
            .join(", ");
        let see_more = Locator::css(format!("#{} ~ * {}, {}", self.anchor_id, SEE_MORE_BUTTON, main));

        TruncationSpec {
            show_all,
            see_more: Some(see_more),
            landmark: vec![Locator::css("main")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_every_selector_parses() {
        let mut all: Vec<String> = [
            LIST_ITEM,
            ITEM_TITLE,
            ITEM_SUBTITLE,
            ITEM_META,
            ITEM_CAPTION,
            ITEM_DESCRIPTION,
            COMPANY_LINK,
            ITEM_LINK,
            SECTION_HEADER,
            DETAIL_MAIN,
            TOP_CARD,
            TITLE,
            DEFINITION_TERM,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        all.extend(NAME.iter().chain(&HEADLINE).chain(&LOCATION).map(|s| s.to_string()));
        all.extend(COMPANY_NAME.iter().chain(&COMPANY_OVERVIEW).map(|s| s.to_string()));
        for layout in [ABOUT, EXPERIENCE, EDUCATION, SKILLS, CERTIFICATIONS, LANGUAGES, PROJECTS] {
            let spec = layout.truncation();
            all.extend(spec.show_all.iter().map(|l| l.css.clone()));
            all.extend(spec.see_more.iter().map(|l| l.css.clone()));
            all.push(layout.anchor().css);
        }

        for css in all {
            assert!(Selector::parse(&css).is_ok(), "selector does not parse: {}", css);
        }
    }

    #[test]
    fn test_label_matching() {
        assert!(CERTIFICATIONS.matches_label("Licenses & certifications"));
        assert!(LANGUAGES.matches_label("LANGUAGES"));
        assert!(!EXPERIENCE.matches_label("Education"));
    }

    #[test]
    fn test_experience_truncation_prefers_see_all_id() {
        let spec = EXPERIENCE.truncation();
        assert_eq!(spec.show_all[0].css, "#navigation-index-see-all-experiences");
        assert!(spec.see_more.is_some());
        assert_eq!(spec.landmark, vec![Locator::css("main")]);
    }
}
