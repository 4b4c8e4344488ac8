//! Identity: name, headline, location and the About summary

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

use super::dom::{compile, document_text, find_section, first_text};
use super::normalize::{non_empty, normalize};
use super::selectors::{ABOUT, HEADLINE, ITEM_DESCRIPTION, LOCATION, NAME, TITLE, TOP_CARD};
use super::{Identity, ProfileSection, SectionExtractor, SectionKind};
use crate::error::ExtractError;
use crate::navigator::TruncationSpec;
use crate::session::traits::Locator;

/// `(3) ` notification counter in front of the document title
static UNREAD_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(\d+\)\s*").expect("valid prefix regex"));

const TITLE_SUFFIX: &str = " | LinkedIn";

/// Name from `<title>`, only trusted on a page with a profile top card
fn name_from_title(document: &Html) -> Result<Option<String>, ExtractError> {
    let top_card = compile(TOP_CARD)?;
    if document.select(&top_card).next().is_none() {
        return Ok(None);
    }

    let title = compile(TITLE)?;
    let Some(raw) = document.select(&title).next().map(|t| t.text().collect::<String>()) else {
        return Ok(None);
    };
    let text = normalize(&raw);
    let text = UNREAD_PREFIX.replace(&text, "");
    let name = text.strip_suffix(TITLE_SUFFIX).unwrap_or(&*text);
    Ok(non_empty(name.trim().to_string()))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityExtractor;

impl SectionExtractor for IdentityExtractor {
    fn kind(&self) -> SectionKind {
        SectionKind::Identity
    }

    fn anchor(&self) -> Option<Locator> {
        None
    }

    fn truncation(&self) -> Option<TruncationSpec> {
        None
    }

    fn extract(&self, document: &Html) -> Result<ProfileSection, ExtractError> {
        let name = match document_text(document, &NAME)? {
            Some(name) => name,
            None => name_from_title(document)?
                .ok_or_else(|| ExtractError::layout(SectionKind::Identity.as_str(), "no profile name on page"))?,
        };

        let summary = match find_section(document, &ABOUT)? {
            Some(about) => first_text(&about, &compile(ITEM_DESCRIPTION)?),
            None => None,
        };

        Ok(ProfileSection::Identity(Identity {
            name,
            headline: document_text(document, &HEADLINE)?,
            location: document_text(document, &LOCATION)?,
            summary,
        }))
    }
}
