//! Company About pages
//!
//! Reached from current positions that link a `/company/` page. Details are
//! read from the definition list (`dt` label, `dd` value).

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use super::dom::{compile, document_text, rendered_text};
use super::normalize::{non_empty, normalize};
use super::selectors::{COMPANY_NAME, COMPANY_OVERVIEW, DEFINITION_TERM};
use super::SectionKind;
use crate::error::ExtractError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub url: String,
    pub overview: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub headquarters: Option<String>,
    pub founded: Option<String>,
    pub specialties: Option<String>,
}

impl CompanyInfo {
    fn assign(&mut self, label: &str, value: String) {
        let label = label.to_lowercase();
        let slot = if label.contains("website") {
            &mut self.website
        } else if label.contains("industry") {
            &mut self.industry
        } else if label.contains("company size") || label.contains("employees") {
            &mut self.company_size
        } else if label.contains("headquarters") || label.contains("location") {
            &mut self.headquarters
        } else if label.contains("founded") {
            &mut self.founded
        } else if label.contains("specialties") {
            &mut self.specialties
        } else {
            return;
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// Canonical company page URL: no query, no trailing slash, no sub-page
pub fn company_base_url(url: &str) -> String {
    let url = url.split(['?', '#']).next().unwrap_or(url).trim_end_matches('/');
    match url.split_once("/company/") {
        Some((host, rest)) => {
            let slug = rest.split('/').next().unwrap_or(rest);
            format!("{}/company/{}", host, slug)
        }
        None => url.to_string(),
    }
}

pub fn about_url(url: &str) -> String {
    format!("{}/about/", company_base_url(url))
}

fn slug_name(url: &str) -> String {
    let base = company_base_url(url);
    let slug = base.rsplit('/').next().unwrap_or(&base);
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The `dd` siblings following a `dt`, up to the next `dt`
fn definition_value(term: &ElementRef<'_>) -> Option<String> {
    let values: Vec<String> = term
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| el.value().name() != "dt")
        .filter(|el| el.value().name() == "dd")
        .filter_map(|dd| rendered_text(&dd))
        .collect();
    non_empty(normalize(&values.join(" ")))
}

pub fn extract_company(document: &Html, url: &str) -> Result<CompanyInfo, ExtractError> {
    let mut info = CompanyInfo {
        name: document_text(document, &COMPANY_NAME)?.unwrap_or_else(|| slug_name(url)),
        url: company_base_url(url),
        overview: document_text(document, &COMPANY_OVERVIEW)?,
        ..Default::default()
    };

    let terms = compile(DEFINITION_TERM)?;
    for term in document.select(&terms) {
        let (Some(label), Some(value)) = (rendered_text(&term), definition_value(&term)) else {
            continue;
        };
        info.assign(&label, value);
    }

    if info.name.is_empty() {
        return Err(ExtractError::layout(SectionKind::Companies.as_str(), format!("no company name for {}", url)));
    }
    Ok(info)
}
