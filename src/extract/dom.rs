//! DOM traversal helpers over a parsed snapshot

use scraper::{ElementRef, Html, Selector};

use super::normalize::{non_empty, normalize};
use super::dates::DateRange;
use super::selectors::{
    SectionLayout, COMPANY_LINK, DETAIL_MAIN, ITEM_CAPTION, ITEM_DESCRIPTION, ITEM_LINK, ITEM_META, ITEM_SUBTITLE,
    ITEM_TITLE, LIST_ITEM, SECTION_HEADER,
};
use crate::error::ExtractError;

const HIDDEN_CLASS: &str = "visually-hidden";

pub fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css.to_string()))
}

fn is_hidden(element: &scraper::node::Element) -> bool {
    matches!(element.name(), "script" | "style" | "template") || element.classes().any(|class| class == HIDDEN_CLASS)
}

/// Normalized text as rendered: screen-reader copies (`.visually-hidden`)
/// and script bodies are skipped
pub fn rendered_text(element: &ElementRef<'_>) -> Option<String> {
    let root = element.id();
    let mut parts: Vec<&str> = Vec::new();

    for node in element.descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root)
            .chain(std::iter::once(**element))
            .any(|ancestor| ancestor.value().as_element().is_some_and(is_hidden));
        if !hidden {
            parts.push(&**text);
        }
    }
    non_empty(normalize(&parts.join(" ")))
}

/// Rendered text of the first match of `selector` under `scope`
pub fn first_text(scope: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).find_map(|el| rendered_text(&el))
}

/// Rendered text of the first match of any of `candidates` in the document
pub fn document_text(document: &Html, candidates: &[&str]) -> Result<Option<String>, ExtractError> {
    for css in candidates {
        let selector = compile(css)?;
        if let Some(text) = document.select(&selector).find_map(|el| rendered_text(&el)) {
            return Ok(Some(text));
        }
    }
    Ok(None)
}

/// Locate a section: detail page `main[aria-label]` first, then the card
/// on the profile page identified by its anchor or header
pub fn find_section<'a>(document: &'a Html, layout: &SectionLayout) -> Result<Option<ElementRef<'a>>, ExtractError> {
    let detail = compile(DETAIL_MAIN)?;
    let on_detail_page = document.select(&detail).find(|main| {
        main.value()
            .attr("aria-label")
            .is_some_and(|label| layout.matches_label(label))
    });
    if on_detail_page.is_some() {
        return Ok(on_detail_page);
    }

    let section = compile("section")?;
    let anchor = compile(&format!("#{}", layout.anchor_id))?;
    let header = compile(SECTION_HEADER)?;
    Ok(document.select(&section).find(|card| {
        card.select(&anchor).next().is_some()
            || card
                .select(&header)
                .next()
                .and_then(|h| rendered_text(&h))
                .is_some_and(|text| layout.matches_label(&text))
    }))
}

fn nearest_list_item<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "li")
}

/// Top-level entries of a section; entries nested in another entry are
/// left to `sub_items`
pub fn top_level_items<'a>(scope: &ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, ExtractError> {
    let items = compile(LIST_ITEM)?;
    let scope_id = scope.id();
    Ok(scope
        .select(&items)
        .filter(|item| {
            !item
                .ancestors()
                .take_while(|node| node.id() != scope_id)
                .any(|node| node.value().as_element().is_some_and(|e| e.name() == "li"))
        })
        .collect())
}

/// Entries directly nested in `item` (grouped positions at one company)
pub fn sub_items<'a>(item: &ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, ExtractError> {
    let items = compile(LIST_ITEM)?;
    Ok(item
        .select(&items)
        .filter(|sub| nearest_list_item(sub).is_some_and(|owner| owner.id() == item.id()))
        .collect())
}

/// Matches of `selector` that belong to `item` itself rather than to an
/// entry nested inside it
pub fn own<'a>(item: &ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    let item_id = item.id();
    item.select(selector)
        .filter(|el| nearest_list_item(el).map_or(true, |owner| owner.id() == item_id))
        .collect()
}

pub fn own_text(item: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    own(item, selector).iter().find_map(rendered_text)
}

/// Compiled selectors for the fields of a list entry
pub struct ItemSelectors {
    pub title: Selector,
    pub subtitle: Selector,
    pub meta: Selector,
    pub caption: Selector,
    pub description: Selector,
    pub company_link: Selector,
    pub link: Selector,
}

impl ItemSelectors {
    pub fn compile() -> Result<Self, ExtractError> {
        Ok(Self {
            title: compile(ITEM_TITLE)?,
            subtitle: compile(ITEM_SUBTITLE)?,
            meta: compile(ITEM_META)?,
            caption: compile(ITEM_CAPTION)?,
            description: compile(ITEM_DESCRIPTION)?,
            company_link: compile(COMPANY_LINK)?,
            link: compile(ITEM_LINK)?,
        })
    }

    /// Date caption and location of an entry. The caption wrapper wins;
    /// otherwise the first dimmed line is the date and the next one the
    /// location.
    pub fn dates_and_location(&self, item: &ElementRef<'_>) -> (Option<DateRange>, Option<String>) {
        let caption = own_text(item, &self.caption);
        let lines: Vec<String> = own(item, &self.meta).iter().filter_map(rendered_text).collect();

        let (date_text, rest): (Option<String>, Vec<String>) = match caption {
            Some(caption) => {
                let rest = lines.into_iter().filter(|line| !line.contains(&caption)).collect();
                (Some(caption), rest)
            }
            None => {
                let mut lines = lines.into_iter();
                (lines.next(), lines.collect())
            }
        };
        (date_text.map(|text| DateRange::parse(&text)), rest.into_iter().next())
    }

    pub fn href(&self, item: &ElementRef<'_>, selector: &Selector) -> Option<String> {
        own(item, selector)
            .iter()
            .find_map(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::selectors::{EDUCATION, EXPERIENCE};

    #[test]
    fn test_rendered_text_skips_screen_reader_copy() {
        let doc = Html::parse_fragment(
            r#"<div class="t-bold"><span aria-hidden="true">Staff  Engineer</span><span class="visually-hidden">Staff Engineer</span></div>"#,
        );
        let el = doc.select(&compile(".t-bold").unwrap()).next().unwrap();
        assert_eq!(rendered_text(&el).as_deref(), Some("Staff Engineer"));
    }

    #[test]
    fn test_find_section_both_layouts() {
        let profile = Html::parse_document(
            r#"<main><section><div id="experience"></div><h2>Experience</h2><ul><li class="artdeco-list__item">x</li></ul></section></main>"#,
        );
        assert!(find_section(&profile, &EXPERIENCE).unwrap().is_some());
        assert!(find_section(&profile, &EDUCATION).unwrap().is_none());

        let detail = Html::parse_document(r#"<main aria-label="Education"><ul></ul></main>"#);
        let scope = find_section(&detail, &EDUCATION).unwrap().unwrap();
        assert_eq!(scope.value().name(), "main");
    }

    #[test]
    fn test_nested_items_are_not_top_level() {
        let doc = Html::parse_document(
            r#"<main aria-label="Experience"><ul>
            <li class="pvs-list__paged-list-item"><span class="t-bold">Acme</span>
              <ul><li class="pvs-list__paged-list-item"><span class="t-bold">Lead</span></li>
                  <li class="pvs-list__paged-list-item"><span class="t-bold">Engineer</span></li></ul></li>
            <li class="pvs-list__paged-list-item"><span class="t-bold">Initech</span></li>
            </ul></main>"#,
        );
        let scope = find_section(&doc, &EXPERIENCE).unwrap().unwrap();
        let items = top_level_items(&scope).unwrap();
        assert_eq!(items.len(), 2);

        let title = compile(".t-bold").unwrap();
        assert_eq!(own_text(&items[0], &title).as_deref(), Some("Acme"));
        assert_eq!(sub_items(&items[0]).unwrap().len(), 2);
        assert!(sub_items(&items[1]).unwrap().is_empty());
    }
}
