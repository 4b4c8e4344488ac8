//! Page-side JavaScript for the CDP page implementation
//!
//! Every script is an IIFE returning either a primitive or a JSON string.
//! Locators are embedded as JSON literals, never spliced as raw text.

use crate::session::traits::Locator;
use crate::Error;

/// Shared locator resolution: CSS match, then case-insensitive text filter
const FIND_ALL: &str = r#"
const __findAll = (loc) => {
  let nodes;
  try { nodes = Array.from(document.querySelectorAll(loc.css)); } catch (e) { return []; }
  if (!loc.text) return nodes;
  const needle = loc.text.toLowerCase();
  return nodes.filter((el) => ((el.innerText || el.textContent || '') + '').toLowerCase().includes(needle));
};
"#;

fn literal(locator: &Locator) -> Result<String, Error> {
    Ok(serde_json::to_string(locator)?)
}

fn wrap(body: &str) -> String {
    format!("(() => {{{}\n{}\n}})()", FIND_ALL, body)
}

pub const CURRENT_URL: &str = "location.href";

pub const CONTENT: &str = "document.documentElement ? document.documentElement.outerHTML : ''";

pub fn probe(landmarks: &[Locator]) -> Result<String, Error> {
    let landmarks = serde_json::to_string(landmarks)?;
    Ok(wrap(&format!(
        r#"const landmarks = {landmarks};
return JSON.stringify({{
  url: location.href,
  readyState: document.readyState,
  landmarkPresent: landmarks.length === 0 || landmarks.some((l) => __findAll(l).length > 0),
  nodeCount: document.getElementsByTagName('*').length,
  resourceCount: performance.getEntriesByType('resource').length
}});"#
    )))
}

pub fn find(locator: &Locator) -> Result<String, Error> {
    Ok(wrap(&format!(
        r#"const el = __findAll({})[0];
if (!el) return null;
return JSON.stringify({{
  tag: el.tagName.toLowerCase(),
  text: (el.innerText || el.textContent || '').trim(),
  href: el.getAttribute('href'),
  id: el.id || null
}});"#,
        literal(locator)?
    )))
}

pub fn click(locator: &Locator) -> Result<String, Error> {
    Ok(wrap(&format!(
        r#"const el = __findAll({})[0];
if (!el) return false;
el.scrollIntoView({{ block: 'center' }});
el.click();
return true;"#,
        literal(locator)?
    )))
}

pub fn click_all(locator: &Locator) -> Result<String, Error> {
    Ok(wrap(&format!(
        r#"const nodes = __findAll({});
nodes.forEach((el) => {{ el.scrollIntoView({{ block: 'center' }}); el.click(); }});
return nodes.length;"#,
        literal(locator)?
    )))
}

pub fn fill(locator: &Locator, value: &str) -> Result<String, Error> {
    Ok(wrap(&format!(
        r#"const el = __findAll({})[0];
if (!el) return false;
el.focus();
const setter = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value');
if (setter && setter.set) {{ setter.set.call(el, {}); }} else {{ el.value = {1}; }}
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return true;"#,
        literal(locator)?,
        serde_json::to_string(value)?
    )))
}

pub fn scroll_into_view(locator: &Locator) -> Result<String, Error> {
    Ok(wrap(&format!(
        r#"const el = __findAll({})[0];
if (!el) return false;
el.scrollIntoView({{ block: 'center' }});
return true;"#,
        literal(locator)?
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_is_embedded_as_json() {
        let script = click(&Locator::css("a[href*=\"/details/\"]").with_text("Show all")).unwrap();
        assert!(script.contains(r#"{"css":"a[href*=\"/details/\"]","text":"Show all"}"#));
        assert!(script.starts_with("(() => {"));
        assert!(script.ends_with("})()"));
    }

    #[test]
    fn test_fill_value_is_escaped() {
        let script = fill(&Locator::css("input"), "pa\"ss'word").unwrap();
        assert!(script.contains(r#""pa\"ss'word""#));
    }

    #[test]
    fn test_probe_without_landmarks() {
        let script = probe(&[]).unwrap();
        assert!(script.contains("const landmarks = [];"));
    }
}
