//! Init script masking the most common automation tells

/// Installed with `Page.addScriptToEvaluateOnNewDocument` so it runs before
/// any site script on every document of the page.
pub const STEALTH_INIT_SCRIPT: &str = r#"
(() => {
  Object.defineProperty(navigator, 'webdriver', { get: () => undefined });

  window.chrome = window.chrome || {};
  window.chrome.runtime = window.chrome.runtime || {};

  Object.defineProperty(navigator, 'plugins', {
    get: () => [
      { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format', length: 1 },
      { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', description: '', length: 1 },
      { name: 'Native Client', filename: 'internal-nacl-plugin', description: '', length: 2 }
    ]
  });

  Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });

  const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
  if (originalQuery) {
    window.navigator.permissions.query = (parameters) =>
      parameters.name === 'notifications'
        ? Promise.resolve({ state: Notification.permission })
        : originalQuery(parameters);
  }
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_hides_webdriver_flag() {
        assert!(STEALTH_INIT_SCRIPT.contains("'webdriver'"));
        assert!(STEALTH_INIT_SCRIPT.contains("chrome.runtime"));
    }
}
