//! Common test utilities
//!
//! Shared fixtures for the integration tests: a fast configuration, a
//! scripted site with one account, and the markup of a sample profile.

#![allow(dead_code)]

use profile_oxide::assembler::AssembleOptions;
use profile_oxide::session::{MockDocument, MockSite, SessionController};
use profile_oxide::{Config, Credentials, ProfileAssembler};
use std::sync::Arc;
use std::time::Duration;

pub const PROFILE_URL: &str = "https://www.linkedin.com/in/jdoe/";
pub const EXPERIENCE_DETAIL_URL: &str = "https://www.linkedin.com/in/jdoe/details/experience/";
pub const ACME_ABOUT_URL: &str = "https://www.linkedin.com/company/acme/about/";
pub const EMAIL: &str = "jane@example.com";
pub const PASSWORD: &str = "correct horse";

/// Millisecond timeouts, no pacing, no stealth script
pub fn fast_config() -> Config {
    Config {
        load_timeout: 2_000,
        attempt_timeout: 1_000,
        expand_timeout: 1_000,
        scroll_timeout: 500,
        login_timeout: 1_000,
        poll_interval: 5,
        settle_polls: 2,
        max_retries: 1,
        retry_backoff: 5,
        stealth_enabled: false,
        pacing_min: 0,
        pacing_max: 0,
        ..Default::default()
    }
}

pub fn credentials() -> Credentials {
    Credentials::new(EMAIL, PASSWORD)
}

/// Site with the test account and nothing else
pub fn site() -> MockSite {
    let site = MockSite::new();
    site.add_account(EMAIL, PASSWORD);
    site
}

/// Site serving `html` at [`PROFILE_URL`]
pub fn site_with_profile(html: impl Into<String>) -> MockSite {
    let site = site();
    site.add_page(PROFILE_URL, MockDocument::new(html.into()));
    site
}

pub fn controller(site: &MockSite, config: &Config) -> SessionController {
    SessionController::new(Arc::new(site.clone()), config)
}

pub fn assembler(config: &Config) -> ProfileAssembler {
    ProfileAssembler::from_config(
        config,
        AssembleOptions {
            scrape_timeout: Duration::from_secs(10),
            ..Default::default()
        },
    )
}

/// Wrap the given cards into a profile page with Jane's top card
pub fn profile_page(cards: &[&str]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>(3) Jane Doe | LinkedIn</title></head>
<body>
<nav id="global-nav"><a href="/feed/">Home</a></nav>
<main class="scaffold-layout__main">
<section class="artdeco-card pv-top-card">
  <h1 class="text-heading-xlarge">Jane   Doe</h1>
  <div class="text-body-medium break-words">Engineer</div>
  <span class="text-body-small inline t-black--light break-words">Berlin,&nbsp;Germany</span>
</section>
<section class="artdeco-card">
  <div id="about" class="pv-profile-card__anchor"></div>
  <div class="pvs-header"><h2><span aria-hidden="true">About</span></h2></div>
  <div class="inline-show-more-text"><span aria-hidden="true">Building reliable   systems.&#8203;</span></div>
</section>
{}
</main>
</body>
</html>"#,
        cards.join("\n")
    )
}

pub const EXPERIENCE_ITEMS: &str = r#"
  <li class="artdeco-list__item">
    <a href="/company/acme/"><img alt="Acme logo"></a>
    <div class="t-bold"><span aria-hidden="true">Staff Engineer</span><span class="visually-hidden">Staff Engineer</span></div>
    <span class="t-14 t-normal"><span aria-hidden="true">Acme Corp · Full-time</span></span>
    <span class="t-14 t-normal t-black--light"><span class="pvs-entity__caption-wrapper" aria-hidden="true">Jan 2020 - Present · 4 yrs</span></span>
    <span class="t-14 t-normal t-black--light"><span aria-hidden="true">Berlin, Germany</span></span>
  </li>
  <li class="artdeco-list__item">
    <a href="/company/initech/"><img alt="Initech logo"></a>
    <div class="t-bold"><span aria-hidden="true">Engineer</span></div>
    <span class="t-14 t-normal"><span aria-hidden="true">Initech · Contract</span></span>
    <span class="t-14 t-normal t-black--light"><span class="pvs-entity__caption-wrapper" aria-hidden="true">Mar 2015 - Dec 2019 · 4 yrs 10 mos</span></span>
  </li>"#;

/// Experience card with two positions
pub fn experience_card() -> String {
    format!(
        r#"<section class="artdeco-card">
  <div id="experience" class="pv-profile-card__anchor"></div>
  <div class="pvs-header"><h2><span aria-hidden="true">Experience</span></h2></div>
  <ul>{}</ul>
</section>"#,
        EXPERIENCE_ITEMS
    )
}

/// Experience card whose first entry lost its title
pub const MALFORMED_EXPERIENCE_CARD: &str = r#"<section class="artdeco-card">
  <div id="experience" class="pv-profile-card__anchor"></div>
  <div class="pvs-header"><h2><span aria-hidden="true">Experience</span></h2></div>
  <ul>
    <li class="artdeco-list__item">
      <span class="t-14 t-normal"><span aria-hidden="true">Acme Corp</span></span>
    </li>
  </ul>
</section>"#;

/// Education card whose only entry has no school
pub const MALFORMED_EDUCATION_CARD: &str = r#"<section class="artdeco-card">
  <div id="education" class="pv-profile-card__anchor"></div>
  <div class="pvs-header"><h2><span aria-hidden="true">Education</span></h2></div>
  <ul>
    <li class="artdeco-list__item">
      <span class="t-14 t-normal"><span aria-hidden="true">B.Sc. Computer Science</span></span>
    </li>
  </ul>
</section>"#;

pub const SKILLS_CARD: &str = r#"<section class="artdeco-card">
  <div id="skills" class="pv-profile-card__anchor"></div>
  <div class="pvs-header"><h2><span aria-hidden="true">Skills</span></h2></div>
  <ul>
    <li class="artdeco-list__item"><div class="t-bold"><span aria-hidden="true">Rust</span></div></li>
    <li class="artdeco-list__item"><div class="t-bold"><span aria-hidden="true">Distributed Systems</span></div></li>
    <li class="artdeco-list__item"><div class="t-bold"><span aria-hidden="true">Rust</span></div></li>
  </ul>
</section>"#;

/// The reference profile: two positions, one malformed education entry
pub fn jdoe_profile() -> String {
    profile_page(&[&experience_card(), MALFORMED_EDUCATION_CARD])
}

/// Experience card truncated behind a "Show all" link to the detail page
pub const TRUNCATED_EXPERIENCE_CARD: &str = r#"<section class="artdeco-card">
  <div id="experience" class="pv-profile-card__anchor"></div>
  <div class="pvs-header"><h2><span aria-hidden="true">Experience</span></h2></div>
  <ul>
    <li class="artdeco-list__item">
      <div class="t-bold"><span aria-hidden="true">Staff Engineer</span></div>
      <span class="t-14 t-normal"><span aria-hidden="true">Acme Corp · Full-time</span></span>
    </li>
  </ul>
  <div class="pvs-list__footer-wrapper">
    <a id="navigation-index-see-all-experiences" href="/in/jdoe/details/experience/">Show all 3 experiences</a>
  </div>
</section>"#;

/// Detail page listing every position
pub fn experience_detail_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>Experience | Jane Doe | LinkedIn</title></head>
<body><main aria-label="Experience"><ul>{}
  <li class="pvs-list__paged-list-item">
    <div class="t-bold"><span aria-hidden="true">Intern</span></div>
    <span class="t-14 t-normal"><span aria-hidden="true">Globex · Internship</span></span>
    <span class="t-14 t-normal t-black--light"><span aria-hidden="true">2014</span></span>
  </li>
</ul></main></body></html>"#,
        EXPERIENCE_ITEMS.replace("artdeco-list__item", "pvs-list__paged-list-item")
    )
}

pub const ACME_ABOUT_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Acme Corp: About | LinkedIn</title></head>
<body><main>
  <h1 class="org-top-card-summary__title">Acme Corp</h1>
  <p class="break-words white-space-pre-wrap">We make anvils.</p>
  <dl>
    <dt>Website</dt><dd><a href="https://acme.test">https://acme.test</a></dd>
    <dt>Industry</dt><dd>Manufacturing</dd>
    <dt>Company size</dt><dd>51-200 employees</dd>
    <dt>Headquarters</dt><dd>Springfield</dd>
  </dl>
</main></body></html>"#;
