//! # 区块提取层
//!
//! 将页面快照中的各个资料区块解析为类型化记录。
//!
//! ## 主要功能
//! - **统一接口**: 每个区块实现 `SectionExtractor`，按固定顺序注册在 `ExtractorRegistry` 中
//! - **缺失即为空**: 区块不存在时返回空值；只有页面结构异常时才返回 `ExtractError`
//! - **文本规范化**: 去除不可见字符、解码 HTML 实体、折叠空白（幂等）
//! - **日期解析**: 可识别的日期范围解析为 `{start, end}`，否则原样保留
//! - **两种布局**: 资料页卡片（`section` + 锚点）与详情页（`main[aria-label]`）
//!
//! ## 模块结构
//! - `normalize`: 文本规范化
//! - `dates`: 日期范围解析
//! - `selectors`: 选择器与区块布局定义
//! - `dom`: DOM 遍历辅助函数
//! - `identity`: 姓名、头衔、所在地、简介
//! - `experience`: 工作经历
//! - `education`: 教育经历
//! - `lists`: 技能、语言、证书
//! - `projects`: 项目
//! - `company`: 公司 About 页面
//!
//! ## 使用示例
//! ```rust
//! use profile_oxide::extract::{ExtractorRegistry, SectionExtractor, SectionKind};
//!
//! let registry = ExtractorRegistry::default();
//! assert_eq!(registry.identity().kind(), SectionKind::Identity);
//! assert_eq!(registry.sections()[0].kind(), SectionKind::Experience);
//! ```

pub mod normalize;
pub mod dates;
pub mod selectors;
pub mod dom;
pub mod identity;
pub mod experience;
pub mod education;
pub mod lists;
pub mod projects;
pub mod company;

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ExtractError;
use crate::navigator::TruncationSpec;
use crate::session::traits::Locator;

pub use company::{extract_company, CompanyInfo};
pub use dates::{DateRange, PartialDate};
pub use education::EducationExtractor;
pub use experience::ExperienceExtractor;
pub use identity::IdentityExtractor;
pub use lists::TitleListExtractor;
pub use normalize::normalize;
pub use projects::ProjectsExtractor;
pub use selectors::SectionLayout;

/// Named category of profile data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Identity,
    Experience,
    Education,
    Skills,
    Certifications,
    Languages,
    Projects,
    Companies,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Identity => "identity",
            SectionKind::Experience => "experience",
            SectionKind::Education => "education",
            SectionKind::Skills => "skills",
            SectionKind::Certifications => "certifications",
            SectionKind::Languages => "languages",
            SectionKind::Projects => "projects",
            SectionKind::Companies => "companies",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: Option<String>,
    pub employment_type: Option<String>,
    pub date_range: Option<DateRange>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Raw `href` of the company page link
    pub company_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub degree: Option<String>,
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub date_range: Option<DateRange>,
    pub description: Option<String>,
    pub url: Option<String>,
}

/// Output of one extractor
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileSection {
    Identity(Identity),
    Experience(Vec<Experience>),
    Education(Vec<Education>),
    Skills(Vec<String>),
    Certifications(Vec<String>),
    Languages(Vec<String>),
    Projects(Vec<Project>),
}

impl ProfileSection {
    pub fn kind(&self) -> SectionKind {
        match self {
            ProfileSection::Identity(_) => SectionKind::Identity,
            ProfileSection::Experience(_) => SectionKind::Experience,
            ProfileSection::Education(_) => SectionKind::Education,
            ProfileSection::Skills(_) => SectionKind::Skills,
            ProfileSection::Certifications(_) => SectionKind::Certifications,
            ProfileSection::Languages(_) => SectionKind::Languages,
            ProfileSection::Projects(_) => SectionKind::Projects,
        }
    }

    /// Number of records; identity counts as one
    pub fn len(&self) -> usize {
        match self {
            ProfileSection::Identity(_) => 1,
            ProfileSection::Experience(v) => v.len(),
            ProfileSection::Education(v) => v.len(),
            ProfileSection::Skills(v) | ProfileSection::Certifications(v) | ProfileSection::Languages(v) => v.len(),
            ProfileSection::Projects(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads one section out of a page snapshot.
///
/// Implementations are independent of each other: none may rely on another
/// having run, and none keeps state between calls. A section that is not on
/// the page yields its empty form; `ExtractError` is reserved for markup that
/// no longer matches the expected layout.
pub trait SectionExtractor: Send + Sync {
    fn kind(&self) -> SectionKind;

    /// Element to scroll to before extraction (lazily rendered sections)
    fn anchor(&self) -> Option<Locator> {
        SectionLayout::for_kind(self.kind()).map(|layout| layout.anchor())
    }

    /// Truncation controls to trigger before extraction
    fn truncation(&self) -> Option<TruncationSpec> {
        SectionLayout::for_kind(self.kind()).map(|layout| layout.truncation())
    }

    fn extract(&self, document: &Html) -> Result<ProfileSection, ExtractError>;

    /// Parse `html` and extract from it
    fn extract_html(&self, html: &str) -> Result<ProfileSection, ExtractError> {
        self.extract(&Html::parse_document(html))
    }
}

/// Fixed, ordered set of extractors the assembler runs
pub struct ExtractorRegistry {
    identity: Box<dyn SectionExtractor>,
    sections: Vec<Box<dyn SectionExtractor>>,
}

impl ExtractorRegistry {
    pub fn new(identity: Box<dyn SectionExtractor>) -> Self {
        Self {
            identity,
            sections: Vec::new(),
        }
    }

    pub fn identity(&self) -> &dyn SectionExtractor {
        self.identity.as_ref()
    }

    /// List sections in extraction order
    pub fn sections(&self) -> &[Box<dyn SectionExtractor>] {
        &self.sections
    }

    /// Append an extractor, replacing any registered for the same kind in place
    pub fn register(mut self, extractor: Box<dyn SectionExtractor>) -> Self {
        match self.sections.iter().position(|e| e.kind() == extractor.kind()) {
            Some(index) => self.sections[index] = extractor,
            None => self.sections.push(extractor),
        }
        self
    }

    pub fn without(mut self, kind: SectionKind) -> Self {
        self.sections.retain(|e| e.kind() != kind);
        self
    }

    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|e| e.kind()).collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        ExtractorRegistry::new(Box::new(IdentityExtractor))
            .register(Box::new(ExperienceExtractor))
            .register(Box::new(EducationExtractor))
            .register(Box::new(TitleListExtractor::skills()))
            .register(Box::new(TitleListExtractor::certifications()))
            .register(Box::new(TitleListExtractor::languages()))
            .register(Box::new(ProjectsExtractor))
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("identity", &self.identity.kind())
            .field("sections", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let registry = ExtractorRegistry::default();
        assert_eq!(
            registry.kinds(),
            vec![
                SectionKind::Experience,
                SectionKind::Education,
                SectionKind::Skills,
                SectionKind::Certifications,
                SectionKind::Languages,
                SectionKind::Projects,
            ]
        );
        assert!(registry.identity().truncation().is_none());
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = ExtractorRegistry::default()
            .without(SectionKind::Skills)
            .register(Box::new(EducationExtractor));
        assert_eq!(registry.kinds().len(), 5);
        assert_eq!(registry.kinds()[1], SectionKind::Education);
    }

    #[test]
    fn test_section_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_value(SectionKind::Certifications).unwrap(), "certifications");
        assert_eq!(SectionKind::Companies.to_string(), "companies");
    }
}
