//! Declarative selector configuration
//!
//! A [`SelectorConfig`] is an ordered list of named [`SelectorSpec`]s. Each spec
//! is an explicit extraction mode carrying its own compiled CSS selectors, so an
//! invalid selector is rejected when the configuration is built rather than
//! during extraction.

use crate::extract::pattern::TextPattern;
use crate::HarvestError;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compiled CSS selector that remembers its source text
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CssSelector {
    source: String,
    selector: Selector,
}

impl CssSelector {
    /// Compiles a CSS selector
    ///
    /// # Returns
    ///
    /// * `Ok(CssSelector)` - The compiled selector
    /// * `Err(HarvestError::SelectorParse)` - The selector is malformed
    pub fn parse(source: &str) -> Result<Self, HarvestError> {
        let selector = Selector::parse(source).map_err(|e| HarvestError::SelectorParse {
            selector: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    /// The selector text as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled selector
    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Debug for CssSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CssSelector({:?})", self.source)
    }
}

impl PartialEq for CssSelector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl TryFrom<String> for CssSelector {
    type Error = HarvestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CssSelector> for String {
    fn from(value: CssSelector) -> Self {
        value.source
    }
}

/// A named child selector evaluated relative to each parent match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSelector {
    pub name: String,
    pub selector: CssSelector,
}

/// How a single field is extracted from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SelectorSpec {
    /// Trimmed text of every match, in document order
    TextList { selector: CssSelector },

    /// `{text, url}` for every matching anchor with an `href`
    LinkList { selector: CssSelector },

    /// `{url, alt, title}` for every matching image; defaults to all `img`
    ImageList {
        #[serde(default)]
        selector: Option<CssSelector>,
    },

    /// Rows of the first matching table; defaults to the first `table`
    Table {
        #[serde(default)]
        selector: Option<CssSelector>,
    },

    /// One record per parent match, built from child selectors
    NestedRecordList {
        parent: CssSelector,
        children: Vec<ChildSelector>,
    },

    /// Page title plus `name`/`property` meta tags
    Metadata,

    /// Every `<script type="application/ld+json">` block that parses as JSON
    StructuredData,

    /// Emails, phone numbers or dates found in the text of each match;
    /// defaults to `body`
    PatternList {
        #[serde(default)]
        selector: Option<CssSelector>,
        pattern: TextPattern,
    },
}

impl SelectorSpec {
    pub fn text_list(selector: &str) -> Result<Self, HarvestError> {
        Ok(Self::TextList {
            selector: CssSelector::parse(selector)?,
        })
    }

    pub fn link_list(selector: &str) -> Result<Self, HarvestError> {
        Ok(Self::LinkList {
            selector: CssSelector::parse(selector)?,
        })
    }

    pub fn image_list(selector: Option<&str>) -> Result<Self, HarvestError> {
        Ok(Self::ImageList {
            selector: selector.map(CssSelector::parse).transpose()?,
        })
    }

    pub fn table(selector: Option<&str>) -> Result<Self, HarvestError> {
        Ok(Self::Table {
            selector: selector.map(CssSelector::parse).transpose()?,
        })
    }

    /// Builds a nested-record-list spec from a parent selector and `(name, selector)` children
    pub fn nested(parent: &str, children: &[(&str, &str)]) -> Result<Self, HarvestError> {
        let children = children
            .iter()
            .map(|(name, selector)| {
                Ok(ChildSelector {
                    name: (*name).to_string(),
                    selector: CssSelector::parse(selector)?,
                })
            })
            .collect::<Result<Vec<_>, HarvestError>>()?;

        Ok(Self::NestedRecordList {
            parent: CssSelector::parse(parent)?,
            children,
        })
    }

    pub fn metadata() -> Self {
        Self::Metadata
    }

    pub fn structured_data() -> Self {
        Self::StructuredData
    }

    pub fn pattern_list(selector: Option<&str>, pattern: TextPattern) -> Result<Self, HarvestError> {
        Ok(Self::PatternList {
            selector: selector.map(CssSelector::parse).transpose()?,
            pattern,
        })
    }

    /// Short mode name, as written in configuration files
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::TextList { .. } => "text-list",
            Self::LinkList { .. } => "link-list",
            Self::ImageList { .. } => "image-list",
            Self::Table { .. } => "table",
            Self::NestedRecordList { .. } => "nested-record-list",
            Self::Metadata => "metadata",
            Self::StructuredData => "structured-data",
            Self::PatternList { .. } => "pattern-list",
        }
    }
}

/// A named field in a selector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub spec: SelectorSpec,
}

/// Ordered, immutable mapping from field name to selector spec
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorConfig {
    fields: Vec<FieldSpec>,
}

impl SelectorConfig {
    /// Creates an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from field specs, rejecting empty or duplicate names
    pub fn from_fields(fields: Vec<FieldSpec>) -> Result<Self, String> {
        let mut config = Self::new();
        for field in fields {
            config = config.with_field(field.name, field.spec)?;
        }
        Ok(config)
    }

    /// Appends a field, rejecting empty or duplicate names
    pub fn with_field(mut self, name: impl Into<String>, spec: SelectorSpec) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("field name cannot be empty".to_string());
        }
        if self.fields.iter().any(|f| f.name == name) {
            return Err(format!("duplicate field name '{}'", name));
        }
        self.fields.push(FieldSpec { name, spec });
        Ok(self)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
