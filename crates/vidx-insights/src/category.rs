//! Feature categories and their extraction shapes.

use std::borrow::Cow;

/// Payload shape of a feature category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionShape {
    /// `[{name, confidence}]`
    Named,
    /// `[{text, confidence}]`
    Textual,
    /// `[{name, instances: [{confidence, ..}]}]`; the value's confidence is
    /// the maximum over its instances.
    InstanceMax,
}

impl ExtractionShape {
    /// Key holding the feature value in each payload item.
    pub fn value_key(&self) -> &'static str {
        match self {
            ExtractionShape::Named | ExtractionShape::InstanceMax => "name",
            ExtractionShape::Textual => "text",
        }
    }
}

/// A category name bound to the shape its payload is extracted with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryRule {
    pub name: Cow<'static, str>,
    pub shape: ExtractionShape,
}

impl CategoryRule {
    pub const fn new(name: &'static str, shape: ExtractionShape) -> Self {
        Self {
            name: Cow::Borrowed(name),
            shape,
        }
    }

    /// Rule for a category name only known at runtime.
    pub fn custom(name: impl Into<String>, shape: ExtractionShape) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            shape,
        }
    }
}

/// The recognized categories, in output order.
pub const DEFAULT_CATEGORIES: &[CategoryRule] = &[
    CategoryRule::new("brands", ExtractionShape::Named),
    CategoryRule::new("topics", ExtractionShape::Named),
    CategoryRule::new("keywords", ExtractionShape::Textual),
    CategoryRule::new("labels", ExtractionShape::InstanceMax),
    CategoryRule::new("ocr", ExtractionShape::Textual),
    CategoryRule::new("namedLocations", ExtractionShape::Named),
];
