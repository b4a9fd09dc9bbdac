//! Video Indexer artifact kinds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON artifacts the indexer exposes per video through its artifact URL endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ArtifactType {
    Ocr,
    Faces,
    VisualContentModeration,
    TextualContentModeration,
    LanguageDetection,
    MultiLanguageDetection,
    Metadata,
    Emotions,
}

impl ArtifactType {
    /// Every artifact collected after indexing completes, in download order.
    pub const ALL: [ArtifactType; 8] = [
        ArtifactType::Ocr,
        ArtifactType::Faces,
        ArtifactType::VisualContentModeration,
        ArtifactType::TextualContentModeration,
        ArtifactType::LanguageDetection,
        ArtifactType::MultiLanguageDetection,
        ArtifactType::Metadata,
        ArtifactType::Emotions,
    ];

    /// Name used both as the `type` query parameter and as the blob suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Ocr => "Ocr",
            ArtifactType::Faces => "Faces",
            ArtifactType::VisualContentModeration => "VisualContentModeration",
            ArtifactType::TextualContentModeration => "TextualContentModeration",
            ArtifactType::LanguageDetection => "LanguageDetection",
            ArtifactType::MultiLanguageDetection => "MultiLanguageDetection",
            ArtifactType::Metadata => "Metadata",
            ArtifactType::Emotions => "Emotions",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
