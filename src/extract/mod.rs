//! Text feature extraction
//!
//! Pure functions over post text: ranked topic keywords, typed entity mentions and
//! search terms for free-text questions. Nothing here touches the graph.

pub mod entities;
pub mod query;
pub mod topics;

pub use entities::{extract_entities, Entity, EntityKind};
pub use query::extract_query_terms;
pub use topics::{extract_topics, is_noisy, is_stopword, DEFAULT_TOPIC_COUNT, MIN_TEXT_CHARS};

use serde::Serialize;

/// Topics and entities of one text
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextFeatures {
    pub topics: Vec<String>,
    pub entities: Vec<Entity>,
}

/// Run both extractors over `text`
pub fn extract_features(text: &str, topic_count: usize) -> TextFeatures {
    TextFeatures {
        topics: extract_topics(text, topic_count),
        entities: extract_entities(text),
    }
}
