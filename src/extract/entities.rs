//! Typed entity mentions: URLs, hashtags and @-mentions

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").expect("url pattern"));
static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag pattern"));
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").expect("mention pattern"));

/// Kind of entity mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "URL")]
    Url,
    Hashtag,
    Mention,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Url => "URL",
            EntityKind::Hashtag => "Hashtag",
            EntityKind::Mention => "Mention",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            EntityKind::Url => &URL,
            EntityKind::Hashtag => &HASHTAG,
            EntityKind::Mention => &MENTION,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "URL" => Ok(EntityKind::Url),
            "Hashtag" => Ok(EntityKind::Hashtag),
            "Mention" => Ok(EntityKind::Mention),
            other => Err(format!("unknown entity kind: {}", other)),
        }
    }
}

/// One entity mention found in a text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub value: String,
}

impl Entity {
    pub fn new(kind: EntityKind, value: impl Into<String>) -> Self {
        Entity {
            kind,
            value: value.into(),
        }
    }
}

/// Every URL, then every hashtag, then every mention in `text`, each group in text
/// order. Repeats are kept.
pub fn extract_entities(text: &str) -> Vec<Entity> {
    [EntityKind::Url, EntityKind::Hashtag, EntityKind::Mention]
        .into_iter()
        .flat_map(|kind| {
            kind.pattern()
                .find_iter(text)
                .map(move |m| Entity::new(kind, m.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_entities() {
        let entities = extract_entities("check https://example.com #finance cc @alice");
        assert_eq!(
            entities,
            vec![
                Entity::new(EntityKind::Url, "https://example.com"),
                Entity::new(EntityKind::Hashtag, "#finance"),
                Entity::new(EntityKind::Mention, "@alice"),
            ]
        );
    }

    #[test]
    fn test_grouped_by_kind_and_duplicates_kept() {
        let entities = extract_entities("@bob says #rust then http://a.io and @bob again");
        let kinds: Vec<_> = entities.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntityKind::Url, EntityKind::Hashtag, EntityKind::Mention, EntityKind::Mention]
        );
        assert_eq!(entities[2].value, "@bob");
        assert_eq!(entities[3].value, "@bob");
    }

    #[test]
    fn test_no_entities() {
        assert!(extract_entities("plain words only").is_empty());
    }

    #[test]
    fn test_kind_round_trip_names() {
        for kind in [EntityKind::Url, EntityKind::Hashtag, EntityKind::Mention] {
            assert_eq!(kind.as_str().parse::<EntityKind>(), Ok(kind));
        }
        assert_eq!(
            serde_json::to_string(&Entity::new(EntityKind::Url, "http://x")).unwrap(),
            r#"{"type":"URL","value":"http://x"}"#
        );
    }
}
