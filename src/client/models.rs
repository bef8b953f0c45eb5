//! Read-back models returned by `GraphReadClient`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node and edge counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Label -> node count
    pub nodes: BTreeMap<String, usize>,
    /// Relation -> edge count
    pub edges: BTreeMap<String, usize>,
}

impl GraphStats {
    pub fn nodes_with(&self, label: &str) -> usize {
        self.nodes.get(label).copied().unwrap_or(0)
    }

    pub fn edges_with(&self, relation: &str) -> usize {
        self.edges.get(relation).copied().unwrap_or(0)
    }
}

/// Authors who posted in one community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMembers {
    pub community: String,
    pub authors: Vec<String>,
}

/// Communities one author posted in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCommunities {
    pub author: String,
    pub communities: Vec<String>,
}

/// A named count (posts per community, mentions per topic)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Posts created on one UTC day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub date: NaiveDate,
    pub count: usize,
}

/// A post as returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_utc: i64,
    pub subreddit: Option<String>,
    pub author: Option<String>,
}

/// Post selection shared by the read queries.
///
/// Every set field must match: `text` is a substring of title or body, `start` /
/// `end` bound `created_utc` inclusively (epoch seconds), and a non-empty
/// `communities` list requires the post to be in one of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostFilter {
    pub text: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[serde(default)]
    pub communities: Vec<String>,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn between(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn communities<I, S>(mut self, communities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.communities = communities.into_iter().map(Into::into).collect();
        self
    }

    /// Test a post against the filter
    pub fn matches(&self, title: &str, selftext: &str, created_utc: i64, community: Option<&str>) -> bool {
        if let Some(text) = &self.text {
            if !title.contains(text.as_str()) && !selftext.contains(text.as_str()) {
                return false;
            }
        }
        if self.start.is_some_and(|s| created_utc < s) {
            return false;
        }
        if self.end.is_some_and(|e| created_utc > e) {
            return false;
        }
        if !self.communities.is_empty() {
            return community.is_some_and(|c| self.communities.iter().any(|x| x == c));
        }
        true
    }
}
