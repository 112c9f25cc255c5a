use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier of a user or a post.
/// Platforms hand out both numeric and textual ids, so both are accepted as-is.
/// `1` and `"1"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

macro_rules! int_record_id {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RecordId {
                fn from(id: $t) -> Self {
                    RecordId::Int(i64::from(id))
                }
            }
        )*
    };
}

int_record_id!(i32, i64, u32);

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Text(id)
    }
}

/// A post as supplied by the content platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: RecordId,
    pub content: String,
    /// popularity signal, used for the cold-start fallback
    pub engagement_score: f64,
}

impl Post {
    pub fn new(id: impl Into<RecordId>, content: impl Into<String>, engagement_score: f64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            engagement_score,
        }
    }
}

/// An observed positive engagement of a user with a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "userId")]
    pub user_id: RecordId,
    #[serde(rename = "postId")]
    pub post_id: RecordId,
}

impl Interaction {
    pub fn new(user_id: impl Into<RecordId>, post_id: impl Into<RecordId>) -> Self {
        Self {
            user_id: user_id.into(),
            post_id: post_id.into(),
        }
    }
}

/// Read a JSON array of posts
pub fn load_posts<P: AsRef<Path>>(path: P) -> Result<Vec<Post>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Read a JSON array of interactions
pub fn load_interactions<P: AsRef<Path>>(path: P) -> Result<Vec<Interaction>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
