//! Search API response shapes

use serde::{Deserialize, Serialize};

/// Author object embedded in a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostAuthor {
    /// Author identifier
    pub id: u64,
}

/// One post as returned by the search API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPost {
    /// Post identifier
    pub id: u64,
    /// Creation time, e.g. `Wed Feb 23 10:00:00 +0000 2022`
    pub created_at: String,
    /// Author
    pub user: PostAuthor,
    /// Client anchor, e.g. `<a href="...">Twitter for iPhone</a>`
    #[serde(default)]
    pub source: String,
    /// Set when the post replies to another user
    #[serde(default)]
    pub in_reply_to_user_id: Option<u64>,
    /// Post quotes another post
    #[serde(default)]
    pub is_quote_status: bool,
    /// Repost count
    #[serde(default)]
    pub retweet_count: u64,
    /// Quote count (premium tiers only)
    #[serde(default)]
    pub quote_count: Option<u64>,
    /// Like count
    #[serde(default)]
    pub favorite_count: u64,
    /// Reply count (premium tiers only)
    #[serde(default)]
    pub reply_count: Option<u64>,
    /// Language code
    #[serde(default)]
    pub lang: String,
    /// Post body
    #[serde(alias = "full_text")]
    pub text: String,
}

impl RawPost {
    /// Client label from the source anchor
    ///
    /// Falls back to the raw source when it is not an HTML anchor.
    pub fn source_label(&self) -> &str {
        self.source
            .split_once('>')
            .and_then(|(_, rest)| rest.split_once('<'))
            .map(|(label, _)| label)
            .unwrap_or(self.source.as_str())
            .trim()
    }
}

/// Paging metadata attached to a search response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchMetadata {
    /// Query string for the next page, when the API offers one
    #[serde(default)]
    pub next_results: Option<String>,
    /// Number of posts requested
    #[serde(default)]
    pub count: Option<u32>,
}

/// One page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    /// Posts, newest first
    pub statuses: Vec<RawPost>,
    /// Paging metadata
    #[serde(default)]
    pub search_metadata: Option<SearchMetadata>,
}

impl SearchPage {
    /// Whether the page carries no posts
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Smallest post id on the page
    pub fn min_id(&self) -> Option<u64> {
        self.statuses.iter().map(|post| post.id).min()
    }
}
