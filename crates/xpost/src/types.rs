//! X API v2 payload shapes and response normalization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Field selections requested alongside tweets.
pub const TWEET_FIELDS: &str = "created_at,author_id,conversation_id,text,public_metrics";
/// Tweet fields for single-tweet and reply-aware lookups.
pub const TWEET_DETAIL_FIELDS: &str =
    "created_at,author_id,conversation_id,in_reply_to_user_id,text,public_metrics";
/// Author fields requested through the `author_id` expansion.
pub const AUTHOR_FIELDS: &str = "username,name";
/// Profile fields for user listings.
pub const USER_LIST_FIELDS: &str = "username,name,public_metrics,description,verified";
/// DM event fields.
pub const DM_EVENT_FIELDS: &str =
    "id,text,event_type,created_at,sender_id,dm_conversation_id,attachments";
/// List fields.
pub const LIST_FIELDS: &str = "description,member_count,follower_count,created_at,private,owner_id";
/// Space fields.
pub const SPACE_FIELDS: &str = "title,host_ids,created_at,participant_count,state,lang,scheduled_start";

/// Author summary merged into tweets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub username: Option<String>,
    pub name: Option<String>,
}

impl Author {
    fn from_user(user: &Value) -> Self {
        let field = |key: &str| user.get(key).and_then(Value::as_str).map(String::from);
        Self {
            username: field("username"),
            name: field("name"),
        }
    }
}

/// Index `includes.users` by id.
#[must_use]
pub fn author_index(includes: Option<&Value>) -> HashMap<String, Author> {
    includes
        .and_then(|inc| inc.get("users"))
        .and_then(Value::as_array)
        .map(|users| {
            users
                .iter()
                .filter_map(|u| {
                    let id = u.get("id")?.as_str()?;
                    Some((id.to_string(), Author::from_user(u)))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Attach `author: {username, name}` to every tweet carrying an `author_id`,
/// using the expansion in `includes`. No-op when the response has no users.
pub fn merge_authors(items: &mut [Value], includes: Option<&Value>) {
    let authors = author_index(includes);
    if authors.is_empty() {
        return;
    }

    for item in items {
        let Some(author_id) = item.get("author_id").and_then(Value::as_str) else {
            continue;
        };
        let author = authors.get(author_id).cloned().unwrap_or_default();
        item["author"] = json!(author);
    }
}

/// A filtered stream rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl StreamRule {
    pub fn new(value: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            id: None,
            value: value.into(),
            tag: tag.filter(|t| !t.is_empty()),
        }
    }
}

/// Pull the first `data` array out of a response; absent or `null` yields
/// nothing.
#[must_use]
pub fn data_items(body: &mut Value) -> Vec<Value> {
    match body.get_mut("data").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// The `data` member of a single-entity response, or the whole body.
#[must_use]
pub fn data_entity(mut body: Value) -> Value {
    match body.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => data,
        _ => body,
    }
}
