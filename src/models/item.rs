use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use uuid::Uuid;

/// Prefix shared by every generated item id.
pub const ITEM_ID_PREFIX: &str = "item_";

const ITEM_ID_TOKEN_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Keys written by other tools are carried through rewrites untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields accepted when creating an item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
}

/// Partial update of an item. Only these fields are mutable; `id` and
/// `createdAt` are silently ignored when present in a request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
}

/// The Data document: `{ "items": [...] }`, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemCollection {
    #[serde(default)]
    pub items: Vec<StoredItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the `items` array. Entries that do not read as an [`Item`]
/// (a mistyped field, a missing id) are kept verbatim so a rewrite of the
/// collection does not drop them, and are invisible to lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StoredItem {
    Item(Item),
    Unrecognized(Value),
}

impl Item {
    /// Builds a new item with the given id and the current timestamp.
    /// The caller is responsible for validating `title`.
    pub fn new(id: String, title: String, fields: NewItem) -> Self {
        let slug = fields
            .slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&title));
        let slug = if slug.is_empty() { id.clone() } else { slug };

        Item {
            id,
            title,
            slug,
            summary: fields.summary.unwrap_or_default(),
            content: fields.content.unwrap_or_default(),
            created_at: Utc::now(),
            extra: Map::new(),
        }
    }

    /// Applies the mutable fields of a patch in place.
    pub fn apply(&mut self, patch: ItemPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(slug) = patch.slug {
            self.slug = slug;
        }
        if let Some(summary) = patch.summary {
            self.summary = summary;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
    }
}

impl ItemCollection {
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter_map(|entry| match entry {
            StoredItem::Item(item) => Some(item),
            StoredItem::Unrecognized(_) => None,
        })
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
            .into_iter()
            .filter_map(|entry| match entry {
                StoredItem::Item(item) => Some(item),
                StoredItem::Unrecognized(_) => None,
            })
            .collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Item> {
        self.items().find(|item| item.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find_map(|entry| match entry {
            StoredItem::Item(item) if item.id == id => Some(item),
            _ => None,
        })
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&Item> {
        self.items().find(|item| item.slug == slug)
    }

    /// True if any entry, readable or not, already uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.items.iter().any(|entry| match entry {
            StoredItem::Item(item) => item.id == id,
            StoredItem::Unrecognized(raw) => raw.get("id").and_then(Value::as_str) == Some(id),
        })
    }

    pub fn push_front(&mut self, item: Item) {
        self.items.insert(0, StoredItem::Item(item));
    }

    pub fn remove_by_id(&mut self, id: &str) -> Option<Item> {
        let index = self
            .items
            .iter()
            .position(|entry| matches!(entry, StoredItem::Item(item) if item.id == id))?;
        match self.items.remove(index) {
            StoredItem::Item(item) => Some(item),
            StoredItem::Unrecognized(_) => None,
        }
    }
}

/// Derives a URL-safe slug: lowercase, every run of characters outside
/// `[a-z0-9]` collapsed to one hyphen, no leading or trailing hyphen.
pub fn slugify(title: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

    let lowered = title.to_lowercase();
    re.replace_all(&lowered, "-").trim_matches('-').to_string()
}

/// Generates a fresh `item_` id with an 8 character token.
pub fn generate_item_id() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}{}", ITEM_ID_PREFIX, &token[..ITEM_ID_TOKEN_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust -- 2024 edition  "), "rust-2024-edition");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Crème"), "caf-cr-me");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_generated_id_shape() {
        let id = generate_item_id();
        assert!(id.starts_with(ITEM_ID_PREFIX));
        assert_eq!(id.len(), ITEM_ID_PREFIX.len() + 8);
        assert!(id[ITEM_ID_PREFIX.len()..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_new_item_derives_slug_and_defaults() {
        let item = Item::new(
            "item_abcdef12".to_string(),
            "Hello, World!".to_string(),
            NewItem::default(),
        );
        assert_eq!(item.slug, "hello-world");
        assert_eq!(item.summary, "");
        assert_eq!(item.content, "");
    }

    #[test]
    fn test_new_item_keeps_supplied_slug() {
        let fields = NewItem {
            slug: Some(" custom-slug ".to_string()),
            ..Default::default()
        };
        let item = Item::new("item_abcdef12".to_string(), "Title".to_string(), fields);
        assert_eq!(item.slug, "custom-slug");
    }

    #[test]
    fn test_unsluggable_title_falls_back_to_id() {
        let item = Item::new("item_abcdef12".to_string(), "???".to_string(), NewItem::default());
        assert_eq!(item.slug, "item_abcdef12");
    }

    #[test]
    fn test_patch_ignores_immutable_fields() {
        let mut item = Item::new("item_abcdef12".to_string(), "A".to_string(), NewItem::default());
        let created_at = item.created_at;
        let patch: ItemPatch = serde_json::from_value(serde_json::json!({
            "id": "item_hijacked",
            "createdAt": "1999-01-01T00:00:00Z",
            "summary": "new summary"
        }))
        .unwrap();

        item.apply(patch);
        assert_eq!(item.id, "item_abcdef12");
        assert_eq!(item.created_at, created_at);
        assert_eq!(item.summary, "new summary");
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = Item::new("item_abcdef12".to_string(), "A".to_string(), NewItem::default());
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_collection_preserves_unknown_keys() {
        let raw = serde_json::json!({
            "items": [{
                "id": "item_1",
                "title": "t",
                "slug": "t",
                "createdAt": "2024-05-01T10:00:00.000Z",
                "views": 3
            }],
            "version": 2
        });
        let collection: ItemCollection = serde_json::from_value(raw).unwrap();
        assert_eq!(collection.extra.get("version"), Some(&serde_json::json!(2)));
        assert_eq!(
            collection.find_by_id("item_1").unwrap().extra.get("views"),
            Some(&serde_json::json!(3))
        );

        let back = serde_json::to_value(&collection).unwrap();
        assert_eq!(back["version"], 2);
        assert_eq!(back["items"][0]["views"], 3);
    }

    #[test]
    fn test_mistyped_entries_are_kept_but_hidden() {
        let raw = serde_json::json!({
            "items": [
                {"id": "item_good0001", "title": "Good", "slug": "good", "summary": "", "content": "", "createdAt": "2024-05-01T10:00:00Z"},
                {"id": "item_odd00001", "title": "Odd", "slug": "odd", "createdAt": "yesterday"},
                "stray string"
            ]
        });
        let mut collection: ItemCollection = serde_json::from_value(raw.clone()).unwrap();

        let visible: Vec<&str> = collection.items().map(|item| item.id.as_str()).collect();
        assert_eq!(visible, vec!["item_good0001"]);
        assert!(collection.find_by_slug("odd").is_none());
        assert!(collection.contains_id("item_odd00001"));
        assert!(collection.remove_by_id("item_odd00001").is_none());

        assert_eq!(serde_json::to_value(&collection).unwrap()["items"], raw["items"]);
    }
}
