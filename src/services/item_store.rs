use std::path::PathBuf;
use crate::models::{
    errors::AppError,
    item::{generate_item_id, Item, ItemCollection, ItemPatch, NewItem},
};
use super::json_file::JsonDocument;

/// Ordered collection of content items, newest first.
#[derive(Debug)]
pub struct ItemStore {
    document: JsonDocument<ItemCollection>,
}

impl ItemStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub async fn list(&self) -> Vec<Item> {
        self.document.load().await.into_items()
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Item, AppError> {
        self.document
            .load()
            .await
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("item {}", id)))
    }

    /// First item carrying `slug`. Slugs are not unique, so with
    /// duplicates this is the newest one.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Item, AppError> {
        self.document
            .load()
            .await
            .find_by_slug(slug)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("item with slug {}", slug)))
    }

    /// Create an item at the head of the collection.
    pub async fn create(&self, fields: NewItem) -> Result<Item, AppError> {
        let title = fields
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::validation_failed("Missing title"))?;

        let item = self
            .document
            .mutate(move |collection| {
                let mut id = generate_item_id();
                while collection.contains_id(&id) {
                    id = generate_item_id();
                }

                let item = Item::new(id, title, fields);
                collection.push_front(item.clone());
                Ok(item)
            })
            .await?;

        tracing::info!("Created item {} ({})", item.id, item.slug);
        Ok(item)
    }

    /// Merge the mutable fields of `patch` into the item with `id`.
    pub async fn update(&self, id: &str, patch: ItemPatch) -> Result<Item, AppError> {
        if matches!(patch.title.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(AppError::validation_failed("Title cannot be empty"));
        }

        let item = self
            .document
            .mutate(|collection| {
                let item = collection
                    .find_by_id_mut(id)
                    .ok_or_else(|| AppError::not_found(format!("item {}", id)))?;
                item.apply(patch);
                Ok(item.clone())
            })
            .await?;

        tracing::info!("Updated item {}", item.id);
        Ok(item)
    }

    /// Remove the item with `id` and return it.
    pub async fn delete(&self, id: &str) -> Result<Item, AppError> {
        let removed = self
            .document
            .mutate(|collection| {
                collection
                    .remove_by_id(id)
                    .ok_or_else(|| AppError::not_found(format!("item {}", id)))
            })
            .await?;

        tracing::info!("Deleted item {}", removed.id);
        Ok(removed)
    }
}
