//! The user's pending list of items.

use tracing::debug;

use super::error::ValidationError;
use super::normalize::Normalizer;
use super::{ConversionItem, ItemId, ItemPayload, RawInput};

/// Ordered collection of normalized items awaiting conversion.
///
/// Additions are atomic: when normalization or the duplicate check fails the
/// set is left exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    normalizer: Normalizer,
    items: Vec<ConversionItem>,
}

impl WorkingSet {
    /// Creates an empty working set that normalizes with `normalizer`.
    #[must_use]
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            items: Vec::new(),
        }
    }

    /// Normalizes `raw` and appends it.
    ///
    /// # Errors
    ///
    /// Returns the normalization error, or [`ValidationError::Duplicate`]
    /// when an item with the same URL or file name is already present.
    pub fn add(&mut self, raw: RawInput) -> Result<ItemId, ValidationError> {
        let item = self.normalizer.normalize(raw)?;
        if let Some(existing) = self.items.iter().find(|existing| is_duplicate(existing, &item)) {
            return Err(ValidationError::Duplicate {
                value: duplicate_key(existing),
            });
        }
        let id = item.id;
        debug!(%id, name = %item.name, "item added to working set");
        self.items.push(item);
        Ok(id)
    }

    /// Adds several inputs, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the set is unchanged in that case.
    pub fn add_all(
        &mut self,
        inputs: impl IntoIterator<Item = RawInput>,
    ) -> Result<Vec<ItemId>, ValidationError> {
        let mut staged = self.clone();
        let ids = inputs
            .into_iter()
            .map(|raw| staged.add(raw))
            .collect::<Result<Vec<_>, _>>()?;
        *self = staged;
        Ok(ids)
    }

    /// Removes an item, returning it if present.
    pub fn remove(&mut self, id: ItemId) -> Option<ConversionItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[ConversionItem] {
        &self.items
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when no items are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true when an item with exactly this normalized URL exists.
    #[must_use]
    pub fn contains_url(&self, url: &str) -> bool {
        self.items.iter().any(|item| item.url() == Some(url))
    }
}

fn is_duplicate(a: &ConversionItem, b: &ConversionItem) -> bool {
    match (&a.payload, &b.payload) {
        (ItemPayload::Url(x), ItemPayload::Url(y)) => x == y,
        (ItemPayload::File { file_name: x, .. }, ItemPayload::File { file_name: y, .. }) => x == y,
        _ => false,
    }
}

fn duplicate_key(item: &ConversionItem) -> String {
    match &item.payload {
        ItemPayload::Url(url) => url.clone(),
        ItemPayload::File { file_name, .. } => file_name.clone(),
    }
}
