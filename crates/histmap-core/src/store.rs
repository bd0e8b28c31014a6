//! Storage collaborator seams
//!
//! The persistent storage engine lives outside this system; these traits
//! define the hand-off surface the pipeline writes through and the query
//! layer reads through. `InMemoryStore` is the reference implementation
//! backing the CLI and the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Book, HistmapError, Location, Mention, Result};

// ============================================================================
// Traits
// ============================================================================

/// Book persistence operations
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Store a book record, replacing any prior record with the same URL
    async fn upsert_book(&self, book: Book) -> Result<Uuid>;

    /// Get a book by ID
    async fn book(&self, id: Uuid) -> Result<Option<Book>>;

    /// List all books
    async fn books(&self) -> Result<Vec<Book>>;
}

/// Location persistence operations
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Store a location if its ID is not already present
    async fn insert_location(&self, location: Location) -> Result<()>;

    /// Get a location by ID
    async fn location(&self, id: Uuid) -> Result<Option<Location>>;

    /// Find a location by its canonical name (case-insensitive)
    async fn location_by_name(&self, name: &str) -> Result<Option<Location>>;

    /// List all locations
    async fn locations(&self) -> Result<Vec<Location>>;
}

/// Mention persistence operations.
///
/// Mentions arrive in document-complete batches only; a timed-out or
/// failed document never hands anything to this trait.
#[async_trait]
pub trait MentionStore: Send + Sync {
    /// Replace the mention set for a book with a complete new batch
    async fn store_mentions(&self, book_id: Uuid, mentions: Vec<Mention>) -> Result<usize>;

    /// All mentions pointing at a location
    async fn mentions_for_location(&self, location_id: Uuid) -> Result<Vec<Mention>>;

    /// All stored mentions
    async fn mentions(&self) -> Result<Vec<Mention>>;
}

// ============================================================================
// In-memory reference implementation
// ============================================================================

/// In-memory store used by the CLI and tests
#[derive(Default)]
pub struct InMemoryStore {
    books: RwLock<HashMap<Uuid, Book>>,
    locations: RwLock<HashMap<Uuid, Location>>,
    mentions: RwLock<HashMap<Uuid, Vec<Mention>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryStore {
    async fn upsert_book(&self, book: Book) -> Result<Uuid> {
        let mut books = self.books.write().await;

        // Same-URL reprocessing replaces the old record and its mentions
        let previous = books
            .values()
            .find(|existing| existing.url == book.url)
            .map(|existing| existing.id);
        if let Some(old_id) = previous {
            books.remove(&old_id);
            self.mentions.write().await.remove(&old_id);
        }

        let id = book.id;
        books.insert(id, book);
        Ok(id)
    }

    async fn book(&self, id: Uuid) -> Result<Option<Book>> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn books(&self) -> Result<Vec<Book>> {
        let mut books: Vec<Book> = self.books.read().await.values().cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn insert_location(&self, location: Location) -> Result<()> {
        self.locations
            .write()
            .await
            .entry(location.id)
            .or_insert(location);
        Ok(())
    }

    async fn location(&self, id: Uuid) -> Result<Option<Location>> {
        Ok(self.locations.read().await.get(&id).cloned())
    }

    async fn location_by_name(&self, name: &str) -> Result<Option<Location>> {
        let locations = self.locations.read().await;
        Ok(locations
            .values()
            .find(|location| location.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn locations(&self) -> Result<Vec<Location>> {
        let mut locations: Vec<Location> =
            self.locations.read().await.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl MentionStore for InMemoryStore {
    async fn store_mentions(&self, book_id: Uuid, mentions: Vec<Mention>) -> Result<usize> {
        if mentions.iter().any(|m| m.book_id != book_id) {
            return Err(HistmapError::ValidationError(format!(
                "mention batch contains entries not owned by book {book_id}"
            )));
        }

        let count = mentions.len();
        self.mentions.write().await.insert(book_id, mentions);
        Ok(count)
    }

    async fn mentions_for_location(&self, location_id: Uuid) -> Result<Vec<Mention>> {
        let mentions = self.mentions.read().await;
        let mut matching: Vec<Mention> = mentions
            .values()
            .flatten()
            .filter(|mention| mention.location_id == location_id)
            .cloned()
            .collect();
        matching.sort_by_key(|mention| (mention.book_id, mention.text_position));
        Ok(matching)
    }

    async fn mentions(&self) -> Result<Vec<Mention>> {
        let mentions = self.mentions.read().await;
        let mut all: Vec<Mention> = mentions.values().flatten().cloned().collect();
        all.sort_by_key(|mention| (mention.book_id, mention.text_position));
        Ok(all)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchStrategy;

    fn mention(book_id: Uuid, location_id: Uuid, position: usize) -> Mention {
        Mention::new(
            book_id,
            location_id,
            "Aachen",
            position,
            "near Aachen the court assembled",
            MatchStrategy::Exact,
            1.0,
        )
    }

    #[tokio::test]
    async fn test_upsert_book_replaces_same_url() {
        let store = InMemoryStore::new();

        let first = Book::new("Draft title", "http://example.org/pg1.txt");
        let first_id = store.upsert_book(first).await.unwrap();
        store
            .store_mentions(first_id, vec![mention(first_id, Uuid::new_v4(), 10)])
            .await
            .unwrap();

        let second = Book::new("Corrected title", "http://example.org/pg1.txt");
        let second_id = store.upsert_book(second).await.unwrap();

        assert_ne!(first_id, second_id);
        assert_eq!(store.books().await.unwrap().len(), 1);
        // Mentions of the replaced record are gone with it
        assert!(store.mentions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_mentions_is_document_complete() {
        let store = InMemoryStore::new();
        let book_id = store
            .upsert_book(Book::new("Chronicles", "http://example.org/pg2.txt"))
            .await
            .unwrap();
        let location_id = Uuid::new_v4();

        store
            .store_mentions(
                book_id,
                vec![mention(book_id, location_id, 5), mention(book_id, location_id, 90)],
            )
            .await
            .unwrap();

        // A second complete batch replaces, never appends
        store
            .store_mentions(book_id, vec![mention(book_id, location_id, 7)])
            .await
            .unwrap();

        let stored = store.mentions_for_location(location_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].text_position, 7);
    }

    #[tokio::test]
    async fn test_store_mentions_rejects_foreign_book() {
        let store = InMemoryStore::new();
        let book_id = Uuid::new_v4();
        let foreign = mention(Uuid::new_v4(), Uuid::new_v4(), 3);

        assert!(store.store_mentions(book_id, vec![foreign]).await.is_err());
    }

    #[tokio::test]
    async fn test_insert_location_is_idempotent() {
        let store = InMemoryStore::new();
        let location = Location::new("Aachen");
        let id = location.id;

        store.insert_location(location.clone()).await.unwrap();
        store.insert_location(location).await.unwrap();

        assert_eq!(store.locations().await.unwrap().len(), 1);
        assert!(store.location(id).await.unwrap().is_some());
    }
}
