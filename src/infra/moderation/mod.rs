// Implementations of the moderation store.

pub mod sqlite_term_store;

pub use sqlite_term_store::SqliteTermStore;
