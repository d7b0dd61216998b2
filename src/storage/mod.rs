pub mod json_backend;

use std::sync::Mutex;

use crate::errors::PersistenceError;

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Whole-collection persistence: the collection is read once and written back
/// in full after every mutation.
pub trait Repository<T>: Send + Sync {
    fn load(&self) -> Result<Vec<T>>;
    fn store(&self, items: &[T]) -> Result<()>;
}

/// Volatile repository for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryRepository<T> {
    items: Mutex<Vec<T>>,
}

impl<T> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

impl<T: Clone + Send> Repository<T> for MemoryRepository<T> {
    fn load(&self) -> Result<Vec<T>> {
        self.items
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| PersistenceError::Storage("memory repository poisoned".into()))
    }

    fn store(&self, items: &[T]) -> Result<()> {
        let mut guard = self
            .items
            .lock()
            .map_err(|_| PersistenceError::Storage("memory repository poisoned".into()))?;
        *guard = items.to_vec();
        Ok(())
    }
}

pub use json_backend::{JsonRepository, JsonStore};
