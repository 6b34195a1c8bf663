pub mod books;

use std::sync::Arc;

use library_kernel::ModuleRegistry;
use sqlx::SqlitePool;

/// Build the registry holding every service module, sharing one pool
pub fn register_all(pool: &SqlitePool) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(books::BooksModule::new(books::BookStore::new(
        pool.clone(),
    ))));
    registry
}
