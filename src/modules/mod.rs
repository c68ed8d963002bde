pub mod books;

use std::sync::Arc;

use shelf_kernel::ModuleRegistry;

use books::repository::BookRepository;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, books: Arc<dyn BookRepository>) {
    registry.register_custom(books::create_module(books));
}
