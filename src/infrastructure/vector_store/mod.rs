mod directory;
mod in_memory;

pub use directory::DirectoryIndexStorage;
pub use in_memory::InMemoryVectorStore;
