//! Non-database repository implementations

mod memory;
#[cfg(test)]
pub mod testing;

pub use memory::InMemoryApiKeyRepository;
