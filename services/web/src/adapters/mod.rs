pub mod file;
pub mod memory;
pub mod seed;
pub mod users;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use seed::SeedDataSource;
pub use users::MockUserRepository;
