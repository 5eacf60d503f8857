pub mod file;
pub mod memory;

pub use file::CsvHistoryStore;
pub use memory::MemoryHistoryStore;
