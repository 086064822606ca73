pub mod memory;
pub mod tab_file;

pub use memory::MemorySource;
pub use tab_file::TabFileSource;
