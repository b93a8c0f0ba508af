pub mod entry;
pub mod seed;

pub use entry::AdListEntry;
