pub mod db;

pub mod ec;

pub mod mapping;
pub use mapping::Mapping;
