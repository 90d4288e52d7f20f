pub mod base;
pub mod file;
pub mod tokyo_ipo;
