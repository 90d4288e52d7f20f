pub mod notify_service;
pub mod trigger;
