// Port Layer - Interfaces for external collaborators

pub mod file_service;

// Re-exports
pub use file_service::FileService;
