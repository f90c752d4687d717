// Module declarations
pub(crate) mod alerts_model;
pub(crate) mod alerts_repository;
pub(crate) mod alerts_service;
pub(crate) mod alerts_traits;

#[cfg(test)]
mod alerts_service_tests;

// Re-export the public interface
pub use alerts_model::{AlertConfiguration, AlertConfigurationDB, AlertRunOutcome};
pub use alerts_repository::AlertConfigurationRepository;
pub use alerts_service::AlertService;
pub use alerts_traits::{AlertConfigurationRepositoryTrait, AlertServiceTrait};
