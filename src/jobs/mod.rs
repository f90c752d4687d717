// Module declarations
pub(crate) mod jobs_model;
pub(crate) mod jobs_repository;
pub(crate) mod jobs_service;
pub(crate) mod jobs_traits;


// Re-export the public interface
pub use jobs_model::{HealthStatus, HealthSummary, NewProcessedJob, ProcessedJob, ProcessedJobDB};
pub use jobs_repository::ProcessedJobRepository;
pub use jobs_service::JobLedgerService;
pub use jobs_traits::{JobLedgerServiceTrait, ProcessedJobRepositoryTrait};
