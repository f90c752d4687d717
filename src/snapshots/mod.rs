// Module declarations
pub(crate) mod snapshots_model;
pub(crate) mod snapshots_repository;
pub(crate) mod snapshots_service;
pub(crate) mod snapshots_traits;


// Re-export the public interface
pub use snapshots_model::{
    first_of_month, previous_month, MonthlySnapshot, MonthlySnapshotDB, SnapshotDispatchOutcome,
};
pub use snapshots_repository::SnapshotRepository;
pub use snapshots_service::SnapshotService;
pub use snapshots_traits::{SnapshotRepositoryTrait, SnapshotServiceTrait};
