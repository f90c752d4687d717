// Module declarations
pub(crate) mod email_queue_model;
pub(crate) mod email_queue_repository;
pub(crate) mod email_queue_service;
pub(crate) mod email_queue_traits;
pub(crate) mod mailer;


// Re-export the public interface
pub use email_queue_model::{DrainOutcome, EmailQueueDB, EmailQueueEntry, EmailStatus, NewEmail};
pub use email_queue_repository::EmailQueueRepository;
pub use email_queue_service::{backoff_delay, EmailQueueService};
pub use email_queue_traits::{EmailQueueRepositoryTrait, EmailQueueServiceTrait};
pub use mailer::{HttpMailer, Mailer, MailerConfig, MailerError};
