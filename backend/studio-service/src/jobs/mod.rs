//! Background jobs for studio-service.
pub mod scheduled_publisher;

pub use scheduled_publisher::ScheduledPublisherJob;
