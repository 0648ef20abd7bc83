mod photo;
mod submission;
mod task;
mod vehicle;

pub use photo::PhotoRepository;
pub use submission::SubmissionRepository;
pub use task::{TaskRepository, TASK_NOTIFY_CHANNEL};
pub use vehicle::VehicleRepository;
