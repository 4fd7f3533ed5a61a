// Business logic services

pub mod error;
pub mod locks;
pub mod max_service;
pub mod progression_service;
pub mod session_service;
pub mod state_service;
pub mod workout_service;

pub use error::{ServiceError, ServiceResult};
pub use locks::UserLocks;
pub use max_service::{MaxService, RecordedMax};
pub use progression_service::{ProgressionReport, ProgressionService, TriggerEvent, TriggerRequest};
pub use session_service::SessionService;
pub use state_service::{AdvanceResponse, StateService};
pub use workout_service::{WorkoutQuery, WorkoutService};
