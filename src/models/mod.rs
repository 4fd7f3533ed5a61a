// Data model: entities, DTOs, and the validation kernel

pub mod lift;
pub mod lift_max;
pub mod lookup;
pub mod prescription;
pub mod program;
pub mod progression;
pub mod schedule;
pub mod session;
pub mod user_state;
pub mod validation;
pub mod workout;

pub use lift::*;
pub use lift_max::*;
pub use lookup::*;
pub use prescription::*;
pub use program::*;
pub use progression::*;
pub use schedule::*;
pub use session::*;
pub use user_state::*;
pub use validation::*;
pub use workout::*;
