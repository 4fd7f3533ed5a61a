// API routes and handlers

pub mod cycles;
pub mod days;
pub mod error;
pub mod health;
pub mod identity;
pub mod lifts;
pub mod lookups;
pub mod prescriptions;
pub mod programs;
pub mod progressions;
pub mod routes;
pub mod sessions;
pub mod users;
pub mod weeks;

use crate::engine::EngineConfig;
use crate::repos::Repos;
use crate::services::{
    MaxService, ProgressionService, SessionService, StateService, UserLocks, WorkoutService,
};

/// Shared handler state: the repository bundle plus the services wired over
/// it. Everything inside is a cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repos,
    pub engine: EngineConfig,
    pub maxes: MaxService,
    pub workouts: WorkoutService,
    pub sessions: SessionService,
    pub progressions: ProgressionService,
    pub states: StateService,
}

impl AppState {
    pub fn new(repos: Repos, engine: EngineConfig) -> Self {
        let locks = UserLocks::new();
        let progressions = ProgressionService::new(repos.clone(), locks.clone());
        Self {
            maxes: MaxService::new(repos.clone(), &engine),
            workouts: WorkoutService::new(repos.clone()),
            sessions: SessionService::new(repos.clone(), locks.clone(), progressions.clone()),
            states: StateService::new(repos.clone(), locks, progressions.clone()),
            progressions,
            repos,
            engine,
        }
    }
}
