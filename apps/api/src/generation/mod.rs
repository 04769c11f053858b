// Resume generation: input parsing, orchestration and HTTP handlers.
// All rendering goes through crate::render; all remote calls go through the
// trait objects in AppState.

pub mod generator;
pub mod handlers;
pub mod input;
