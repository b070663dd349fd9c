pub mod interpolate;
pub mod session;
pub mod session_store;
pub mod simulation_clock;
pub mod simulation_params;
