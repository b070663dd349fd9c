pub mod simulation_error;
pub mod system_of_record;
pub mod trip_state_coordinator;
