use std::time::Duration;

use clap::Args;
use convoy_engine::simulation::simulation_params::SimulationParams;

use crate::parsers;

#[derive(Args)]
pub struct SimulationArgs {
    /// Duration of the animation (e.g., "10s", "PT15S", "12")
    #[arg(short, long, value_parser = parsers::parse_duration)]
    pub duration: Option<Duration>,

    /// Frames per second of the redraw loop
    #[arg(long, default_value_t = 60, value_parser = parsers::parse_fps)]
    pub fps: u32,

    /// Only show the routes, do not start a simulation
    #[arg(long)]
    pub dry_run: bool,
}

impl SimulationArgs {
    pub fn params(&self, defaults: SimulationParams) -> SimulationParams {
        let params = defaults.with_frame_interval(Duration::from_secs(1) / self.fps);

        match self.duration {
            Some(duration) => params.with_duration(duration),
            None => params,
        }
    }
}
