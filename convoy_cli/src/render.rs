use comfy_table::{Table, presets::UTF8_FULL};
use convoy_engine::{
    geopoint::GeoPoint,
    model::{cargo::CargoRoute, trip::Trip, trip_id::TripId},
    routing::route_polyline::PolylineSource,
    view::map_scene::MapScene,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

pub fn print_trips(trips: &[Trip]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Trip", "Vehicle", "Capacity", "Stops", "Cargo", "Weight", "Distance", "Cost", "Status",
    ]);

    for trip in trips {
        let vehicle = if trip.vehicle.is_rental {
            format!("{} (rental)", trip.vehicle.plate)
        } else {
            trip.vehicle.plate.clone()
        };
        let stops = trip
            .stops
            .iter()
            .map(|stop| stop.station_name.as_str())
            .collect::<Vec<_>>()
            .join(" → ");

        table.add_row(vec![
            trip.id.to_string(),
            vehicle,
            format!("{:.0} kg", trip.vehicle.capacity_kg),
            stops,
            trip.cargo_count().to_string(),
            format!("{:.1} kg", trip.total_weight()),
            format!("{:.1} km", trip.distance),
            format!("{:.2}", trip.total_cost),
            trip.status.to_string(),
        ]);
    }

    println!("{table}");
}

pub fn print_scene(scene: &MapScene) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Trip", "Color", "Status", "Route", "Points", "Length", "Planned", "Vehicle",
    ]);

    for layer in &scene.layers {
        let route = match layer.polyline.source() {
            PolylineSource::Road => "road",
            PolylineSource::StraightLine => "straight",
        };
        let vehicle = match &layer.vehicle {
            Some(vehicle) => format!("{} {} {}%", vehicle.plate, vehicle.location, vehicle.percent),
            None => String::from("-"),
        };

        table.add_row(vec![
            layer.trip_id.to_string(),
            layer.color.to_string(),
            layer.status.to_string(),
            route.to_string(),
            layer.polyline.len().to_string(),
            format!("{:.1} km", layer.polyline.length_meters() / 1000.0),
            format!("{:.1} km", layer.distance_km),
            vehicle,
        ]);
    }

    println!("Depot: {} {}", scene.depot.name, scene.depot.location);
    println!("{table}");

    if let Some(preview) = &scene.preview {
        println!(
            "Not planned yet, expected route: {:.1} km to the depot",
            preview.length_meters() / 1000.0
        );
    }
}

pub fn print_cargo(cargo_route: &CargoRoute) {
    let cargo = &cargo_route.cargo;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.add_row(vec![String::from("Cargo"), cargo.id.to_string()]);
    table.add_row(vec![
        String::from("Station"),
        format!("{} {}", cargo.station.name, cargo.station.location),
    ]);
    table.add_row(vec![String::from("Status"), cargo.status.to_string()]);
    table.add_row(vec![
        String::from("Weight"),
        format!("{:.1} kg x {}", cargo.weight, cargo.quantity),
    ]);
    if let Some(target_date) = cargo.target_date {
        table.add_row(vec![String::from("Target date"), target_date.to_string()]);
    }
    if let Some(trip) = &cargo_route.trip {
        table.add_row(vec![
            String::from("Trip"),
            format!("{} ({})", trip.id, trip.vehicle.plate),
        ]);
    }

    println!("{table}");
}

/// One progress bar per trip of a running batch.
pub struct TripBars {
    _multi: MultiProgress,
    bars: Vec<(TripId, ProgressBar)>,
}

impl TripBars {
    pub fn new(trip_ids: &[TripId], scene: &MapScene) -> anyhow::Result<Self> {
        let multi = MultiProgress::new();
        let style = ProgressStyle::default_bar().template("{prefix:>12} [{bar:40}] {pos:>3}% {msg}")?;

        let bars = trip_ids
            .iter()
            .map(|trip_id| {
                let plate = scene
                    .layer(trip_id)
                    .and_then(|layer| layer.vehicle.as_ref())
                    .map(|vehicle| vehicle.plate.clone())
                    .unwrap_or_else(|| trip_id.to_string());

                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(style.clone());
                bar.set_prefix(plate);
                (trip_id.clone(), bar)
            })
            .collect();

        Ok(Self {
            _multi: multi,
            bars,
        })
    }

    pub fn update(&self, progress: f64, positions: &[(TripId, GeoPoint)]) {
        let percent = (progress * 100.0).round() as u64;

        for (trip_id, location) in positions {
            if let Some((_, bar)) = self.bars.iter().find(|(id, _)| id == trip_id) {
                bar.set_position(percent);
                bar.set_message(location.to_string());
            }
        }
    }

    pub fn finish(&self) {
        for (_, bar) in &self.bars {
            bar.finish();
        }
    }

    pub fn abandon(&self) {
        for (_, bar) in &self.bars {
            bar.abandon();
        }
    }
}
