use convoy_backend::client::BackendClient;
use jiff::civil::Date;
use tracing::info;

use crate::render;

pub async fn run(backend: BackendClient, date: Date) -> anyhow::Result<()> {
    let trips = backend.fetch_trips(date).await?;

    if trips.is_empty() {
        info!("No trips planned for {}", date);
        return Ok(());
    }

    render::print_trips(&trips);
    Ok(())
}
