use crate::client::{ArcgisConfig, JsonFetcher};
use crate::prelude::{println, *};

use arcrest_core::endpoint::{Endpoint, MAP_SERVER};
use arcrest_core::error::FetchError;
pub use arcrest_core::layers::{transform_layers, LayerSummary};

#[derive(Debug, clap::Parser)]
#[command(name = "layers")]
#[command(about = "List the layers of a map service")]
pub struct App {
    /// Service name, including its folder (e.g. "Transport/Roads")
    pub service: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Fetch a MapServer descriptor and project its layers
pub async fn list_layers_data<F: JsonFetcher>(
    fetcher: &F,
    endpoint: &Endpoint,
    service: &str,
) -> Result<Vec<LayerSummary>, FetchError> {
    let url = endpoint.service_url(service, MAP_SERVER);
    let descriptor = fetcher.fetch(&url, &[("f", "pjson".to_string())]).await?;

    Ok(transform_layers(&descriptor))
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = ArcgisConfig::from_global(&global)?;

    if global.verbose {
        println!(
            "Reading {}",
            config.endpoint.service_url(&app.service, MAP_SERVER)
        );
    }

    let fetcher = config.fetcher()?;
    let layers = list_layers_data(&fetcher, &config.endpoint, &app.service)
        .await
        .map_err(Error::from)
        .with_context(|| format!("Failed to list layers of {}", app.service))?;

    if app.json {
        println!("{}", serde_json::to_string_pretty(&layers)?);
        return Ok(());
    }

    if layers.is_empty() {
        println!("No layers found.");
        return Ok(());
    }

    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row!["ID", "Name", "Type"]);
    for layer in layers {
        table.add_row(prettytable::row![layer.id, layer.name, layer.layer_type]);
    }
    table.printstd();

    Ok(())
}
