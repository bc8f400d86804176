use crate::client::{ArcgisConfig, JsonFetcher};
use crate::prelude::{println, *};

use arcrest_core::catalog::parse_version;
use arcrest_core::endpoint::Endpoint;
use arcrest_core::error::FetchError;

#[derive(Debug, clap::Parser)]
#[command(name = "version")]
#[command(about = "Show the ArcGIS Server version reported by the services root")]
pub struct App {}

/// Read `currentVersion` from the services root
pub async fn version_data<F: JsonFetcher>(
    fetcher: &F,
    endpoint: &Endpoint,
) -> Result<String, FetchError> {
    let root = fetcher
        .fetch(&endpoint.services_url("/"), &[("f", "json".to_string())])
        .await?;

    Ok(parse_version(&root))
}

/// Module entry point
pub async fn run(_app: App, global: crate::Global) -> Result<()> {
    let config = ArcgisConfig::from_global(&global)?;

    if global.verbose {
        println!("Server: {}", config.endpoint);
    }

    let fetcher = config.fetcher()?;
    let version = version_data(&fetcher, &config.endpoint)
        .await
        .map_err(Error::from)?;

    println!("{}", version);
    Ok(())
}
