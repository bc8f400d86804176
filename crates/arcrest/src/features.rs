use crate::client::{ArcgisConfig, JsonFetcher};
use crate::prelude::{eprintln, println, *};
use colored::Colorize;

use arcrest_core::endpoint::Endpoint;
pub use arcrest_core::pager::{
    FeatureCollection, FeaturePager, FeatureQuery, ALL_FIELDS, DEFAULT_PAGE_SIZE, MATCH_ALL,
};

#[derive(Debug, clap::Parser)]
#[command(name = "query")]
#[command(about = "Download every feature of a map layer, page by page")]
pub struct App {
    /// Service name, including its folder (e.g. "Transport/Roads")
    pub service: String,

    /// Layer id within the service
    pub layer: u32,

    /// Filter expression in the server's SQL dialect
    #[arg(short, long = "where", env = "ARCGIS_WHERE", default_value = MATCH_ALL)]
    pub where_clause: String,

    /// Comma-separated list of fields to return
    #[arg(short, long, env = "ARCGIS_FIELDS", default_value = ALL_FIELDS)]
    pub fields: String,

    /// Records requested per page
    #[arg(long, env = "ARCGIS_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE as u64,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub page_size: u64,

    /// Print only the number of features
    #[arg(long)]
    pub count: bool,
}

/// Fetch every feature of one layer
///
/// Pages are requested sequentially until the server returns fewer features
/// than requested. A failed request stops the loop; the features gathered
/// before it are returned together with the error.
pub async fn fetch_all_features_data<F: JsonFetcher>(
    fetcher: &F,
    endpoint: &Endpoint,
    query: &FeatureQuery,
) -> FeatureCollection {
    let url = endpoint.layer_query_url(&query.service, query.layer_id);
    let mut pager = FeaturePager::new(query.page_size);

    while let Some(cursor) = pager.next_page() {
        log::debug!(
            "Querying {} offset={} count={}",
            url,
            cursor.offset,
            cursor.page_size
        );
        let result = fetcher.fetch(&url, &query.params(&cursor)).await;
        pager.accept(result);
    }

    let collection = pager.finish();
    if let Some(err) = &collection.error {
        log::warn!(
            "Query of {} stopped after {} request(s) with {} feature(s): {}",
            url,
            collection.requests,
            collection.features.len(),
            err
        );
    }

    collection
}

/// [`fetch_all_features_data`] matching every row and returning every field
pub async fn fetch_all_features<F: JsonFetcher>(
    fetcher: &F,
    endpoint: &Endpoint,
    service: &str,
    layer_id: u32,
) -> FeatureCollection {
    fetch_all_features_data(fetcher, endpoint, &FeatureQuery::all(service, layer_id)).await
}

fn format_summary(collection: &FeatureCollection) -> String {
    match &collection.error {
        None => format!(
            "{} feature(s) in {} request(s)",
            collection.features.len(),
            collection.requests
        ),
        Some(err) => format!(
            "{} partial result: {} feature(s) in {} request(s), stopped by {:?} failure: {}",
            "warning:".yellow().bold(),
            collection.features.len(),
            collection.requests,
            err.kind(),
            err
        ),
    }
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = ArcgisConfig::from_global(&global)?;
    let query = FeatureQuery::new(app.service, app.layer, app.where_clause, app.fields)
        .with_page_size(app.page_size as usize);

    if global.verbose {
        println!(
            "Querying {} where {}",
            config
                .endpoint
                .layer_query_url(&query.service, query.layer_id),
            query.where_clause
        );
    }

    let fetcher = config.fetcher()?;
    let collection = fetch_all_features_data(&fetcher, &config.endpoint, &query).await;

    if app.count {
        println!("{}", collection.features.len());
    } else {
        println!("{}", serde_json::to_string_pretty(&collection)?);
    }
    eprintln!("{}", format_summary(&collection));

    Ok(())
}
