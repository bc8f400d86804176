use crate::prelude::*;
use clap::Parser;

mod catalog;
mod client;
mod error;
mod features;
mod layers;
mod prelude;
mod version;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Explore ArcGIS REST services: folder trees, services, layers and paged feature queries"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Base URL of the server, e.g. https://example.com/arcgis/rest/services
    #[clap(long, env = "ARCGIS_URL", global = true)]
    url: Option<String>,

    /// Timeout in seconds applied to every request
    #[clap(long, env = "ARCGIS_TIMEOUT", global = true, default_value = "30")]
    timeout: u64,

    /// Whether to display additional information.
    #[clap(long, env = "ARCGIS_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Folder and service discovery
    Catalog(crate::catalog::App),

    /// Layers of a map service
    Layers(crate::layers::App),

    /// Paged feature query against one layer
    Query(crate::features::App),

    /// Server version
    Version(crate::version::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    let result = match app.command {
        SubCommands::Catalog(sub_app) => crate::catalog::run(sub_app, app.global).await,
        SubCommands::Layers(sub_app) => crate::layers::run(sub_app, app.global).await,
        SubCommands::Query(sub_app) => crate::features::run(sub_app, app.global).await,
        SubCommands::Version(sub_app) => crate::version::run(sub_app, app.global).await,
    };

    if let Err(err) = &result {
        if let Some(kind) = err.downcast_ref::<Error>().and_then(Error::kind) {
            log::error!("arcrest failed ({:?})", kind);
        }
    }

    result.map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
