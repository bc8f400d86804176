use crate::client::{ArcgisConfig, JsonFetcher};
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use serde::Serialize;

use arcrest_core::catalog::{FolderNode, ServiceDescriptor, SERVICE_NOT_FOUND};
use arcrest_core::endpoint::Endpoint;
use arcrest_core::error::CatalogError;
pub use arcrest_core::walker::{Diagnostic, TreeWalk, WalkOutcome};

#[derive(Debug, clap::Parser)]
#[command(name = "catalog")]
#[command(about = "Discover the folders and services of a server")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Print the full folder/service tree
    #[clap(name = "tree")]
    Tree(OutputOptions),

    /// List every folder path
    #[clap(name = "folders")]
    Folders(OutputOptions),

    /// List every service in every folder
    #[clap(name = "services")]
    Services(OutputOptions),

    /// List the distinct service types in use
    #[clap(name = "types")]
    Types(OutputOptions),

    /// List the names of services of one type
    #[clap(name = "by-type")]
    ByType(ByTypeOptions),

    /// Look up the type of a service by name
    #[clap(name = "service-type")]
    ServiceType(ServiceTypeOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ByTypeOptions {
    /// Service type, e.g. MapServer or FeatureServer
    #[arg(value_name = "TYPE")]
    pub service_type: String,

    #[clap(flatten)]
    pub output: OutputOptions,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ServiceTypeOptions {
    /// Service name as listed by the server, e.g. "Utilities/Geometry"
    pub name: String,

    #[clap(flatten)]
    pub output: OutputOptions,
}

/// JSON envelope for every catalog view
#[derive(Debug, Serialize)]
struct ViewOutput<T: Serialize> {
    #[serde(flatten)]
    view: T,
    diagnostics: Vec<Diagnostic>,
}

/// Query parameters of a folder listing request
fn listing_params() -> Vec<(&'static str, String)> {
    vec![("f", "json".to_string())]
}

/// Walk the server's folder hierarchy from the services root
///
/// Requests are issued one at a time. Fails only when the root listing cannot
/// be read; unreadable sub-folders are reported in the outcome's diagnostics.
pub async fn build_tree_data<F: JsonFetcher>(
    fetcher: &F,
    endpoint: &Endpoint,
) -> Result<WalkOutcome, CatalogError> {
    let mut walk = TreeWalk::new(endpoint);
    let params = listing_params();

    while let Some(pending) = walk.next_folder() {
        log::debug!("Listing folder {}", pending.path());
        let result = fetcher.fetch(pending.url(), &params).await;
        walk.record(pending, result)?;
    }

    let outcome = walk.finish();
    for diagnostic in &outcome.diagnostics {
        log::warn!("{}", diagnostic);
    }

    Ok(outcome)
}

/// Render a tree as indented text, folders first then their services
pub fn render_tree(tree: &FolderNode) -> String {
    let mut result = String::new();
    let mut stack = vec![(tree, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        result.push_str(&format!("{indent}{}\n", node.path.bold().bright_cyan()));

        for service in &node.services {
            match &service.service_type {
                Some(service_type) => result.push_str(&format!(
                    "{indent}  {} {}\n",
                    service.name,
                    format!("({service_type})").dimmed()
                )),
                None => result.push_str(&format!("{indent}  {}\n", service.name)),
            }
        }

        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    result
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    eprintln!(
        "{} {} folder(s) could not be read completely:",
        "warning:".yellow().bold(),
        diagnostics.len()
    );
    for diagnostic in diagnostics {
        eprintln!("  {}", diagnostic);
    }
}

fn print_json<T: Serialize>(view: T, diagnostics: Vec<Diagnostic>) -> Result<()> {
    let output = ViewOutput { view, diagnostics };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_names(title: &str, names: &[String]) {
    if names.is_empty() {
        println!("No {} found.", title.to_lowercase());
        return;
    }

    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row![title]);
    for name in names {
        table.add_row(prettytable::row![name]);
    }
    table.printstd();
}

fn print_services(services: &[ServiceDescriptor]) {
    if services.is_empty() {
        println!("No services found.");
        return;
    }

    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row!["Name", "Type"]);
    for service in services {
        let service_type = service.service_type.as_deref().unwrap_or("");
        table.add_row(prettytable::row![service.name, service_type]);
    }
    table.printstd();
}

async fn handle(command: Commands, endpoint: &Endpoint, fetcher: &impl JsonFetcher) -> Result<()> {
    let WalkOutcome { tree, diagnostics } = build_tree_data(fetcher, endpoint)
        .await
        .map_err(Error::from)?;

    match command {
        Commands::Tree(output) => {
            if output.json {
                #[derive(Serialize)]
                struct TreeView<'a> {
                    tree: &'a FolderNode,
                }
                print_json(TreeView { tree: &tree }, diagnostics.clone())?;
            } else {
                println!("{}", render_tree(&tree).trim_end());
                println!(
                    "\n{} folder(s), {} service(s)",
                    tree.folder_count(),
                    tree.all_services().len()
                );
            }
        }
        Commands::Folders(output) => {
            let folders = tree.folder_paths();
            if output.json {
                #[derive(Serialize)]
                struct FoldersView {
                    folders: Vec<String>,
                }
                print_json(FoldersView { folders }, diagnostics.clone())?;
            } else {
                print_names("Folders", &folders);
            }
        }
        Commands::Services(output) => {
            let services = tree.all_services();
            if output.json {
                #[derive(Serialize)]
                struct ServicesView {
                    services: Vec<ServiceDescriptor>,
                }
                print_json(ServicesView { services }, diagnostics.clone())?;
            } else {
                print_services(&services);
            }
        }
        Commands::Types(output) => {
            let types: Vec<String> = tree.distinct_service_types().into_iter().collect();
            if output.json {
                #[derive(Serialize)]
                struct TypesView {
                    types: Vec<String>,
                }
                print_json(TypesView { types }, diagnostics.clone())?;
            } else {
                print_names("Types", &types);
            }
        }
        Commands::ByType(options) => {
            let services = tree.services_by_type(&options.service_type);
            if options.output.json {
                #[derive(Serialize)]
                struct ByTypeView {
                    service_type: String,
                    services: Vec<String>,
                }
                let view = ByTypeView {
                    service_type: options.service_type,
                    services,
                };
                print_json(view, diagnostics.clone())?;
            } else {
                print_names("Services", &services);
            }
        }
        Commands::ServiceType(options) => {
            let service_type = tree.service_type_by_name(&options.name);
            if options.output.json {
                #[derive(Serialize)]
                struct ServiceTypeView<'a> {
                    name: &'a str,
                    service_type: Option<&'a str>,
                }
                let view = ServiceTypeView {
                    name: &options.name,
                    service_type,
                };
                print_json(view, diagnostics.clone())?;
            } else {
                println!("{}", service_type.unwrap_or(SERVICE_NOT_FOUND));
            }
        }
    }

    print_diagnostics(&diagnostics);
    Ok(())
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = ArcgisConfig::from_global(&global)?;

    if global.verbose {
        println!("Walking {}", config.endpoint.services_url("/"));
    }

    let fetcher = config.fetcher()?;
    handle(app.command, &config.endpoint, &fetcher).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{param, MockFetcher};
    use arcrest_core::endpoint::validate_endpoint;
    use arcrest_core::error::FetchError;
    use serde_json::{json, Value};

    const BASE: &str = "https://example.com/arcgis/rest/services";

    fn endpoint() -> Endpoint {
        validate_endpoint(BASE).unwrap()
    }

    /// Server with folders `a` and `b`, where `b` holds sub-folder `c`
    fn listing(url: &str) -> Option<Value> {
        let folder = url.strip_prefix(BASE)?.trim_start_matches('/');
        let body = match folder {
            "" => json!({
                "currentVersion": 11.1,
                "folders": ["a", "b"],
                "services": [{"name": "Basemap", "type": "MapServer"}]
            }),
            "a" => json!({
                "folders": [],
                "services": [{"name": "a/Edits", "type": "FeatureServer"}]
            }),
            "b" => json!({"folders": ["c"], "services": []}),
            "b/c" => json!({
                "folders": [],
                "services": [{"name": "b/c/Roads", "type": "MapServer"}]
            }),
            _ => return None,
        };
        Some(body)
    }

    #[tokio::test]
    async fn test_build_tree_data_visits_every_folder() {
        let fetcher = MockFetcher::new(|url, query| {
            assert_eq!(param(query, "f"), Some("json"));
            listing(url).ok_or_else(|| FetchError::status(404))
        });

        let outcome = build_tree_data(&fetcher, &endpoint()).await.unwrap();

        assert_eq!(
            fetcher.urls(),
            vec![
                BASE.to_string(),
                format!("{BASE}/a"),
                format!("{BASE}/b"),
                format!("{BASE}/b/c"),
            ]
        );
        let paths: Vec<&str> = outcome.tree.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/a", "/b", "/b/c"]);
        assert_eq!(
            outcome.tree.services_by_type("MapServer"),
            vec!["Basemap", "b/c/Roads"]
        );
        assert!(outcome.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_build_tree_data_skips_failed_subfolder() {
        let fetcher = MockFetcher::new(|url, _| {
            if url.ends_with("/b/c") {
                return Err(FetchError::Transport("connection reset".to_string()));
            }
            listing(url).ok_or_else(|| FetchError::status(404))
        });

        let outcome = build_tree_data(&fetcher, &endpoint()).await.unwrap();

        assert_eq!(outcome.tree.folder_paths(), vec!["/a", "/b"]);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(matches!(
            &outcome.diagnostics[0],
            Diagnostic::Skipped { path, cause: FetchError::Transport(_) } if path == "/b/c"
        ));
    }

    #[tokio::test]
    async fn test_build_tree_data_root_failure_is_fatal() {
        let fetcher = MockFetcher::new(|_, _| Err(FetchError::status(403)));

        let err = build_tree_data(&fetcher, &endpoint()).await.unwrap_err();

        assert_eq!(fetcher.urls().len(), 1);
        assert_eq!(
            err,
            CatalogError::RootUnavailable {
                url: BASE.to_string(),
                source: FetchError::status(403),
            }
        );
    }

    #[test]
    fn test_render_tree_indents_children() {
        colored::control::set_override(false);

        let tree = FolderNode {
            path: "/".to_string(),
            services: vec![ServiceDescriptor {
                name: "Basemap".to_string(),
                service_type: Some("MapServer".to_string()),
            }],
            children: vec![FolderNode {
                path: "/Utilities".to_string(),
                services: vec![ServiceDescriptor {
                    name: "Utilities/NoType".to_string(),
                    service_type: None,
                }],
                children: vec![],
            }],
        };

        assert_eq!(
            render_tree(&tree),
            "/\n  Basemap (MapServer)\n  /Utilities\n    Utilities/NoType\n"
        );
    }

    #[test]
    fn test_view_output_flattens_view() {
        #[derive(Serialize)]
        struct FoldersView {
            folders: Vec<String>,
        }

        let output = ViewOutput {
            view: FoldersView {
                folders: vec!["/a".to_string()],
            },
            diagnostics: vec![Diagnostic::Revisited {
                path: "/a".to_string(),
            }],
        };

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(
            json,
            json!({
                "folders": ["/a"],
                "diagnostics": [{"reason": "revisited", "path": "/a"}]
            })
        );
    }
}
