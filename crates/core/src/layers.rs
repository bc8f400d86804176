//! Pure transformation of a MapServer descriptor into its layer list

use crate::catalog::UNKNOWN_TYPE;
use serde::Serialize;
use serde_json::Value;

/// One layer of a map service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub layer_type: String,
}

/// Project the `layers` array of a service descriptor
///
/// Entries without a numeric `id` are dropped. A missing `name` becomes an
/// empty string and a missing `type` becomes [`UNKNOWN_TYPE`].
pub fn transform_layers(descriptor: &Value) -> Vec<LayerSummary> {
    descriptor
        .get("layers")
        .and_then(Value::as_array)
        .map(|layers| {
            layers
                .iter()
                .filter_map(|layer| {
                    Some(LayerSummary {
                        id: layer.get("id")?.as_i64()?,
                        name: layer
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        layer_type: layer
                            .get("type")
                            .and_then(Value::as_str)
                            .unwrap_or(UNKNOWN_TYPE)
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
