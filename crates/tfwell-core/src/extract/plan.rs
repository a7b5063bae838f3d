//! Plan extractor: `terraform show -json` output into canonical [`Resource`]s.
//!
//! The output represents post-apply state:
//! - resources whose only planned action is `delete` are pruned
//! - `null` values (unknown until apply) are dropped, so they read exactly like
//!   attributes that were never configured
//! - `mode = "data"` resources get the same `data.` prefix as source data blocks

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ExtractError, ExtractResult};
use crate::extract::source::DATA_PREFIX;
use crate::model::resource::{AttributeMap, Block, BlockMap, Resource};
use crate::model::value::ConfigValue;

/// `file` value of every plan-derived resource; plan JSON has no source locations.
pub const PLAN_FILE: &str = "<plan>";

const DATA_MODE: &str = "data";
const DELETE_ACTION: &str = "delete";

/// Subset of the plan document this extractor reads.
#[derive(Debug, Deserialize)]
struct PlanDocument {
    #[serde(default)]
    planned_values: Option<PlannedValues>,
    #[serde(default)]
    resource_changes: Vec<ResourceChange>,
}

#[derive(Debug, Deserialize)]
struct PlannedValues {
    #[serde(default)]
    root_module: Option<PlanModule>,
}

#[derive(Debug, Deserialize)]
struct PlanModule {
    #[serde(default)]
    resources: Vec<PlanResource>,
    #[serde(default)]
    child_modules: Vec<PlanModule>,
}

#[derive(Debug, Deserialize)]
struct PlanResource {
    address: String,
    #[serde(default)]
    mode: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    values: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ResourceChange {
    address: String,
    change: Change,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    actions: Vec<String>,
}

impl ResourceChange {
    fn is_destroy_only(&self) -> bool {
        self.change.actions.len() == 1 && self.change.actions[0] == DELETE_ACTION
    }
}

/// Parse plan JSON bytes into resources, depth-first over the module tree.
pub fn parse_plan(bytes: &[u8]) -> ExtractResult<Vec<Resource>> {
    let doc: PlanDocument = serde_json::from_slice(bytes)?;
    convert_document(doc)
}

pub fn parse_plan_str(json: &str) -> ExtractResult<Vec<Resource>> {
    let doc: PlanDocument = serde_json::from_str(json)?;
    convert_document(doc)
}

/// Read and parse a plan JSON file.
pub fn parse_plan_file(path: &Path) -> ExtractResult<Vec<Resource>> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_plan(&bytes)
}

fn convert_document(doc: PlanDocument) -> ExtractResult<Vec<Resource>> {
    let planned = doc.planned_values.ok_or_else(|| ExtractError::Structure {
        context: "plan JSON".to_string(),
        message: "missing `planned_values`".to_string(),
    })?;

    let destroyed: HashSet<&str> = doc
        .resource_changes
        .iter()
        .filter(|rc| rc.is_destroy_only())
        .map(|rc| rc.address.as_str())
        .collect();

    let mut resources = Vec::new();
    match planned.root_module {
        Some(root) => walk_module(root, &destroyed, &mut resources),
        None => log::info!("plan has no root_module; nothing to analyze"),
    }

    log::info!(
        "extracted {} planned resources ({} pending destroy)",
        resources.len(),
        destroyed.len()
    );

    Ok(resources)
}

/// Depth-first: a module's own resources, then each child module in order.
fn walk_module(module: PlanModule, destroyed: &HashSet<&str>, out: &mut Vec<Resource>) {
    for res in module.resources {
        if destroyed.contains(res.address.as_str()) {
            log::debug!("skipping {}: planned for destroy", res.address);
            continue;
        }
        out.push(convert_resource(res));
    }

    for child in module.child_modules {
        walk_module(child, destroyed, out);
    }
}

fn convert_resource(res: PlanResource) -> Resource {
    let resource_type = if res.mode == DATA_MODE {
        format!("{DATA_PREFIX}{}", res.resource_type)
    } else {
        res.resource_type
    };

    let (attributes, blocks) = convert_values(res.values.unwrap_or_default());

    Resource {
        resource_type,
        name: res.name,
        file: PLAN_FILE.to_string(),
        line: 0,
        full_address: Some(res.address),
        attributes,
        blocks,
    }
}

/// Split a plan `values` map into attributes and nested blocks.
///
/// Top-level nulls are dropped. Everything classified by [`is_block_list`]
/// becomes blocks, converted with the same rules.
fn convert_values(values: Map<String, Value>) -> (AttributeMap, BlockMap) {
    let mut attributes = AttributeMap::new();
    let mut blocks = BlockMap::new();

    for (key, value) in values {
        if value.is_null() {
            continue;
        }

        if is_block_list(&value) {
            let Value::Array(items) = value else {
                continue;
            };
            let converted = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => {
                        let (attributes, blocks) = convert_values(map);
                        Some(Block {
                            block_type: key.clone(),
                            labels: Vec::new(),
                            attributes,
                            blocks,
                        })
                    }
                    _ => None,
                })
                .collect();
            blocks.insert(key, converted);
        } else {
            attributes.insert(key, ConfigValue::from(value));
        }
    }

    (attributes, blocks)
}

/// Heuristic: a non-empty list whose first element is an object is a nested block.
///
/// No provider schema is consulted, so a genuine list-of-objects attribute is
/// classified as blocks too.
pub fn is_block_list(value: &Value) -> bool {
    match value {
        Value::Array(items) => matches!(items.first(), Some(Value::Object(_))),
        _ => false,
    }
}
