use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::value::ConfigValue;

pub type AttributeMap = BTreeMap<String, ConfigValue>;
pub type BlockMap = BTreeMap<String, Vec<Block>>;

/// Typed, total lookups shared by [`Resource`] and [`Block`].
///
/// Every getter returns `None` when the attribute is absent *or* holds an
/// incompatible variant. An attribute dropped from a plan because its value is
/// known only after apply looks exactly like one that was never configured.
pub trait Attributes {
    fn attributes(&self) -> &AttributeMap;
    fn blocks(&self) -> &BlockMap;

    fn get_attr(&self, name: &str) -> Option<&ConfigValue> {
        self.attributes().get(name)
    }

    fn get_string_attr(&self, name: &str) -> Option<&str> {
        self.get_attr(name).and_then(ConfigValue::as_str)
    }

    fn get_bool_attr(&self, name: &str) -> Option<bool> {
        self.get_attr(name).and_then(ConfigValue::as_bool)
    }

    fn get_number_attr(&self, name: &str) -> Option<f64> {
        self.get_attr(name).and_then(ConfigValue::as_f64)
    }

    fn get_list_attr(&self, name: &str) -> Option<&[ConfigValue]> {
        self.get_attr(name).and_then(ConfigValue::as_list)
    }

    fn get_object_attr(&self, name: &str) -> Option<&AttributeMap> {
        self.get_attr(name).and_then(ConfigValue::as_object)
    }

    fn has_block(&self, block_type: &str) -> bool {
        !self.get_blocks(block_type).is_empty()
    }

    /// Nested blocks of `block_type`, in declaration order. Empty when none exist.
    fn get_blocks(&self, block_type: &str) -> &[Block] {
        self.blocks()
            .get(block_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// One declared or planned infrastructure resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Resource type, `data.`-prefixed for data sources.
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Source path, or [`crate::extract::plan::PLAN_FILE`] for plan-derived resources.
    pub file: String,
    /// 1-based line of the block header; 0 when unknown.
    pub line: usize,
    /// Module-qualified plan address. Only set for plan-derived resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub blocks: BlockMap,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Address used in findings: the plan address when known, else `type.name`.
    pub fn address(&self) -> String {
        match &self.full_address {
            Some(addr) => addr.clone(),
            None => format!("{}.{}", self.resource_type, self.name),
        }
    }

    pub fn with_location(mut self, file: impl Into<String>, line: usize) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks
            .entry(block.block_type.clone())
            .or_default()
            .push(block);
        self
    }
}

impl Attributes for Resource {
    fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    fn blocks(&self) -> &BlockMap {
        &self.blocks
    }
}

/// A nested, possibly repeated configuration block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub blocks: BlockMap,
}

impl Block {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks
            .entry(block.block_type.clone())
            .or_default()
            .push(block);
        self
    }
}

impl Attributes for Block {
    fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    fn blocks(&self) -> &BlockMap {
        &self.blocks
    }
}
