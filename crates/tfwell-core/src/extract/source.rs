//! Source extractor: Terraform `.tf` files into canonical [`Resource`]s.
//!
//! Responsibilities:
//! - Walk a directory for configuration source (see [`crate::extract::walk`])
//! - Extract top-level `resource` and `data` blocks with two labels
//! - Evaluate attribute expressions statically, with no variables or functions
//!
//! Expressions that need runtime context (variables, references to other
//! resources, function calls) do not fail extraction. They are kept as a
//! `${<source text>}` string, sliced verbatim from the file, so rules can tell
//! them apart from literals.

use std::fs;
use std::ops::Range;
use std::path::Path;

use hcl::eval::{Context, Evaluate};
use hcl_edit::Span;
use hcl_edit::expr::Expression;
use hcl_edit::structure::{Body, Structure};

use crate::error::{ExtractError, ExtractResult};
use crate::extract::walk;
use crate::model::resource::{AttributeMap, Block, BlockMap, Resource};
use crate::model::value::ConfigValue;

const RESOURCE_KIND: &str = "resource";
const DATA_KIND: &str = "data";
pub const DATA_PREFIX: &str = "data.";

/// Parse every `.tf` file under `root` and return resources in walk order,
/// then block order within each file.
///
/// Fails fast: the first file that cannot be read or parsed aborts the pass.
pub fn parse_dir(root: &Path) -> ExtractResult<Vec<Resource>> {
    let paths = walk::collect_source_paths(root)?;

    let mut resources = Vec::new();
    for path in &paths {
        resources.extend(parse_file(path)?);
    }

    log::info!(
        "extracted {} resources from {} source files under {}",
        resources.len(),
        paths.len(),
        root.display()
    );

    Ok(resources)
}

/// Read and parse a single configuration file.
pub fn parse_file(path: &Path) -> ExtractResult<Vec<Resource>> {
    let src = fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&src, path)
}

/// Parse configuration text that was read from `path`.
pub fn parse_source(src: &str, path: &Path) -> ExtractResult<Vec<Resource>> {
    let body = hcl_edit::parser::parse_body(src).map_err(|source| ExtractError::Hcl {
        path: path.to_path_buf(),
        source,
    })?;

    let file = path.display().to_string();
    let source = SourceText::new(src);
    let ctx = Context::new();
    let mut resources = Vec::new();

    for structure in body.iter() {
        let Structure::Block(block) = structure else {
            continue;
        };

        let kind = block.ident.as_str();
        if kind != RESOURCE_KIND && kind != DATA_KIND {
            continue;
        }

        if block.labels.len() < 2 {
            log::debug!(
                "{}: skipping `{}` block with {} label(s)",
                file,
                kind,
                block.labels.len()
            );
            continue;
        }

        let type_label = block.labels[0].as_str();
        let name = block.labels[1].as_str().to_string();
        let line = block
            .ident
            .span()
            .or_else(|| block.span())
            .map_or(0, |span| source.line_of(span.start));

        let resource_type = if kind == DATA_KIND {
            format!("{DATA_PREFIX}{type_label}")
        } else {
            type_label.to_string()
        };

        let (attributes, blocks) = convert_body(&block.body, &source, &ctx);

        resources.push(Resource {
            resource_type,
            name,
            file: file.clone(),
            line,
            full_address: None,
            attributes,
            blocks,
        });
    }

    Ok(resources)
}

/// Split a body into evaluated attributes and recursively converted blocks.
fn convert_body(body: &Body, source: &SourceText<'_>, ctx: &Context) -> (AttributeMap, BlockMap) {
    let mut attributes = AttributeMap::new();
    let mut blocks = BlockMap::new();

    for structure in body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                let value = evaluate_expr(&attr.value, source, ctx);
                attributes.insert(attr.key.as_str().to_string(), value);
            }
            Structure::Block(block) => {
                let block_type = block.ident.as_str().to_string();
                let labels = block
                    .labels
                    .iter()
                    .map(|l| l.as_str().to_string())
                    .collect();
                let (attributes, nested) = convert_body(&block.body, source, ctx);

                blocks.entry(block_type.clone()).or_default().push(Block {
                    block_type,
                    labels,
                    attributes,
                    blocks: nested,
                });
            }
        }
    }

    (attributes, blocks)
}

/// Evaluate `expr` with no variables or functions in scope.
///
/// On failure the expression's original source text is kept, wrapped as `${...}`.
fn evaluate_expr(expr: &Expression, source: &SourceText<'_>, ctx: &Context) -> ConfigValue {
    let converted = hcl::Expression::from(expr.clone());
    match converted.evaluate(ctx) {
        Ok(value) => ConfigValue::from(value),
        Err(err) => {
            let text = match expr.span().and_then(|span| source.slice(span)) {
                Some(text) => text.to_string(),
                None => hcl::format::to_string(&converted)
                    .unwrap_or_else(|_| format!("{converted:?}")),
            };
            log::debug!("keeping unresolved expression `{}`: {}", text, err);
            ConfigValue::unresolved(&text)
        }
    }
}

/// Original file text with a line-start index for span lookups.
struct SourceText<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceText<'a> {
    fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    /// 1-based line holding byte `offset`.
    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    fn slice(&self, span: Range<usize>) -> Option<&'a str> {
        self.text.get(span).map(str::trim)
    }
}
