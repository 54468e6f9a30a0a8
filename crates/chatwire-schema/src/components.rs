//! # Component Tree Validator
//!
//! Structural rules for interactive component trees, checked on top of the
//! per-node field validation:
//!
//! - Top-level nodes must be containers (action rows), at most
//!   `max_rows` of them.
//! - A row holds between one and `max_row_children` children.
//! - Containers never nest. A row inside a row is
//!   `NestedContainerNotAllowed`.
//! - A select menu is alone in its row. Text inputs appear only on modal
//!   surfaces, one per row. Buttons never appear on modals; unrecognized
//!   lenient nodes are not buttons and pass that check.
//! - `custom_id` values are unique across the whole tree.
//!
//! ## Depth
//!
//! The walk carries an explicit depth counter (1 for top-level rows, 2 for
//! their children). A nested container is always rejected; its subtree is
//! still inspected for further errors while its children sit no deeper than
//! `max_component_depth`. The default of 2 reports the nested container
//! alone. Either way the recursion is bounded by configuration rather than
//! by the input.

use std::collections::HashSet;

use chatwire_core::{FieldPath, ValidationError};
use serde_json::{Map, Value};

use crate::fields::{json_kind, Flow, Halt, Pass};
use crate::registry::{ComponentClass, VariantSchema};
use crate::resolver::{resolve, Resolution, ResolveContext};

/// Where a component tree is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Surface {
    /// Message components: buttons and selects, no text inputs.
    #[default]
    Message,
    /// Modal dialogs: one input per row.
    Modal,
}

/// What a visited node contributes to its parent's composition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeOutcome {
    /// Already reported, or not an object.
    Invalid,
    /// Lenient fallback. Takes up a slot in its row but has no class.
    Unrecognized,
    Class(ComponentClass),
}

impl<'r> Pass<'r> {
    /// Validate a top-level component list.
    pub(crate) fn check_tree(&mut self, nodes: &[Value], surface: Surface, path: &FieldPath) -> Flow {
        let limit = self.registry.config().max_rows;
        if nodes.len() > limit {
            self.sink.push(ValidationError::TooManyChildren {
                path: path.clone(),
                limit,
                found: nodes.len(),
            })?;
        }
        let mut custom_ids = HashSet::new();
        for (i, node) in nodes.iter().enumerate() {
            self.check_node(node, surface, &path.index(i), 1, &mut custom_ids)?;
        }
        Ok(())
    }

    fn check_node<'v>(
        &mut self,
        node: &'v Value,
        surface: Surface,
        path: &FieldPath,
        depth: usize,
        custom_ids: &mut HashSet<&'v str>,
    ) -> Result<NodeOutcome, Halt> {
        let Some(map) = node.as_object() else {
            self.sink.push(ValidationError::TypeMismatch {
                path: path.clone(),
                expected: "component object".to_string(),
                found: json_kind(node).to_string(),
            })?;
            return Ok(NodeOutcome::Invalid);
        };

        let ctx = if depth == 1 {
            ResolveContext::TopLevelComponent
        } else {
            ResolveContext::ActionRowChild
        };
        let schema = match resolve(self.registry, map, ctx, path) {
            Ok(Resolution::Known(schema)) => schema,
            Ok(Resolution::Unrecognized { .. }) => return Ok(NodeOutcome::Unrecognized),
            Err(e) => {
                self.sink.push(e)?;
                return Ok(NodeOutcome::Invalid);
            }
        };
        let class = schema.component_class().unwrap_or(ComponentClass::Control);

        if class == ComponentClass::Container {
            if depth == 1 {
                self.check_row(map, schema, surface, path, depth, custom_ids)?;
                return Ok(NodeOutcome::Class(class));
            }
            self.sink
                .push(ValidationError::NestedContainerNotAllowed { path: path.clone(), depth })?;
            if depth < self.registry.config().max_component_depth {
                self.check_row(map, schema, surface, path, depth, custom_ids)?;
            }
            return Ok(NodeOutcome::Invalid);
        }

        if depth == 1 {
            self.sink.push(ValidationError::InvalidRowComposition {
                path: path.clone(),
                reason: format!("top-level components must be action rows, found {}", schema.name()),
            })?;
        }
        self.check_leaf(map, schema, path, custom_ids)
    }

    fn check_row<'v>(
        &mut self,
        map: &'v Map<String, Value>,
        schema: &VariantSchema,
        surface: Surface,
        path: &FieldPath,
        depth: usize,
        custom_ids: &mut HashSet<&'v str>,
    ) -> Flow {
        self.check_variant(map, schema, path, 0)?;
        let Some(children) = map.get("components").and_then(Value::as_array) else {
            return Ok(());
        };

        if children.is_empty() {
            return self.sink.push(ValidationError::InvalidRowComposition {
                path: path.clone(),
                reason: "action rows must hold at least one component".to_string(),
            });
        }
        let limit = self.registry.config().max_row_children;
        if children.len() > limit {
            self.sink.push(ValidationError::TooManyChildren {
                path: path.clone(),
                limit,
                found: children.len(),
            })?;
        }

        let children_path = path.key("components");
        let mut outcomes = Vec::with_capacity(children.len());
        for (j, child) in children.iter().enumerate() {
            outcomes.push(self.check_node(child, surface, &children_path.index(j), depth + 1, custom_ids)?);
        }
        self.check_composition(&outcomes, children.len(), surface, path)
    }

    fn check_composition(
        &mut self,
        outcomes: &[NodeOutcome],
        child_count: usize,
        surface: Surface,
        path: &FieldPath,
    ) -> Flow {
        let count = |class: ComponentClass| {
            outcomes
                .iter()
                .filter(|o| **o == NodeOutcome::Class(class))
                .count()
        };
        let selections = count(ComponentClass::Selection);
        let text_inputs = count(ComponentClass::TextInput);
        let controls = count(ComponentClass::Control);

        let violation = match surface {
            Surface::Message if text_inputs > 0 => {
                Some("text inputs are only allowed in modals".to_string())
            }
            Surface::Message if selections > 0 && child_count > 1 => {
                Some("a select menu must be the only component in its row".to_string())
            }
            Surface::Modal if controls > 0 => Some("buttons are not allowed in modals".to_string()),
            Surface::Modal if child_count > 1 => {
                Some("modal rows hold exactly one input".to_string())
            }
            _ => None,
        };
        match violation {
            Some(reason) => self.sink.push(ValidationError::InvalidRowComposition {
                path: path.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn check_leaf<'v>(
        &mut self,
        map: &'v Map<String, Value>,
        schema: &VariantSchema,
        path: &FieldPath,
        custom_ids: &mut HashSet<&'v str>,
    ) -> Result<NodeOutcome, Halt> {
        let class = schema.component_class().unwrap_or(ComponentClass::Control);

        // Base fields and id uniqueness hold whatever the style turns out to be.
        self.check_variant(map, schema, path, 0)?;
        if let Some(id) = map.get("custom_id").and_then(Value::as_str) {
            if !custom_ids.insert(id) {
                self.sink.push(ValidationError::InvalidVariantCombination {
                    path: path.key("custom_id"),
                    reason: format!("duplicate custom_id '{id}'"),
                })?;
            }
        }

        if schema.secondary_family().is_some() {
            match resolve(self.registry, map, ResolveContext::ButtonStyle, path) {
                Ok(Resolution::Known(style)) => self.check_variant(map, style, path, 0)?,
                Ok(Resolution::Unrecognized { .. }) => return Ok(NodeOutcome::Unrecognized),
                Err(e) => {
                    self.sink.push(e)?;
                    return Ok(NodeOutcome::Invalid);
                }
            }
        }
        Ok(NodeOutcome::Class(class))
    }
}
