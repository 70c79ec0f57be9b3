//! Category forest built once per view load.
//!
//! The backend hands out categories either as a nested forest (`children`
//! arrays) or as a flat list with parent references. Both shapes are
//! flattened into an arena with an `id -> index` map, and every node's
//! ancestor chain is computed up front, so lookups never walk the tree again.
//!
//! Node identity is always the numeric id. Two categories may share a name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CategoryId = i64;

/// Display name of the pseudo-node returned when no category resolves.
pub const ALL_PRODUCTS_LABEL: &str = "All products";

/// The sidebar never drills deeper than this many levels below a root.
const SIDEBAR_MAX_DEPTH: usize = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedTreeError {
    #[error("category {id} references missing parent {parent_id}")]
    UnknownParent {
        id: CategoryId,
        parent_id: CategoryId,
    },

    #[error("category id {0} appears more than once")]
    DuplicateId(CategoryId),

    #[error("category {id} is part of a parent cycle")]
    Cycle { id: CategoryId },
}

/// One category as delivered in a flat payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatCategory {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

/// One category as delivered in a nested payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<NestedCategory>,
}

/// Either payload shape accepted by [`CategoryTree::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryPayload {
    Flat(Vec<FlatCategory>),
    Nested(Vec<NestedCategory>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    /// Child ids in display order.
    pub children: Vec<CategoryId>,
}

/// Result of [`CategoryTree::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// No category selected, or the selected id is not in the forest.
    AllProducts,
    Category {
        node: &'a CategoryNode,
        /// Ordered root → immediate parent.
        ancestor_path: Vec<&'a CategoryNode>,
    },
}

impl<'a> Resolved<'a> {
    #[must_use]
    pub fn is_all_products(&self) -> bool {
        matches!(self, Resolved::AllProducts)
    }

    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        match self {
            Resolved::AllProducts => None,
            Resolved::Category { node, .. } => Some(node.id),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'a str {
        match self {
            Resolved::AllProducts => ALL_PRODUCTS_LABEL,
            Resolved::Category { node, .. } => node.name.as_str(),
        }
    }

    #[must_use]
    pub fn ancestor_path(&self) -> &[&'a CategoryNode] {
        match self {
            Resolved::AllProducts => &[],
            Resolved::Category { ancestor_path, .. } => ancestor_path,
        }
    }

    /// Names from the outermost ancestor down to the resolved node itself.
    #[must_use]
    pub fn breadcrumb(&self) -> Vec<&'a str> {
        match self {
            Resolved::AllProducts => vec![ALL_PRODUCTS_LABEL],
            Resolved::Category {
                node,
                ancestor_path,
            } => ancestor_path
                .iter()
                .map(|a| a.name.as_str())
                .chain(std::iter::once(node.name.as_str()))
                .collect(),
        }
    }
}

/// Immutable category forest with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    index: HashMap<CategoryId, usize>,
    /// Per node, arena indices of its ancestors ordered root → parent.
    ancestors: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl CategoryTree {
    /// Builds the forest from either payload shape.
    ///
    /// # Errors
    ///
    /// - [`MalformedTreeError::DuplicateId`] if an id occurs twice.
    /// - [`MalformedTreeError::UnknownParent`] if a parent reference points
    ///   at an id that is not in the payload.
    /// - [`MalformedTreeError::Cycle`] if following parent references does
    ///   not reach a root within as many steps as there are nodes.
    pub fn build(payload: CategoryPayload) -> Result<Self, MalformedTreeError> {
        let flat = match payload {
            CategoryPayload::Flat(flat) => flat,
            CategoryPayload::Nested(roots) => flatten_nested(roots),
        };
        Self::from_flat(flat)
    }

    fn from_flat(flat: Vec<FlatCategory>) -> Result<Self, MalformedTreeError> {
        let mut index = HashMap::with_capacity(flat.len());
        for (idx, category) in flat.iter().enumerate() {
            if index.insert(category.id, idx).is_some() {
                return Err(MalformedTreeError::DuplicateId(category.id));
            }
        }

        let mut nodes: Vec<CategoryNode> = flat
            .into_iter()
            .map(|c| CategoryNode {
                id: c.id,
                name: c.name,
                parent_id: c.parent_id,
                children: Vec::new(),
            })
            .collect();

        let mut roots = Vec::new();
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(nodes.len());
        for idx in 0..nodes.len() {
            let node = &nodes[idx];
            match node.parent_id {
                None => {
                    roots.push(idx);
                    parents.push(None);
                }
                Some(parent_id) if parent_id == node.id => {
                    return Err(MalformedTreeError::Cycle { id: node.id });
                }
                Some(parent_id) => {
                    let Some(&parent_idx) = index.get(&parent_id) else {
                        return Err(MalformedTreeError::UnknownParent {
                            id: node.id,
                            parent_id,
                        });
                    };
                    parents.push(Some(parent_idx));
                }
            }
        }

        for (idx, parent) in parents.iter().enumerate() {
            if let Some(parent_idx) = *parent {
                let child_id = nodes[idx].id;
                nodes[parent_idx].children.push(child_id);
            }
        }

        // Bounded walk: a chain longer than the node count can only be a cycle.
        let limit = nodes.len();
        let mut ancestors = Vec::with_capacity(nodes.len());
        for idx in 0..nodes.len() {
            let mut chain = Vec::new();
            let mut cursor = parents[idx];
            while let Some(parent_idx) = cursor {
                if chain.len() >= limit {
                    return Err(MalformedTreeError::Cycle { id: nodes[idx].id });
                }
                chain.push(parent_idx);
                cursor = parents[parent_idx];
            }
            chain.reverse();
            ancestors.push(chain);
        }

        tracing::debug!(
            nodes = nodes.len(),
            roots = roots.len(),
            "built category forest"
        );

        Ok(Self {
            nodes,
            index,
            ancestors,
            roots,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.index.get(&id).map(|&idx| &self.nodes[idx])
    }

    /// Root nodes in display order.
    pub fn roots(&self) -> impl Iterator<Item = &CategoryNode> {
        self.roots.iter().map(|&idx| &self.nodes[idx])
    }

    /// Immediate children of `node` in display order.
    pub fn children<'a>(
        &'a self,
        node: &'a CategoryNode,
    ) -> impl Iterator<Item = &'a CategoryNode> {
        node.children.iter().filter_map(|id| self.get(*id))
    }

    /// Looks up a category and its ancestor chain.
    ///
    /// An absent or unknown id yields [`Resolved::AllProducts`]; that is the
    /// normal initial state of a view, not an error.
    #[must_use]
    pub fn resolve(&self, id: Option<CategoryId>) -> Resolved<'_> {
        let Some(&idx) = id.and_then(|id| self.index.get(&id)) else {
            return Resolved::AllProducts;
        };
        Resolved::Category {
            node: &self.nodes[idx],
            ancestor_path: self.ancestors[idx]
                .iter()
                .map(|&a| &self.nodes[a])
                .collect(),
        }
    }

    /// Children shown for drill-down below `id`, where `depth` is the length
    /// of the node's ancestor path.
    ///
    /// Only roots (depth 0) and first-level nodes (depth 1) expose children;
    /// anything deeper returns an empty list regardless of the real tree.
    #[must_use]
    pub fn children_for(&self, id: CategoryId, depth: usize) -> Vec<&CategoryNode> {
        if depth > SIDEBAR_MAX_DEPTH {
            return Vec::new();
        }
        self.get(id)
            .map(|node| self.children(node).collect())
            .unwrap_or_default()
    }

    /// Entries for the browsing sidebar.
    ///
    /// With no selection (or an unresolved one) this lists the children of
    /// every root, in root order.
    #[must_use]
    pub fn sidebar(&self, selected: Option<CategoryId>) -> Vec<&CategoryNode> {
        match self.resolve(selected) {
            Resolved::AllProducts => self
                .roots()
                .flat_map(|root| self.children(root))
                .collect(),
            Resolved::Category {
                node,
                ancestor_path,
            } => self.children_for(node.id, ancestor_path.len()),
        }
    }

    /// The node itself followed by all of its descendants, depth-first.
    /// Empty when `id` is unknown.
    #[must_use]
    pub fn subtree_ids(&self, id: CategoryId) -> Vec<CategoryId> {
        let Some(root) = self.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node.id);
            stack.extend(node.children.iter().rev().filter_map(|c| self.get(*c)));
        }
        out
    }

    /// Depth-first `(depth, node)` listing of the whole forest, as the admin
    /// category picker renders it.
    #[must_use]
    pub fn picker_entries(&self) -> Vec<(usize, &CategoryNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, &CategoryNode)> = self
            .roots
            .iter()
            .rev()
            .map(|&idx| (0, &self.nodes[idx]))
            .collect();
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .filter_map(|c| self.get(*c))
                    .map(|child| (depth + 1, child)),
            );
        }
        out
    }
}

/// Pre-order flattening that keeps sibling order and derives parent ids
/// from nesting.
fn flatten_nested(roots: Vec<NestedCategory>) -> Vec<FlatCategory> {
    let mut out = Vec::new();
    let mut stack: Vec<(NestedCategory, Option<CategoryId>)> =
        roots.into_iter().rev().map(|root| (root, None)).collect();
    while let Some((category, parent_id)) = stack.pop() {
        let NestedCategory { id, name, children } = category;
        out.push(FlatCategory {
            id,
            name,
            parent_id,
        });
        stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
    }
    out
}

#[cfg(test)]
#[path = "category_test.rs"]
mod tests;
