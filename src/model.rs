//! Input model: the binary decision tree handed to the renderer.
//!
//! The tree is externally owned; the renderer only borrows it for the
//! duration of one call. A node is either a split (feature index plus
//! threshold, routing left/right) or a leaf carrying a prediction, so the
//! leaf/internal invariant is structural rather than checked at runtime.

use std::fmt;

use termtree::Tree;

/// Internal decision node: routes on `feature < threshold`.
///
/// Either child may be absent; a one-armed split is laid out like any other
/// internal node, just with a single outgoing edge.
#[derive(Debug, Clone)]
pub struct SplitNode {
    /// Index of the feature the split tests
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f64,
    /// Subtree for samples where feature < threshold
    pub left: Option<Box<DecisionTree>>,
    /// Subtree for samples where feature >= threshold
    pub right: Option<Box<DecisionTree>>,
}

/// Terminal node carrying the predicted class label or regression value.
#[derive(Debug, Clone)]
pub struct LeafNode {
    pub prediction: f64,
}

/// A node in a binary decision tree (either split node or leaf).
#[derive(Debug, Clone)]
pub enum DecisionTree {
    Split(SplitNode),
    Leaf(LeafNode),
}

impl DecisionTree {
    /// Builds a split node. Children are taken by value and boxed here so
    /// call sites can nest constructors without `Box::new` noise.
    pub fn split(
        feature_idx: usize,
        threshold: f64,
        left: Option<DecisionTree>,
        right: Option<DecisionTree>,
    ) -> Self {
        DecisionTree::Split(SplitNode {
            feature_idx,
            threshold,
            left: left.map(Box::new),
            right: right.map(Box::new),
        })
    }

    pub fn leaf(prediction: f64) -> Self {
        DecisionTree::Leaf(LeafNode { prediction })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, DecisionTree::Leaf(_))
    }

    /// Depth of the tree rooted at this node. A lone leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            DecisionTree::Leaf(_) => 1,
            DecisionTree::Split(split) => {
                1 + split
                    .children()
                    .map(|child| child.depth())
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Total number of nodes in the tree rooted at this node.
    pub fn node_count(&self) -> usize {
        match self {
            DecisionTree::Leaf(_) => 1,
            DecisionTree::Split(split) => {
                1 + split.children().map(|child| child.node_count()).sum::<usize>()
            }
        }
    }

    /// The annotation shown on/near this node in the diagram.
    ///
    /// Splits render as `Ft[<feature_idx>]<<threshold>` with the threshold at
    /// two decimals; leaves render their raw prediction value (integral
    /// predictions print without a decimal point).
    pub fn label(&self) -> String {
        match self {
            DecisionTree::Split(split) => {
                format!("Ft[{}]<{:.2}", split.feature_idx, split.threshold)
            }
            DecisionTree::Leaf(leaf) => format!("{}", leaf.prediction),
        }
    }
}

impl SplitNode {
    /// Present children, left before right.
    pub fn children(&self) -> impl Iterator<Item = &DecisionTree> {
        self.left
            .as_deref()
            .into_iter()
            .chain(self.right.as_deref())
    }
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub trait ToTextTree {
    fn to_text_tree(&self) -> Tree<String>;
}

/// Text rendition of the tree for logs and debugging, one labelled node per
/// line with box-drawing connectors.
impl ToTextTree for DecisionTree {
    fn to_text_tree(&self) -> Tree<String> {
        let root = self.label();

        let leaves: Vec<_> = match self {
            DecisionTree::Leaf(_) => Vec::new(),
            DecisionTree::Split(split) => {
                split.children().map(|child| child.to_text_tree()).collect()
            }
        };

        Tree::new(root).with_leaves(leaves)
    }
}
