//! The pre-trained regression model behind the simulator.
//!
//! The rest of the system treats the model as an opaque capability: given
//! a numeric vector of schema width, return a numeric prediction. That
//! capability is the `Regressor` trait; `TreeModel` is the concrete
//! artifact, a fitted decision tree stored as a flat node array in a
//! human-readable TOML file. Training happened elsewhere; this module only
//! loads, validates, and evaluates.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// The opaque prediction capability. Implementations must accept any
/// vector of the arity they were fitted on; the caller guarantees the
/// arity (see `PredictionService`), and nothing here retrains or
/// introspects the model.
pub trait Regressor {
    fn predict(&self, features: ArrayView1<f64>) -> f64;
}

/// One node of the fitted tree. Children are indices into the node array
/// and always point forward, so evaluation is a bounded walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted decision-tree regressor. Node 0 is the root. The structure is
/// validated once at construction/load; evaluation after that cannot fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeModel {
    /// Arity the tree was fitted on; split feature indices stay below it.
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

/// Errors from loading, saving, or validating a model artifact. All of
/// these are fatal at startup; a process without a usable model cannot
/// serve predictions.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Model artifact contains no nodes; a fitted tree has at least a root leaf.")]
    EmptyTree,
    #[error(
        "Tree node {node} references child {child}, but the artifact only has {node_count} nodes."
    )]
    DanglingChild {
        node: usize,
        child: usize,
        node_count: usize,
    },
    #[error(
        "Tree node {node} references child {child}, which does not come after it; the artifact is not a well-formed tree."
    )]
    BackwardChild { node: usize, child: usize },
    #[error(
        "Tree node {node} splits on feature {feature}, but the model was fitted on {n_features} features."
    )]
    FeatureOutOfRange {
        node: usize,
        feature: usize,
        n_features: usize,
    },
}

impl TreeModel {
    /// Builds a model from its parts, rejecting structurally invalid
    /// trees.
    pub fn new(n_features: usize, nodes: Vec<TreeNode>) -> Result<Self, ModelError> {
        let model = TreeModel { n_features, nodes };
        model.validate()?;
        Ok(model)
    }

    /// Saves the model to a human-readable TOML artifact.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        Ok(())
    }

    /// Loads and validates a model artifact. A model that parses but is
    /// not a well-formed tree is rejected here, so that evaluation never
    /// has to handle malformed structure.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let toml_string = fs::read_to_string(path)?;
        let model: TreeModel = toml::from_str(&toml_string)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::EmptyTree);
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= self.n_features {
                    return Err(ModelError::FeatureOutOfRange {
                        node: index,
                        feature: *feature,
                        n_features: self.n_features,
                    });
                }
                for child in [*left, *right] {
                    if child >= self.nodes.len() {
                        return Err(ModelError::DanglingChild {
                            node: index,
                            child,
                            node_count: self.nodes.len(),
                        });
                    }
                    if child <= index {
                        return Err(ModelError::BackwardChild { node: index, child });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Regressor for TreeModel {
    /// Walks the tree from the root. A NaN feature fails `<= threshold`
    /// and routes right, so missing numeric answers still evaluate
    /// deterministically.
    fn predict(&self, features: ArrayView1<f64>) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}
