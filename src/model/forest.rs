use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::InferenceError;

/// Pre-trained random forest exported from the original training run as JSON.
/// Each tree is a flat node array; traversal starts at node 0 and follows the
/// usual `feature <= threshold` rule.
#[derive(Debug, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    n_classes: usize,
    trees: Vec<Tree>,
}

#[derive(Debug, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

impl RandomForest {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let raw = fs::read_to_string(path)?;
        let forest: RandomForest = serde_json::from_str(&raw)
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;
        forest.validate()?;
        Ok(forest)
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Majority vote over all trees; ties resolve to the lowest class index.
    pub fn predict(&self, features: &[f32]) -> Result<usize, InferenceError> {
        if features.len() != self.n_features {
            return Err(InferenceError::ShapeMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.decide(features)] += 1;
        }
        let winner = votes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(class, _)| class)
            .unwrap_or(0);
        Ok(winner)
    }

    // Validated up-front so traversal never has to handle bad indices.
    fn validate(&self) -> Result<(), InferenceError> {
        if self.trees.is_empty() || self.n_classes == 0 || self.n_features == 0 {
            return Err(InferenceError::Malformed(
                "forest must declare trees, classes and features".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(InferenceError::Malformed(format!("tree {i} has no nodes")));
            }
            for node in &tree.nodes {
                match node {
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            return Err(InferenceError::Malformed(format!(
                                "tree {i} has a child index out of range"
                            )));
                        }
                        if *feature >= self.n_features {
                            return Err(InferenceError::Malformed(format!(
                                "tree {i} splits on feature {feature}, forest has {}",
                                self.n_features
                            )));
                        }
                    }
                    Node::Leaf { class } => {
                        if *class >= self.n_classes {
                            return Err(InferenceError::Malformed(format!(
                                "tree {i} has a leaf class out of range"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Tree {
    fn decide(&self, features: &[f32]) -> usize {
        let mut node = 0usize;
        // Bounded by node count to stay safe against cyclic child links.
        for _ in 0..self.nodes.len() {
            match &self.nodes[node] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_forest() -> RandomForest {
        // Two trees over two features and three classes. Tree one splits on
        // feature 0, tree two always answers class 1.
        let raw = r#"{
            "n_features": 2,
            "n_classes": 3,
            "trees": [
                {"nodes": [
                    {"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
                    {"class": 0},
                    {"class": 2}
                ]},
                {"nodes": [{"class": 1}]},
                {"nodes": [
                    {"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
                    {"class": 0},
                    {"class": 2}
                ]}
            ]
        }"#;
        let forest: RandomForest = serde_json::from_str(raw).unwrap();
        forest.validate().unwrap();
        forest
    }

    #[test]
    fn majority_vote_follows_splits() {
        let forest = sample_forest();
        assert_eq!(forest.predict(&[0.1, 9.0]).unwrap(), 0);
        assert_eq!(forest.predict(&[0.9, 9.0]).unwrap(), 2);
    }

    #[test]
    fn wrong_feature_count_is_shape_mismatch() {
        let forest = sample_forest();
        let err = forest.predict(&[0.1]).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn ties_resolve_to_lowest_class() {
        let raw = r#"{
            "n_features": 1,
            "n_classes": 2,
            "trees": [
                {"nodes": [{"class": 1}]},
                {"nodes": [{"class": 0}]}
            ]
        }"#;
        let forest: RandomForest = serde_json::from_str(raw).unwrap();
        assert_eq!(forest.predict(&[0.0]).unwrap(), 0);
    }

    #[test]
    fn out_of_range_split_feature_fails_validation() {
        let raw = r#"{
            "n_features": 1,
            "n_classes": 2,
            "trees": [{"nodes": [
                {"feature": 3, "threshold": 0.0, "left": 1, "right": 1},
                {"class": 0}
            ]}]
        }"#;
        let forest: RandomForest = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            forest.validate().unwrap_err(),
            InferenceError::Malformed(_)
        ));
    }

    #[test]
    fn out_of_range_child_fails_validation() {
        let raw = r#"{
            "n_features": 1,
            "n_classes": 2,
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 0.0, "left": 5, "right": 1},
                {"class": 0}
            ]}]
        }"#;
        let forest: RandomForest = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            forest.validate().unwrap_err(),
            InferenceError::Malformed(_)
        ));
    }
}
