//! Random forest classifier and regressor
//!
//! Bagged ensembles of [`DecisionTree`]s. Each tree is grown on a bootstrap
//! sample drawn from a seeded RNG, so a given config and dataset always yield
//! the same forest.
//!
//! The classifier corrects class imbalance with balanced class weights
//! (`n_samples / (n_classes * class_count)`) and reports the mean positive
//! fraction over trees as its probability. The regressor averages tree
//! outputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{Criterion, DecisionTree, TreeConfig};
use super::{Classifier, Regressor};
use crate::error::{AppError, AppResult};

/// How many features each split considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`
    Sqrt,
    All,
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> Option<usize> {
        match self {
            MaxFeatures::Sqrt => Some(((n_features as f64).sqrt().ceil() as usize).max(1)),
            MaxFeatures::All => None,
        }
    }
}

/// Forest hyper-parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl ForestConfig {
    /// Defaults for the suitability classifier
    pub fn classifier() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }

    /// Defaults for the yield regressor
    pub fn regressor() -> Self {
        Self {
            n_trees: 100,
            max_depth: 12,
            min_samples_split: 4,
            min_samples_leaf: 2,
            max_features: MaxFeatures::All,
            bootstrap: true,
            seed: 42,
        }
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn tree_config(&self, criterion: Criterion, n_features: usize) -> TreeConfig {
        TreeConfig {
            criterion,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features.resolve(n_features),
        }
    }
}

/// Check a training matrix and return its width
fn check_training_input(features: &[Vec<f64>], n_targets: usize) -> AppResult<usize> {
    if features.is_empty() {
        return Err(AppError::Training("no training samples".into()));
    }
    if features.len() != n_targets {
        return Err(AppError::Training(format!(
            "{} feature rows but {} targets",
            features.len(),
            n_targets
        )));
    }
    let width = features[0].len();
    if width == 0 {
        return Err(AppError::Training("feature rows are empty".into()));
    }
    if let Some(pos) = features.iter().position(|row| row.len() != width) {
        return Err(AppError::Training(format!(
            "row {} has {} features, expected {}",
            pos,
            features[pos].len(),
            width
        )));
    }
    if features.iter().flatten().any(|v| !v.is_finite()) {
        return Err(AppError::Training("feature matrix contains non-finite values".into()));
    }
    Ok(width)
}

/// Check an inference row against the width the model was trained on
fn check_inference_input(model: &str, n_features: usize, features: &[f64]) -> AppResult<()> {
    if n_features == 0 {
        return Err(AppError::ModelInference(format!("{} is not fitted", model)));
    }
    if features.len() != n_features {
        return Err(AppError::ModelInference(format!(
            "{} expects {} features, got {}",
            model,
            n_features,
            features.len()
        )));
    }
    Ok(())
}

/// Grow `config.n_trees` trees on bootstrap samples
fn grow_trees(
    config: &ForestConfig,
    criterion: Criterion,
    features: &[Vec<f64>],
    targets: &[f64],
    weights: &[f64],
    n_features: usize,
) -> AppResult<Vec<DecisionTree>> {
    if config.n_trees == 0 {
        return Err(AppError::Training("forest needs at least one tree".into()));
    }
    let mut rng = StdRng::seed_from_u64(config.seed);
    let tree_config = config.tree_config(criterion, n_features);
    let n = features.len();

    (0..config.n_trees)
        .map(|_| {
            let indices: Vec<usize> = if config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            DecisionTree::fit(features, targets, weights, &indices, &tree_config, &mut rng)
        })
        .collect()
}

/// Mean of per-tree normalised importances
fn mean_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut totals = vec![0.0; n_features];
    for tree in trees {
        for (total, value) in totals.iter_mut().zip(tree.feature_importances()) {
            *total += value;
        }
    }
    if !trees.is_empty() {
        totals.iter_mut().for_each(|v| *v /= trees.len() as f64);
    }
    totals
}

/// Random forest binary classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
    class_weights: [f64; 2],
    feature_importances: Vec<f64>,
}

impl RandomForestClassifier {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            class_weights: [1.0, 1.0],
            feature_importances: Vec::new(),
        }
    }

    /// Predicted class label (probability threshold 0.5)
    pub fn predict(&self, features: &[f64]) -> AppResult<u8> {
        Ok(u8::from(self.predict_proba(features)? >= 0.5))
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Weights applied to class 0 and class 1 during the last fit
    pub fn class_weights(&self) -> [f64; 2] {
        self.class_weights
    }

    /// Mean impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

/// Balanced weights `n / (2 * count)`; an absent class gets weight 0
fn balanced_class_weights(labels: &[u8]) -> [f64; 2] {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    let n = labels.len() as f64;
    let weight = |count: usize| {
        if count == 0 {
            0.0
        } else {
            n / (2.0 * count as f64)
        }
    };
    [weight(negatives), weight(positives)]
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> AppResult<()> {
        let n_features = check_training_input(features, labels.len())?;
        if labels.iter().any(|&l| l > 1) {
            return Err(AppError::Training("labels must be 0 or 1".into()));
        }

        let class_weights = balanced_class_weights(labels);
        let weights: Vec<f64> = labels.iter().map(|&l| class_weights[l as usize]).collect();
        let targets: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();

        let trees = grow_trees(
            &self.config,
            Criterion::Gini,
            features,
            &targets,
            &weights,
            n_features,
        )?;

        self.feature_importances = mean_importances(&trees, n_features);
        self.trees = trees;
        self.n_features = n_features;
        self.class_weights = class_weights;
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> AppResult<f64> {
        check_inference_input("classifier", self.n_features, features)?;
        let total: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        let proba = total / self.trees.len() as f64;
        if !proba.is_finite() {
            return Err(AppError::ModelInference(
                "classifier produced a non-finite probability".into(),
            ));
        }
        Ok(proba.clamp(0.0, 1.0))
    }
}

/// Random forest regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> AppResult<()> {
        let n_features = check_training_input(features, targets.len())?;
        if targets.iter().any(|t| !t.is_finite()) {
            return Err(AppError::Training("targets contain non-finite values".into()));
        }
        let weights = vec![1.0; targets.len()];

        let trees = grow_trees(
            &self.config,
            Criterion::SquaredError,
            features,
            targets,
            &weights,
            n_features,
        )?;

        self.feature_importances = mean_importances(&trees, n_features);
        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> AppResult<f64> {
        check_inference_input("regressor", self.n_features, features)?;
        let total: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        let prediction = total / self.trees.len() as f64;
        if !prediction.is_finite() {
            return Err(AppError::ModelInference(
                "regressor produced a non-finite prediction".into(),
            ));
        }
        Ok(prediction)
    }
}
