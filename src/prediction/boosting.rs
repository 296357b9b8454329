//! Least-squares gradient boosting over a single feature.
//!
//! The ensemble starts from the mean label and adds `learning_rate` times a
//! shallow regression tree fitted to the residuals at each stage:
//!
//! ```text
//! F_0(x) = mean(y)
//! F_m(x) = F_{m-1}(x) + learning_rate * tree_m(x)
//! ```
//!
//! Trees are smartcore [`DecisionTreeRegressor`]s. With one feature and no
//! subsampling the fit is fully deterministic.

use anyhow::Result;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use tracing::debug;

use crate::error::PipelineError;
use crate::prediction::types::ModelParams;
use crate::prediction::utility::mean;

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

pub struct GradientBoostedRegressor {
    init: f64,
    learning_rate: f64,
    stages: Vec<Tree>,
}

fn feature_matrix(x: &[f64]) -> Result<DenseMatrix<f64>> {
    let rows: Vec<Vec<f64>> = x.iter().map(|v| vec![*v]).collect();
    DenseMatrix::from_2d_vec(&rows)
        .map_err(|e| PipelineError::model(format!("matrix creation failed: {e}")).into())
}

impl GradientBoostedRegressor {
    /// Fits `params.n_estimators` stages mapping `x` to `y`.
    pub fn fit(x: &[f64], y: &[f64], params: &ModelParams) -> Result<Self> {
        if x.is_empty() {
            return Err(PipelineError::model("no training samples").into());
        }
        if x.len() != y.len() {
            return Err(PipelineError::model(format!(
                "{} features but {} labels",
                x.len(),
                y.len()
            ))
            .into());
        }

        let matrix = feature_matrix(x)?;
        let tree_params = DecisionTreeRegressorParameters::default()
            .with_max_depth(params.max_depth)
            .with_min_samples_leaf(1)
            .with_min_samples_split(2);

        let init = mean(y);
        let mut fitted = vec![init; y.len()];
        let mut stages = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(t, f)| t - f).collect();
            let tree = Tree::fit(&matrix, &residuals, tree_params.clone())
                .map_err(|e| PipelineError::model(format!("tree fit failed: {e}")))?;
            let step = tree
                .predict(&matrix)
                .map_err(|e| PipelineError::model(format!("tree predict failed: {e}")))?;

            for (f, s) in fitted.iter_mut().zip(step) {
                *f += params.learning_rate * s;
            }
            stages.push(tree);
        }

        debug!(
            samples = x.len(),
            stages = stages.len(),
            init,
            "Gradient boosted ensemble fitted"
        );

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            stages,
        })
    }

    /// Predicts one value per input feature.
    pub fn predict(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = feature_matrix(x)?;
        let mut out = vec![self.init; x.len()];
        for tree in &self.stages {
            let step = tree
                .predict(&matrix)
                .map_err(|e| PipelineError::model(format!("tree predict failed: {e}")))?;
            for (o, s) in out.iter_mut().zip(step) {
                *o += self.learning_rate * s;
            }
        }
        Ok(out)
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }
}
