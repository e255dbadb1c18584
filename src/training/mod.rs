//! Model training module
//!
//! - Second-order regression trees grown on pre-sorted columns
//! - Softmax / logistic gradient-boosted classifier
//! - Stratified cross-validation
//! - Accuracy

pub mod cross_validation;
pub mod gradient_boosting;
pub mod metrics;
pub mod tree;

pub use cross_validation::{CVResults, CVSplit, CrossValidator};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use metrics::accuracy;
pub use tree::{RegressionTree, SortedColumns, TreeNode, TreeParams};
