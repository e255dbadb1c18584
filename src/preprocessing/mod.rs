//! Data preprocessing module
//!
//! - Label encoding of crop names to dense class indices
//! - Standard scaling of the feature matrix, fit once on the training partition

mod label_encoder;
mod scaler;

pub use label_encoder::LabelEncoder;
pub use scaler::StandardScaler;
