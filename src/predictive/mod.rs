//! Trend projection and outlier flagging over the per-session metric series.

pub mod anomalies;
pub mod trends;

pub use anomalies::detect_anomalies;
pub use trends::predict_trends;
