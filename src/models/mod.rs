pub mod bundle;
pub mod emotion;
pub mod results;
pub mod sensory;
pub mod session;

pub use bundle::{DataBundle, RawDataBundle, RawEmotionRecord, RawSensoryRecord, RawSessionRecord};
pub use emotion::{EmotionRecord, POSITIVE_EMOTIONS};
pub use results::{
    AnalysisResult, AnomalyDetection, CorrelationMatrix, CorrelationPair, Pattern,
    PatternCategory, Prediction, PredictiveInsight, Severity, Significance, TrendDirection,
};
pub use sensory::{ResponseClass, SensoryRecord};
pub use session::{EnvironmentalSnapshot, SessionRecord};
