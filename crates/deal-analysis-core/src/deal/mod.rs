pub mod analysis;
pub mod recommendation;

pub use analysis::{analyze_deal, DealAnalysisInput, DealAnalysisOutput};
pub use recommendation::{Recommendation, RecommendationScreens};
