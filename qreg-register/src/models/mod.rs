//! Data models for the registration workflow

pub mod capture;
pub mod product;
pub mod similarity;

pub use capture::CapturedImage;
pub use product::{
    AnalysisResult, CandidateProduct, NewProductRequest, RegisteredProduct, StockRecord,
};
pub use similarity::MatchTier;
