pub mod association;
pub mod config;
pub mod domain;
pub mod errors;
pub mod forecast;
pub mod inventory;
pub mod rfm;
pub mod source;
pub mod stats;

pub use association::{AssociationReport, CategoryStats, CoPurchase, CustomerOverlap};
pub use config::{
    AnalyticsConfig, AppConfig, AssociationConfig, ConfigError, ConfigOverrides, DatabaseConfig,
    ForecastConfig, InventoryConfig, LoadOptions, LogFormat, LoggingConfig, RfmConfig,
};
pub use domain::{
    CustomerActivityRow, DailyProductSale, DailySalePoint, InventoryRow, LineItemRow,
};
pub use errors::ComputationError;
pub use forecast::{
    AccuracyReport, ForecastPoint, ForecastResult, ModelConfig, SeasonalPatterns,
    SeasonalTrendModel, TrendDirection,
};
pub use inventory::{
    AbcClass, ClassSummary, InventoryReport, OptimizationRow, StockAction, StockRecommendation,
    StockRow,
};
pub use rfm::{RfmReport, RfmRow, Segment, SegmentStrategy, SegmentSummary};
pub use source::{AnalyticsSource, SourceError};
