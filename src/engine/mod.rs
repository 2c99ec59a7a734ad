// ==========================================
// 车队维修返工分析系统 - 引擎层
// ==========================================
// 职责: 返工分类与统计聚合
// 红线: Engine 不拼 SQL, 输入为已取出的内存表, 纯函数可重入
// ==========================================

pub mod error;
pub mod indicators;
pub mod rework_classifier;
pub mod rework_statistics;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use indicators::{
    correction_indicators, cumulative_days_to_correct, mechanic_summary, parts_by_month,
    rank_groups_by_rework, slowest_corrections, top_vehicles_by_days_to_correct,
    CorrectionIndicators, CumulativePoint, MechanicSummary, MonthlyParts, RankedGroup,
    VehicleCorrectionDays,
};
pub use rework_classifier::{classify, ClassificationResult, ReworkClassifier};
pub use rework_statistics::{
    aggregate, aggregate_by_names, count_roles, general_rollup, mean_rollup, model_rollup,
    monthly_general_rollup, parse_dimensions, statistics_by_service,
};
