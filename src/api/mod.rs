// ==========================================
// 车队维修返工分析系统 - API 层
// ==========================================
// 职责: 对展示层提供返工分析接口（参数校验 + 结果信封）
// ==========================================

pub mod dto;
pub mod error;
pub mod rework_api;
pub mod validator;

// 重导出核心类型
pub use dto::{group_table_records, to_record, to_records, Record, Report, ReworkAnalysis, ReworkAnalysisRequest};
pub use error::{ApiError, ApiResult};
pub use rework_api::{settled_through, ReworkApi};
