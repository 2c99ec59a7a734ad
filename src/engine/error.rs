// ==========================================
// 车队维修返工分析系统 - 引擎层错误类型
// ==========================================
// 说明: 引擎只对调用契约违反报错, 数据质量问题计数后继续
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("返工阈值必须为正整数天数: {0}")]
    InvalidMinGapDays(i64),

    #[error("未知的分组维度: {0}")]
    UnknownDimension(String),

    #[error("均值汇总的保留维度与跨越维度重复: {0}")]
    OverlappingDimensions(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

impl From<crate::domain::types::UnknownDimension> for EngineError {
    fn from(err: crate::domain::types::UnknownDimension) -> Self {
        EngineError::UnknownDimension(err.0)
    }
}
