// ==========================================
// 车队维修返工分析系统 - API层错误类型
// ==========================================
// 职责: 把仓储/引擎/导入错误归并为调用方可处理的几类
// 约定: "无数据"不是错误, 由 Report::NoData 表达
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求参数错误: 日期、阈值、维度名
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 上游取数失败, 不重试
    #[error("数据访问失败: {0}")]
    DataAccess(String),

    /// 调用方违反引擎契约（如均值汇总的维度重叠）
    #[error("引擎契约违反: {0}")]
    EngineContractViolation(String),

    #[error("文件导入失败: {0}")]
    Import(String),

    #[error("结果序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::DataAccess(err.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidMinGapDays(_) | EngineError::UnknownDimension(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            EngineError::OverlappingDimensions(_) => {
                ApiError::EngineContractViolation(err.to_string())
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Storage(inner) => inner.into(),
            other => ApiError::Import(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_data_access() {
        let err: ApiError = RepositoryError::LockError("poisoned".into()).into();
        assert!(matches!(err, ApiError::DataAccess(ref m) if m.contains("poisoned")));

        let err: ApiError = ImportError::Storage(RepositoryError::Busy("locked".into())).into();
        assert!(matches!(err, ApiError::DataAccess(_)));
    }

    #[test]
    fn test_engine_errors() {
        let err: ApiError = EngineError::InvalidMinGapDays(0).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = EngineError::OverlappingDimensions("model".into()).into();
        assert!(matches!(err, ApiError::EngineContractViolation(_)));
    }

    #[test]
    fn test_import_errors_keep_message() {
        let err: ApiError = ImportError::UnknownLayout("COR".into()).into();
        assert!(matches!(err, ApiError::Import(ref m) if m.contains("COR")));
    }
}
