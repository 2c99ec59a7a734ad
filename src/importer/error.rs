// ==========================================
// 车队维修返工分析系统 - 导入错误类型
// ==========================================
// 说明: 文件级错误终止该文件的导入; 行级错误计入 rejected 后继续
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件级 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("不支持的文件类型: {0:?}（支持 .csv / .xlsx / .xls）")]
    UnsupportedFormat(String),

    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 解析失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel 解析失败: {0}")]
    Excel(#[from] calamine::Error),

    #[error("工作簿为空: {0}")]
    EmptyWorkbook(String),

    #[error("无法识别的表头: 既不是工单导出也不是备件台账 ({0})")]
    UnknownLayout(String),

    // ===== 行级 =====
    #[error("第 {row} 行缺少必填列 {field}")]
    RequiredFieldMissing { row: usize, field: String },

    #[error("第 {row} 行列 {field} 的值无法解析: {value:?}")]
    InvalidValue {
        row: usize,
        field: String,
        value: String,
    },

    // ===== 写库 / 任务 =====
    #[error("写入数据库失败: {0}")]
    Storage(#[from] RepositoryError),

    #[error("导入任务异常退出: {0}")]
    TaskFailed(String),
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
