// ==========================================
// 车队维修返工分析系统 - 应用层
// ==========================================
// 职责: 装配仓储/配置/API, 供命令行与展示层使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, ENV_DB_PATH};
