// ==========================================
// 车队维修返工分析系统 - 配置层
// ==========================================
// 职责: 分析参数管理（默认阈值、Top-N、末尾观察窗口）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, AnalysisConfig, ConfigManager};
