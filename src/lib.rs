// ==========================================
// 车队维修返工分析系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 维修工单返工/纠正分类与统计分析（只读分析, 不回写工单）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 返工分类与统计
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 分析参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计（SQL 计数/慢查询）
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CorrectionKind, Dimension, MinGapDays, ServiceRole, MIN_GAP_PRESETS};

// 领域实体
pub use domain::{ClassifiedOrder, GroupKey, GroupStatistics, PartUsage, WorkOrder};

// 引擎
pub use engine::{classify, ClassificationResult, ReworkClassifier};

// API
pub use api::{ApiError, Report, ReworkApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队维修返工分析系统";
