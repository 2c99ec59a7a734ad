// ==========================================
// 车队维修返工分析系统 - 领域模型层
// ==========================================
// 职责: 定义工单、备件、统计结果等领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod parts;
pub mod statistics;
pub mod types;
pub mod work_order;

// 重导出核心类型
pub use parts::PartUsage;
pub use statistics::{
    percentage, AggregateRow, GroupKey, GroupStatistics, RoleCounts, RollupRow,
};
pub use types::{CorrectionKind, Dimension, MinGapDays, ServiceRole, MIN_GAP_PRESETS};
pub use work_order::{parse_timestamp, ClassifiedOrder, WorkOrder, UNSPECIFIED};
