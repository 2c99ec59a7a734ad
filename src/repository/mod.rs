// ==========================================
// 车队维修返工分析系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod filter;
pub mod parts_repo;
pub mod query_builder;
pub mod work_order_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use filter::{is_all_sentinel, DateRange, PartsFilter, Selection, WorkOrderFilter, ALL};
pub use parts_repo::PartsRepository;
pub use query_builder::{build_in_clause, SqlFilterBuilder};
pub use work_order_repo::WorkOrderRepository;
