// ==========================================
// 车队维修返工分析系统 - 工单仓储
// ==========================================
// 红线: Repository 不含业务逻辑, 只负责数据访问
// 约束: 所有过滤值走参数化占位符
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::work_order::{parse_timestamp, WorkOrder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::filter::WorkOrderFilter;
use crate::repository::query_builder::SqlFilterBuilder;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

const TIMESTAMP_DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// WorkOrderRepository - 工单仓储
// ==========================================
/// 工单仓储
/// 职责: work_order 表读写, 备件用量按工单号汇总
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    /// 创建新的 WorkOrderRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按条件查询工单
    ///
    /// # 参数
    /// - `filter`: 结单日期区间 + 车间/工段/服务/车辆选择（"与"关系）
    ///
    /// # 返回
    /// - 按 (车辆, 服务, 开工时间) 排序的工单; parts_used 为备件台账数量合计
    #[instrument(skip(self), level = "debug")]
    pub fn fetch_work_orders(&self, filter: &WorkOrderFilter) -> RepositoryResult<Vec<WorkOrder>> {
        let range = filter.date_range;
        let builder = SqlFilterBuilder::new()
            .condition(
                "datetime(w.close_time) >= datetime(?)",
                range.from.format("%Y-%m-%d").to_string(),
            )
            .condition(
                "datetime(w.close_time) < datetime(?)",
                range.end_exclusive().format("%Y-%m-%d").to_string(),
            )
            .selection("w.workshop", &filter.workshops)
            .selection("w.section", &filter.sections)
            .selection("w.service_description", &filter.services)
            .selection("w.vehicle_id", &filter.vehicles);

        let sql = format!(
            r#"
            SELECT
                w.order_id, w.vehicle_id, w.service_description, w.model_description,
                w.workshop, w.section, w.mechanic_id, w.start_time, w.close_time,
                p.total_quantity
            FROM work_order w
            LEFT JOIN (
                SELECT order_id, SUM(quantity) AS total_quantity
                FROM part_usage
                GROUP BY order_id
            ) p ON p.order_id = w.order_id
            {}
            ORDER BY w.vehicle_id, w.service_description, w.start_time, w.order_id
            "#,
            builder.where_clause()
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(builder.params()), map_work_order)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = orders.len(), "工单查询完成");
        Ok(orders)
    }

    /// 批量写入工单（按工单号覆盖）
    ///
    /// # 返回
    /// - 写入行数
    pub fn upsert_batch(&self, orders: &[WorkOrder]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::Transaction(e.to_string()))?;

        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO work_order (
                    order_id, vehicle_id, service_description, model_description,
                    workshop, section, mechanic_id, start_time, close_time
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(order_id) DO UPDATE SET
                    vehicle_id = excluded.vehicle_id,
                    service_description = excluded.service_description,
                    model_description = excluded.model_description,
                    workshop = excluded.workshop,
                    section = excluded.section,
                    mechanic_id = excluded.mechanic_id,
                    start_time = excluded.start_time,
                    close_time = excluded.close_time
                "#,
            )?;

            for order in orders {
                written += stmt.execute(params![
                    order.order_id,
                    order.vehicle_id,
                    order.service_description,
                    order.model_description,
                    order.workshop,
                    order.section,
                    order.mechanic_id,
                    order
                        .start_time
                        .map(|t| t.format(TIMESTAMP_DB_FORMAT).to_string()),
                    order
                        .close_time
                        .map(|t| t.format(TIMESTAMP_DB_FORMAT).to_string()),
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::Transaction(e.to_string()))?;
        Ok(written)
    }

    /// 服务描述目录（去重, 升序）
    pub fn service_catalog(&self) -> RepositoryResult<Vec<String>> {
        self.distinct_values(
            "SELECT DISTINCT service_description FROM work_order \
             WHERE TRIM(service_description) <> '' ORDER BY service_description",
        )
    }

    /// 车辆列表（去重, 升序）
    pub fn list_vehicles(&self) -> RepositoryResult<Vec<String>> {
        self.distinct_values(
            "SELECT DISTINCT vehicle_id FROM work_order \
             WHERE TRIM(vehicle_id) <> '' ORDER BY vehicle_id",
        )
    }

    /// 工单总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM work_order", [], |row| row.get(0))?;
        Ok(n)
    }

    fn distinct_values(&self, sql: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }
}

/// 行 → WorkOrder; 时间戳无法解析时置 None, 由引擎排除并计数
fn map_work_order(row: &Row<'_>) -> rusqlite::Result<WorkOrder> {
    let start_time: Option<String> = row.get(7)?;
    let close_time: Option<String> = row.get(8)?;

    Ok(WorkOrder {
        order_id: row.get(0)?,
        vehicle_id: row.get(1)?,
        service_description: row.get(2)?,
        model_description: row.get(3)?,
        workshop: row.get(4)?,
        section: row.get(5)?,
        mechanic_id: row.get(6)?,
        start_time: start_time.as_deref().and_then(parse_timestamp),
        close_time: close_time.as_deref().and_then(parse_timestamp),
        parts_used: row.get(9)?,
    })
}
