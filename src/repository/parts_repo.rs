// ==========================================
// 车队维修返工分析系统 - 备件台账仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::parts::PartUsage;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::filter::PartsFilter;
use crate::repository::query_builder::SqlFilterBuilder;
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 备件台账仓储
pub struct PartsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PartsRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按日期区间 + 设备选择查询备件更换记录
    pub fn fetch_parts(&self, filter: &PartsFilter) -> RepositoryResult<Vec<PartUsage>> {
        let range = filter.date_range;
        let builder = SqlFilterBuilder::new()
            .condition(
                "date(p.usage_date) >= date(?)",
                range.from.format("%Y-%m-%d").to_string(),
            )
            .condition(
                "date(p.usage_date) <= date(?)",
                range.to.format("%Y-%m-%d").to_string(),
            )
            .selection("p.equipment", &filter.equipment);

        let sql = format!(
            "SELECT p.order_id, p.equipment, p.part, p.quantity, p.value, p.usage_date \
             FROM part_usage p {} ORDER BY p.usage_date, p.usage_id",
            builder.where_clause()
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(builder.params()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut parts = Vec::with_capacity(rows.len());
        for (order_id, equipment, part, quantity, value, raw_date) in rows {
            match parse_usage_date(&raw_date) {
                Some(date) => parts.push(PartUsage {
                    order_id,
                    equipment,
                    part,
                    quantity,
                    value,
                    date,
                }),
                None => warn!(order_id = %order_id, raw_date = %raw_date, "备件日期无法解析, 已跳过"),
            }
        }
        Ok(parts)
    }

    /// 批量写入备件记录
    ///
    /// 以 (工单, 设备, 备件, 日期) 为键; 已存在时覆盖数量与金额, 重复导入同一台账不会累加
    pub fn upsert_batch(&self, parts: &[PartUsage]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::Transaction(e.to_string()))?;

        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO part_usage (order_id, equipment, part, quantity, value, usage_date) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(order_id, equipment, part, usage_date) \
                 DO UPDATE SET quantity = excluded.quantity, value = excluded.value",
            )?;
            for p in parts {
                written += stmt.execute(params![
                    p.order_id,
                    p.equipment,
                    p.part,
                    p.quantity,
                    p.value,
                    p.date.format("%Y-%m-%d").to_string(),
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::Transaction(e.to_string()))?;
        Ok(written)
    }
}

fn parse_usage_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| crate::domain::parse_timestamp(raw).map(|t| t.date()))
}
