// ==========================================
// 车队维修返工分析系统 - 配置管理器
// ==========================================
// 职责: 分析参数的加载、查询、覆写
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::MinGapDays;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 返工判定
    pub const DEFAULT_MIN_GAP_DAYS: &str = "rework.default_min_gap_days";

    // 报表
    pub const REPORT_TOP_N: &str = "report.top_n";
    pub const EXCLUDE_UNSETTLED_TAIL: &str = "report.exclude_unsettled_tail";
}

const DEFAULT_TOP_N: usize = 10;

// ==========================================
// AnalysisConfig - 分析参数快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub default_min_gap_days: MinGapDays,
    pub top_n: usize,
    pub exclude_unsettled_tail: bool, // 剔除区间末尾尚未观察满的工单
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_min_gap_days: MinGapDays::default(),
            top_n: DEFAULT_TOP_N,
            exclude_unsettled_tail: true,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager（对连接重新应用统一 PRAGMA, 幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 读取配置值; 不存在返回 None
    pub fn get_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    fn get_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    // ===== 返工判定 =====

    /// 默认最小间隔天数; 非法值告警并回退 10
    pub fn get_default_min_gap_days(&self) -> Result<MinGapDays, Box<dyn Error>> {
        let raw = self.get_or_default(config_keys::DEFAULT_MIN_GAP_DAYS, "10")?;
        let parsed = raw.trim().parse::<i64>().ok().and_then(MinGapDays::new);
        Ok(parsed.unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::DEFAULT_MIN_GAP_DAYS,
                raw_value = %raw,
                "最小间隔天数配置无效，使用默认值"
            );
            AnalysisConfig::default().default_min_gap_days
        }))
    }

    // ===== 报表 =====

    pub fn get_top_n(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_or_default(config_keys::REPORT_TOP_N, "10")?;
        Ok(value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_TOP_N))
    }

    pub fn get_exclude_unsettled_tail(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_or_default(config_keys::EXCLUDE_UNSETTLED_TAIL, "true")?;
        Ok(!matches!(
            value.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ))
    }

    /// 当前生效的分析参数
    pub fn load_analysis_config(&self) -> Result<AnalysisConfig, Box<dyn Error>> {
        Ok(AnalysisConfig {
            default_min_gap_days: self.get_default_min_gap_days()?,
            top_n: self.get_top_n()?,
            exclude_unsettled_tail: self.get_exclude_unsettled_tail()?,
        })
    }

    /// 全部配置的快照（JSON, 键有序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从快照恢复配置; 返回写入条数
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;
        let mut count = 0;
        for (key, value) in &config_map {
            count += tx.execute(
                "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(count)
    }
}
