// ==========================================
// 车队维修返工分析系统 - 应用状态
// ==========================================
// 职责: 打开数据库并装配仓储、配置、API 与导入器
// 约定: 连接句柄显式创建后注入, 不使用全局单例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::ReworkApi;
use crate::config::ConfigManager;
use crate::db::open_and_init;
use crate::importer::WorkOrderImporterImpl;
use crate::repository::{PartsRepository, WorkOrderRepository};

/// 数据库路径环境变量
pub const ENV_DB_PATH: &str = "FLEET_REWORK_DB_PATH";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub rework_api: Arc<ReworkApi>,
    pub importer: Arc<WorkOrderImporterImpl>,
    pub config_manager: Arc<ConfigManager>,
    pub work_order_repo: Arc<WorkOrderRepository>,
    pub parts_repo: Arc<PartsRepository>,
}

impl AppState {
    /// 创建 AppState（建表幂等）
    ///
    /// # 返回
    /// - Err(String): 打开数据库或初始化失败
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化 AppState");

        let conn = open_and_init(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let work_order_repo = Arc::new(WorkOrderRepository::from_connection(conn.clone()));
        let parts_repo = Arc::new(PartsRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let rework_api = Arc::new(ReworkApi::new(
            work_order_repo.clone(),
            parts_repo.clone(),
            config_manager.clone(),
        ));
        let importer = Arc::new(WorkOrderImporterImpl::new(
            work_order_repo.clone(),
            parts_repo.clone(),
        ));

        Ok(Self {
            db_path,
            rework_api,
            importer,
            config_manager,
            work_order_repo,
            parts_repo,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 FLEET_REWORK_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fleet_rework.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = if cfg!(debug_assertions) {
            data_dir.join("fleet-rework-dev")
        } else {
            data_dir.join("fleet-rework")
        };

        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("fleet_rework.db");
        }
    }

    path.to_string_lossy().to_string()
}
