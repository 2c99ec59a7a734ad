// ==========================================
// 车队维修返工分析系统 - 工单/备件导入器
// ==========================================
// 流程: 解析 → 识别表头 → 映射 → 落库（事务化）
// 说明: 文件解析与写库为阻塞操作, 放到 spawn_blocking 中执行
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{map_part_usage, map_work_order, RecordLayout};
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::repository::{PartsRepository, WorkOrderRepository};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 单个文件的导入结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub file: String,
    pub layout: &'static str, // WORK_ORDERS / PARTS_LEDGER
    pub total_rows: usize,
    pub imported: usize,
    pub rejected: usize,
    pub elapsed_ms: u64,
}

// ==========================================
// WorkOrderImporter Trait
// ==========================================
#[async_trait]
pub trait WorkOrderImporter: Send + Sync {
    /// 导入单个文件（CSV / Excel, 工单或备件台账）
    async fn import_file(&self, file_path: PathBuf) -> ImportResult<ImportSummary>;

    /// 批量导入多个文件（并发执行, 单个文件失败不影响其他文件）
    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<Result<ImportSummary, String>>;
}

// ==========================================
// WorkOrderImporterImpl
// ==========================================
pub struct WorkOrderImporterImpl {
    work_order_repo: Arc<WorkOrderRepository>,
    parts_repo: Arc<PartsRepository>,
    file_parser: Arc<dyn FileParser>,
}

impl WorkOrderImporterImpl {
    pub fn new(work_order_repo: Arc<WorkOrderRepository>, parts_repo: Arc<PartsRepository>) -> Self {
        Self::with_parser(work_order_repo, parts_repo, Arc::new(UniversalFileParser))
    }

    pub fn with_parser(
        work_order_repo: Arc<WorkOrderRepository>,
        parts_repo: Arc<PartsRepository>,
        file_parser: Arc<dyn FileParser>,
    ) -> Self {
        Self {
            work_order_repo,
            parts_repo,
            file_parser,
        }
    }
}

/// 阻塞部分: 解析 + 映射 + 写库
fn import_blocking(
    path: &Path,
    parser: &dyn FileParser,
    work_order_repo: &WorkOrderRepository,
    parts_repo: &PartsRepository,
) -> ImportResult<(RecordLayout, usize, usize, usize)> {
    let rows = parser.parse_to_raw_records(path)?;
    let total_rows = rows.len();
    let Some(first) = rows.first() else {
        return Ok((RecordLayout::WorkOrders, 0, 0, 0));
    };

    let layout = RecordLayout::detect(first).ok_or_else(|| {
        let mut headers: Vec<&str> = first.keys().map(String::as_str).collect();
        headers.sort_unstable();
        ImportError::UnknownLayout(headers.join(", "))
    })?;

    // 行号从 2 开始（第 1 行为表头）
    let mut rejected = 0usize;
    let imported = match layout {
        RecordLayout::WorkOrders => {
            let mut orders = Vec::with_capacity(total_rows);
            for (idx, row) in rows.iter().enumerate() {
                match map_work_order(row, idx + 2) {
                    Ok(order) => orders.push(order),
                    Err(e) => {
                        warn!(row_number = idx + 2, error = %e, "工单行映射失败");
                        rejected += 1;
                    }
                }
            }
            work_order_repo.upsert_batch(&orders)?
        }
        RecordLayout::PartsLedger => {
            let mut parts = Vec::with_capacity(total_rows);
            for (idx, row) in rows.iter().enumerate() {
                match map_part_usage(row, idx + 2) {
                    Ok(part) => parts.push(part),
                    Err(e) => {
                        warn!(row_number = idx + 2, error = %e, "备件行映射失败");
                        rejected += 1;
                    }
                }
            }
            parts_repo.upsert_batch(&parts)?
        }
    };

    Ok((layout, total_rows, imported, rejected))
}

#[async_trait]
impl WorkOrderImporter for WorkOrderImporterImpl {
    #[instrument(skip(self))]
    async fn import_file(&self, file_path: PathBuf) -> ImportResult<ImportSummary> {
        let start = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let file = file_path.display().to_string();
        info!(batch_id = %batch_id, "开始导入");

        let parser = Arc::clone(&self.file_parser);
        let work_order_repo = Arc::clone(&self.work_order_repo);
        let parts_repo = Arc::clone(&self.parts_repo);

        let (layout, total_rows, imported, rejected) = tokio::task::spawn_blocking(move || {
            import_blocking(&file_path, parser.as_ref(), &work_order_repo, &parts_repo)
        })
        .await
        .map_err(|e| ImportError::TaskFailed(e.to_string()))??;

        let summary = ImportSummary {
            batch_id,
            file,
            layout: match layout {
                RecordLayout::WorkOrders => "WORK_ORDERS",
                RecordLayout::PartsLedger => "PARTS_LEDGER",
            },
            total_rows,
            imported,
            rejected,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            batch_id = %summary.batch_id,
            layout = summary.layout,
            total_rows,
            imported,
            rejected,
            elapsed_ms = summary.elapsed_ms,
            "导入完成"
        );
        Ok(summary)
    }

    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<Result<ImportSummary, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        let tasks = file_paths.into_iter().map(|path| async move {
            let path_str = path.display().to_string();
            self.import_file(path).await.map_err(|e| {
                error!(file = %path_str, error = %e, "文件导入失败");
                format!("文件 {} 导入失败: {}", path_str, e)
            })
        });

        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );
        results
    }
}
