// ==========================================
// 车队维修返工分析系统 - 返工分析 API
// ==========================================
// 职责: 校验请求 → 取数 → 分类 → 聚合/汇总/指标 → 结果信封
// 架构: API 层 → Repository（取数） + Engine（纯计算）
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::dto::{group_table_records, Record, Report, ReworkAnalysis, ReworkAnalysisRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_date_range, validate_dimensions, validate_min_gap_days};
use crate::config::{AnalysisConfig, ConfigManager};
use crate::domain::statistics::{AggregateRow, GroupKey, GroupStatistics};
use crate::domain::types::{Dimension, MinGapDays};
use crate::domain::work_order::{ClassifiedOrder, WorkOrder};
use crate::engine::indicators::{
    correction_indicators, cumulative_days_to_correct, mechanic_summary, parts_by_month,
    rank_groups_by_rework, slowest_corrections, top_vehicles_by_days_to_correct,
};
use crate::engine::rework_classifier::{ClassificationResult, ReworkClassifier};
use crate::engine::rework_statistics::{
    aggregate, count_roles, general_rollup, model_rollup, monthly_general_rollup,
    statistics_by_service,
};
use crate::perf::PerfGuard;
use crate::repository::filter::{DateRange, PartsFilter, Selection, WorkOrderFilter};
use crate::repository::{PartsRepository, WorkOrderRepository};

/// "Geral" 汇总跨越的维度: 每辆车一个百分比
const GENERAL_ACROSS: [Dimension; 1] = [Dimension::Vehicle];

/// 末尾观察窗口的截止日期: date_to - (阈值 + 1) 天
///
/// 阈值过大时截止到 `NaiveDate::MIN`, 即没有可统计的工单
pub fn settled_through(date_to: NaiveDate, min_gap_days: MinGapDays) -> NaiveDate {
    min_gap_days
        .days()
        .checked_add(1)
        .and_then(Duration::try_days)
        .and_then(|window| date_to.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN)
}

/// 是否已观察满一个阈值周期; 结单时间缺失的工单无法判断, 保留
fn is_settled(row: &ClassifiedOrder, settled_window: Option<&DateRange>) -> bool {
    match row.order.close_time {
        None => true,
        Some(closed) => settled_window.map_or(false, |w| w.contains(closed.date())),
    }
}

// ==========================================
// ReworkApi - 返工分析 API
// ==========================================
pub struct ReworkApi {
    work_order_repo: Arc<WorkOrderRepository>,
    parts_repo: Arc<PartsRepository>,
    config_manager: Arc<ConfigManager>,
}

impl ReworkApi {
    pub fn new(
        work_order_repo: Arc<WorkOrderRepository>,
        parts_repo: Arc<PartsRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            work_order_repo,
            parts_repo,
            config_manager,
        }
    }

    /// 当前生效的分析参数
    pub fn analysis_config(&self) -> ApiResult<AnalysisConfig> {
        self.config_manager
            .load_analysis_config()
            .map_err(|e| ApiError::DataAccess(format!("读取分析配置失败: {}", e)))
    }

    // ==========================================
    // 完整分析
    // ==========================================

    /// 返工分析（驾驶舱主查询）
    ///
    /// # 返回
    /// - Ok(Report::NoData): 区间内无可统计工单
    /// - Ok(Report::Ready): 分类明细 + 统计 + 指标
    /// - Err(ApiError::InvalidInput): 日期/阈值/维度非法
    /// - Err(ApiError::DataAccess): 取数失败
    #[instrument(skip(self, request), fields(run_id))]
    pub fn analyze(&self, request: &ReworkAnalysisRequest) -> ApiResult<Report<ReworkAnalysis>> {
        let _perf = PerfGuard::new("rework_api.analyze");
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        // 1. 参数校验
        let date_range = validate_date_range(&request.date_from, &request.date_to)?;
        let min_gap_days = validate_min_gap_days(request.min_gap_days)?;
        let group_by = validate_dimensions(&request.group_by)?;
        let config = self.analysis_config()?;
        let top_n = request.top_n.filter(|n| *n > 0).unwrap_or(config.top_n);

        info!(
            date_from = %date_range.from,
            date_to = %date_range.to,
            min_gap_days = min_gap_days.days(),
            "开始返工分析"
        );

        // 2. 取数
        let filter = WorkOrderFilter {
            date_range,
            workshops: Selection::from_values(&request.workshops),
            sections: Selection::from_values(&request.sections),
            services: Selection::from_values(&request.services),
            vehicles: Selection::from_values(&request.vehicles),
        };
        let orders = self.work_order_repo.fetch_work_orders(&filter)?;
        let fetched_count = orders.len();
        if orders.is_empty() {
            info!("区间内无工单");
            return Ok(Report::NoData);
        }

        // 3. 分类（全部取出的工单参与, 保证末尾工单的前驱关系完整）
        let classification = ReworkClassifier::new(min_gap_days).classify(&orders);
        let excluded_count = classification.excluded_count;

        // 4. 末尾观察窗口
        let cutoff = if config.exclude_unsettled_tail {
            settled_through(date_range.to, min_gap_days)
        } else {
            date_range.to
        };
        let settled_window = DateRange::new(date_range.from, cutoff);
        let (settled, unsettled): (Vec<ClassifiedOrder>, Vec<ClassifiedOrder>) = classification
            .classified
            .into_iter()
            .partition(|row| is_settled(row, settled_window.as_ref()));
        let unsettled_count = unsettled.len();

        if settled_window.is_none() {
            warn!(%cutoff, "日期区间短于观察窗口, 没有可统计的工单");
        }
        if settled.is_empty() {
            info!(excluded_count, unsettled_count, "无可统计工单");
            return Ok(Report::NoData);
        }

        // 5. 统计与指标
        let parts = self.parts_repo.fetch_parts(&PartsFilter {
            date_range,
            equipment: filter.vehicles.clone(),
        })?;

        let summary = GroupStatistics::from_counts(None, count_roles(settled.iter()));
        let by_service = statistics_by_service(&settled);
        let general = general_rollup(&settled, &GENERAL_ACROSS)?;
        let general_by_month =
            group_table_records(&[Dimension::Month], &monthly_general_rollup(&settled))?;
        let by_model = group_table_records(&[Dimension::Model], &model_rollup(&settled))?;
        let table = aggregate(&settled, &group_by);
        let groups = group_table_records(&group_by, &table)?;
        let top_groups = rank_groups_by_rework(&table, top_n);

        let analysis = ReworkAnalysis {
            run_id,
            min_gap_days,
            date_range,
            settled_through: cutoff,
            fetched_count,
            excluded_count,
            unsettled_count,
            indicators: correction_indicators(&settled),
            cumulative_days_to_correct: cumulative_days_to_correct(&settled),
            top_vehicles: top_vehicles_by_days_to_correct(&settled, top_n),
            slowest_corrections: slowest_corrections(&settled, top_n),
            mechanics: mechanic_summary(&settled),
            parts_by_month: parts_by_month(&parts),
            summary,
            by_service,
            general,
            general_by_month,
            by_model,
            groups,
            top_groups,
            orders: settled,
        };

        info!(
            run_id = %analysis.run_id,
            total = analysis.summary.total_orders,
            rework = analysis.summary.rework_count,
            excluded_count,
            unsettled_count,
            "返工分析完成"
        );
        Ok(Report::Ready(analysis))
    }

    // ==========================================
    // 调用方已取数的入口
    // ==========================================

    /// 对已取出的工单做分类
    pub fn classify_orders(
        &self,
        orders: &[WorkOrder],
        min_gap_days: Option<i64>,
    ) -> ApiResult<Report<ClassificationResult>> {
        let min_gap_days = validate_min_gap_days(min_gap_days)?;
        let result = ReworkClassifier::new(min_gap_days).classify(orders);
        if result.is_empty() {
            Ok(Report::NoData)
        } else {
            Ok(Report::Ready(result))
        }
    }

    /// 按属性名对分类结果做分组聚合, 返回扁平记录
    pub fn group_table(
        &self,
        classified: &[ClassifiedOrder],
        group_by: &[String],
    ) -> ApiResult<Report<Vec<Record>>> {
        let dims = validate_dimensions(group_by)?;
        let table: BTreeMap<GroupKey, AggregateRow> = aggregate(classified, &dims);
        if table.is_empty() {
            return Ok(Report::NoData);
        }
        Ok(Report::Ready(group_table_records(&dims, &table)?))
    }

    // ==========================================
    // 下拉选项
    // ==========================================

    /// 服务描述目录
    pub fn list_services(&self) -> ApiResult<Vec<String>> {
        Ok(self.work_order_repo.service_catalog()?)
    }

    /// 车辆列表
    pub fn list_vehicles(&self) -> ApiResult<Vec<String>> {
        Ok(self.work_order_repo.list_vehicles()?)
    }

    /// 修正界面多选（"全部" 与具体项互斥）
    pub fn repair_selection(&self, list: &[String]) -> Vec<String> {
        Selection::repair_ui_list(list)
    }

    /// 日期区间（供界面预校验）
    pub fn parse_date_range(&self, date_from: &str, date_to: &str) -> ApiResult<DateRange> {
        validate_date_range(date_from, date_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_through() {
        let to = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let days = MinGapDays::new(10).unwrap();
        assert_eq!(
            settled_through(to, days),
            NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
        );
    }

    #[test]
    fn test_settled_through_saturates() {
        let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        for days in [1_000_000_000, i64::MAX] {
            let cutoff = settled_through(to, MinGapDays::new(days).unwrap());
            assert_eq!(cutoff, NaiveDate::MIN);
        }
    }
}
