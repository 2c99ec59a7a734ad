// ==========================================
// 车队维修返工分析系统 - 返工分类引擎
// ==========================================
// 职责: 按 (车辆, 服务描述) 分组, 按开工时间排序,
//       将每张工单判定为 返工(REWORK_TRIGGER) 或 纠正(CORRECTION)
// 输入: 工单列表 + 返工阈值 (min_gap_days)
// 输出: 分类后工单 + 统计
// ==========================================
// 规则:
// - 相邻间隔 <= 阈值: 前一张工单为返工（阈值边界也算返工, 间隔 0 也算返工）
// - 相邻间隔 >  阈值: 前一张工单为纠正, 关闭当前问题周期
// - 组内最后一张工单总是纠正
// - 开工时间缺失的工单不参与分组, 计入 excluded_count
// ==========================================

use crate::domain::statistics::GroupStatistics;
use crate::domain::types::{MinGapDays, ServiceRole};
use crate::domain::work_order::{ClassifiedOrder, WorkOrder};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::rework_statistics::{count_roles, statistics_by_service};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

/// 分组键: (车辆编号, 服务描述)
type GroupId = (String, String);

// ==========================================
// ClassificationResult - 分类结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// 分类后的工单（按 车辆, 服务描述, 开工时间 排序）
    pub classified: Vec<ClassifiedOrder>,
    /// 全部分类工单的汇总统计
    pub summary: GroupStatistics,
    /// 按服务描述的统计（按服务描述升序）
    pub by_service: Vec<GroupStatistics>,
    /// 因开工时间缺失被排除的工单数
    pub excluded_count: usize,
}

impl ClassificationResult {
    pub fn is_empty(&self) -> bool {
        self.classified.is_empty()
    }
}

// ==========================================
// ReworkClassifier - 返工分类引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ReworkClassifier {
    min_gap_days: MinGapDays,
}

impl ReworkClassifier {
    pub fn new(min_gap_days: MinGapDays) -> Self {
        Self { min_gap_days }
    }

    /// 由原始天数构造（非正数视为调用方错误）
    pub fn with_days(days: i64) -> EngineResult<Self> {
        MinGapDays::new(days)
            .map(Self::new)
            .ok_or(EngineError::InvalidMinGapDays(days))
    }

    pub fn min_gap_days(&self) -> MinGapDays {
        self.min_gap_days
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 分类工单
    ///
    /// # 参数
    /// - `orders`: 工单列表（可为空）
    ///
    /// # 返回
    /// ClassificationResult; 空输入返回空结果, 统计 total_orders = 0
    #[instrument(skip(self, orders), fields(count = orders.len(), min_gap_days = self.min_gap_days.days()))]
    pub fn classify(&self, orders: &[WorkOrder]) -> ClassificationResult {
        // 1. 排除开工时间缺失的工单, 按 (车辆, 服务) 分组
        let mut groups: BTreeMap<GroupId, Vec<(NaiveDateTime, &WorkOrder)>> = BTreeMap::new();
        let mut excluded_count = 0;

        for order in orders {
            match order.start_time {
                Some(start) => groups
                    .entry((order.vehicle_id.clone(), order.service_description.clone()))
                    .or_default()
                    .push((start, order)),
                None => excluded_count += 1,
            }
        }

        if excluded_count > 0 {
            tracing::warn!(excluded_count, "开工时间缺失的工单已排除, 不参与返工分类");
        }

        // 2. 逐组分类（BTreeMap 保证组顺序确定）
        let mut classified = Vec::with_capacity(orders.len() - excluded_count);
        for (_, group) in groups {
            self.classify_group(group, &mut classified);
        }

        // 3. 统计
        let summary = GroupStatistics::from_counts(None, count_roles(classified.iter()));
        let by_service = statistics_by_service(&classified);

        tracing::debug!(
            total = summary.total_orders,
            rework = summary.rework_count,
            correction = summary.correction_count,
            "返工分类完成"
        );

        ClassificationResult {
            classified,
            summary,
            by_service,
            excluded_count,
        }
    }

    /// 分类单个分组, 结果追加到 `out`
    ///
    /// 每张工单的角色由它与下一张工单的间隔决定; 组内最后一张没有后继, 必为纠正。
    fn classify_group(
        &self,
        mut group: Vec<(NaiveDateTime, &WorkOrder)>,
        out: &mut Vec<ClassifiedOrder>,
    ) {
        // 稳定排序: 开工时间相同时保持输入顺序
        group.sort_by_key(|(start, _)| *start);

        let threshold = self.min_gap_days.days();
        let mut episode_start: Option<NaiveDateTime> = None;
        let mut episode_no: u32 = 1;
        let mut rework_count: u32 = 0;
        let mut prev_start: Option<NaiveDateTime> = None;

        let mut iter = group.into_iter().peekable();
        while let Some((start, order)) = iter.next() {
            let started_at = *episode_start.get_or_insert(start);
            let gap_days = prev_start.map_or(0, |prev| whole_days_between(prev, start));
            let next_gap = iter
                .peek()
                .map(|(next_start, _)| whole_days_between(start, *next_start));

            match next_gap {
                Some(gap) if gap <= threshold => {
                    out.push(ClassifiedOrder {
                        order: order.clone(),
                        gap_days,
                        role: ServiceRole::ReworkTrigger,
                        days_to_correct: None,
                        orders_to_correct: None,
                        episode_no,
                    });
                    rework_count += 1;
                }
                _ => {
                    out.push(ClassifiedOrder {
                        order: order.clone(),
                        gap_days,
                        role: ServiceRole::Correction,
                        days_to_correct: Some(whole_days_between(started_at, start)),
                        orders_to_correct: Some(rework_count),
                        episode_no,
                    });
                    episode_start = None;
                    episode_no += 1;
                    rework_count = 0;
                }
            }

            prev_start = Some(start);
        }
    }
}

/// 便捷函数: 以给定阈值分类
pub fn classify(orders: &[WorkOrder], min_gap_days: MinGapDays) -> ClassificationResult {
    ReworkClassifier::new(min_gap_days).classify(orders)
}

/// 两个时间点之间的整天数（向下取整, 负值截断为 0）
fn whole_days_between(earlier: NaiveDateTime, later: NaiveDateTime) -> i64 {
    let seconds = (later - earlier).num_seconds();
    if seconds < 0 {
        tracing::warn!(%earlier, %later, "工单间隔为负, 已截断为 0");
        return 0;
    }
    seconds / 86_400
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + chrono::Duration::days(day)
    }

    fn order(id: &str, vehicle: &str, service: &str, day: Option<i64>) -> WorkOrder {
        WorkOrder {
            order_id: id.to_string(),
            vehicle_id: vehicle.to_string(),
            service_description: service.to_string(),
            model_description: None,
            workshop: None,
            section: None,
            mechanic_id: None,
            start_time: day.map(ts),
            close_time: day.map(|d| ts(d) + chrono::Duration::hours(4)),
            parts_used: None,
        }
    }

    fn classify_days(days: &[i64], min_gap: i64) -> Vec<ClassifiedOrder> {
        let orders: Vec<WorkOrder> = days
            .iter()
            .enumerate()
            .map(|(i, d)| order(&format!("OS-{}", i), "V1", "FREIO", Some(*d)))
            .collect();
        ReworkClassifier::with_days(min_gap)
            .unwrap()
            .classify(&orders)
            .classified
    }

    #[test]
    fn test_whole_days_floors_partial_days() {
        assert_eq!(whole_days_between(ts(0), ts(0) + chrono::Duration::hours(47)), 1);
        assert_eq!(whole_days_between(ts(3), ts(1)), 0);
    }

    #[test]
    fn test_with_days_rejects_non_positive() {
        assert_eq!(
            ReworkClassifier::with_days(0).unwrap_err(),
            EngineError::InvalidMinGapDays(0)
        );
        assert!(ReworkClassifier::with_days(-3).is_err());
    }

    #[test]
    fn test_gap_days_and_episode_numbers() {
        let out = classify_days(&[0, 5, 40, 45, 100], 10);
        let gaps: Vec<i64> = out.iter().map(|c| c.gap_days).collect();
        assert_eq!(gaps, vec![0, 5, 35, 5, 55]);
        let episodes: Vec<u32> = out.iter().map(|c| c.episode_no).collect();
        assert_eq!(episodes, vec![1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_same_day_duplicates_are_rework() {
        let out = classify_days(&[0, 0], 10);
        assert_eq!(out[0].role, ServiceRole::ReworkTrigger);
        assert_eq!(out[1].role, ServiceRole::Correction);
        assert_eq!(out[1].days_to_correct, Some(0));
        assert_eq!(out[1].orders_to_correct, Some(1));
    }

    #[test]
    fn test_stable_order_for_equal_timestamps() {
        let orders = vec![
            order("B", "V1", "FREIO", Some(0)),
            order("A", "V1", "FREIO", Some(0)),
        ];
        let out = classify(&orders, MinGapDays::new(10).unwrap()).classified;
        assert_eq!(out[0].order.order_id, "B");
        assert_eq!(out[1].order.order_id, "A");
    }

    #[test]
    fn test_missing_start_time_excluded() {
        let orders = vec![
            order("OS-1", "V1", "FREIO", Some(0)),
            order("OS-2", "V1", "FREIO", None),
            order("OS-3", "V1", "FREIO", Some(3)),
        ];
        let result = classify(&orders, MinGapDays::new(10).unwrap());
        assert_eq!(result.excluded_count, 1);
        assert_eq!(result.classified.len(), 2);
        assert_eq!(result.summary.total_orders, 2);
    }
}
