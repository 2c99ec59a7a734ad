// ==========================================
// 车队维修返工分析系统 - 统计结果模型
// ==========================================
// 红线: total = 0 时百分比为 None ("无数据"), 不得出现 NaN
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 百分比: 100 × part / total, total 为 0 时返回 None
pub fn percentage(part: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(100.0 * part as f64 / total as f64)
    }
}

// ==========================================
// GroupKey - 复合分组键
// ==========================================
// 值的顺序与 group_by 维度顺序一致
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    /// 空键（整体汇总）
    pub fn overall() -> Self {
        Self(Vec::new())
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    /// 取前 n 个分量组成的新键
    pub fn prefix(&self, n: usize) -> Self {
        Self(self.0.iter().take(n).cloned().collect())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

impl From<Vec<String>> for GroupKey {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

// ==========================================
// RoleCounts - 角色计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub total: usize,
    pub rework: usize,
    pub correction: usize,
    pub first_time_correction: usize,
    pub problems: usize,
}

impl RoleCounts {
    pub fn perc_rework(&self) -> Option<f64> {
        percentage(self.rework, self.total)
    }

    pub fn perc_correction(&self) -> Option<f64> {
        percentage(self.correction, self.total)
    }

    pub fn perc_first_time(&self) -> Option<f64> {
        percentage(self.first_time_correction, self.total)
    }

    pub fn late_correction(&self) -> usize {
        self.correction - self.first_time_correction
    }
}

// ==========================================
// GroupStatistics - 分类引擎统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub service_description: Option<String>, // None 表示全部服务
    pub total_orders: usize,
    pub rework_count: usize,
    pub correction_count: usize,
    pub first_time_correction_count: usize,
    pub late_correction_count: usize,
    pub problem_count: usize,
    pub perc_rework: Option<f64>,
    pub perc_correction: Option<f64>,
    pub perc_first_time: Option<f64>,
    pub orders_per_problem: Option<f64>,
}

impl GroupStatistics {
    pub fn from_counts(service_description: Option<String>, counts: RoleCounts) -> Self {
        let orders_per_problem = if counts.problems == 0 {
            None
        } else {
            Some(counts.total as f64 / counts.problems as f64)
        };

        Self {
            service_description,
            total_orders: counts.total,
            rework_count: counts.rework,
            correction_count: counts.correction,
            first_time_correction_count: counts.first_time_correction,
            late_correction_count: counts.late_correction(),
            problem_count: counts.problems,
            perc_rework: counts.perc_rework(),
            perc_correction: counts.perc_correction(),
            perc_first_time: counts.perc_first_time(),
            orders_per_problem,
        }
    }

    /// 空统计（total_orders = 0, 百分比均为无数据）
    pub fn empty() -> Self {
        Self::from_counts(None, RoleCounts::default())
    }

    pub fn is_empty(&self) -> bool {
        self.total_orders == 0
    }
}

// ==========================================
// AggregateRow - 聚合行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub total: usize,
    pub rework: usize,
    pub correction: usize,
    pub first_time_correction: usize,
    pub problems: usize,
    pub perc_rework: Option<f64>,
    pub perc_correction: Option<f64>,
    pub perc_first_time: Option<f64>,
}

impl From<RoleCounts> for AggregateRow {
    fn from(counts: RoleCounts) -> Self {
        Self {
            total: counts.total,
            rework: counts.rework,
            correction: counts.correction,
            first_time_correction: counts.first_time_correction,
            problems: counts.problems,
            perc_rework: counts.perc_rework(),
            perc_correction: counts.perc_correction(),
            perc_first_time: counts.perc_first_time(),
        }
    }
}

// ==========================================
// RollupRow - 均值汇总行 ("Geral" / 按车型)
// ==========================================
// 说明: 各分组百分比的算术平均, 不是合并后重算的百分比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRow {
    pub group_count: usize,
    pub mean_total: Option<f64>,
    pub mean_perc_rework: Option<f64>,
    pub mean_perc_correction: Option<f64>,
    pub mean_perc_first_time: Option<f64>,
    pub std_perc_rework: Option<f64>, // 样本标准差, 少于 2 个分组时为 None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_zero_total_is_no_data() {
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(1, 4), Some(25.0));
    }

    #[test]
    fn test_empty_statistics() {
        let stats = GroupStatistics::empty();
        assert!(stats.is_empty());
        assert_eq!(stats.perc_rework, None);
        assert_eq!(stats.orders_per_problem, None);
    }

    #[test]
    fn test_group_key_prefix() {
        let key = GroupKey(vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(key.prefix(2), GroupKey(vec!["A".into(), "B".into()]));
        assert_eq!(key.prefix(0), GroupKey::overall());
        assert_eq!(key.to_string(), "A / B / C");
    }
}
