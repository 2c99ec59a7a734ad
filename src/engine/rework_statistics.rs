// ==========================================
// 车队维修返工分析系统 - 统计与聚合
// ==========================================
// 职责: 将分类后的工单按任意维度组合聚合为计数与百分比,
//       并计算"各分组百分比的均值"汇总（Geral / 按车型）
// 红线: 纯归约, 不含排序/周期逻辑; total = 0 不做除法
// ==========================================

use crate::domain::statistics::{AggregateRow, GroupKey, GroupStatistics, RoleCounts, RollupRow};
use crate::domain::types::{Dimension, ServiceRole};
use crate::domain::work_order::ClassifiedOrder;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::{BTreeMap, HashSet};

// ==========================================
// 计数
// ==========================================

/// 统计角色数量与不同问题周期数
pub fn count_roles<'a, I>(rows: I) -> RoleCounts
where
    I: IntoIterator<Item = &'a ClassifiedOrder>,
{
    let mut counts = RoleCounts::default();
    let mut problems = HashSet::new();

    for row in rows {
        counts.total += 1;
        match row.role {
            ServiceRole::ReworkTrigger => counts.rework += 1,
            ServiceRole::Correction => {
                counts.correction += 1;
                if row.is_first_time_correction() {
                    counts.first_time_correction += 1;
                }
            }
        }
        problems.insert(row.problem_key());
    }

    counts.problems = problems.len();
    counts
}

/// 按服务描述统计（服务描述升序）
pub fn statistics_by_service(classified: &[ClassifiedOrder]) -> Vec<GroupStatistics> {
    let mut by_service: BTreeMap<&str, Vec<&ClassifiedOrder>> = BTreeMap::new();
    for row in classified {
        by_service
            .entry(row.order.service_description.as_str())
            .or_default()
            .push(row);
    }

    by_service
        .into_iter()
        .map(|(service, rows)| {
            GroupStatistics::from_counts(Some(service.to_string()), count_roles(rows))
        })
        .collect()
}

// ==========================================
// 聚合
// ==========================================

/// 按维度组合聚合
///
/// # 参数
/// - `classified`: 分类后的工单
/// - `group_by`: 有序维度列表; 为空时返回单个整体键
///
/// # 返回
/// 分组键 → 聚合行; 输入为空时返回空表
pub fn aggregate(
    classified: &[ClassifiedOrder],
    group_by: &[Dimension],
) -> BTreeMap<GroupKey, AggregateRow> {
    let mut groups: BTreeMap<GroupKey, Vec<&ClassifiedOrder>> = BTreeMap::new();
    for row in classified {
        let key = GroupKey(
            group_by
                .iter()
                .map(|dim| row.order.dimension_value(*dim))
                .collect(),
        );
        groups.entry(key).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(key, rows)| (key, AggregateRow::from(count_roles(rows))))
        .collect()
}

/// 按属性名聚合（属性名见 `Dimension::from_str`）
pub fn aggregate_by_names(
    classified: &[ClassifiedOrder],
    attribute_names: &[&str],
) -> EngineResult<BTreeMap<GroupKey, AggregateRow>> {
    let dims = parse_dimensions(attribute_names)?;
    Ok(aggregate(classified, &dims))
}

/// 解析属性名列表
pub fn parse_dimensions(attribute_names: &[&str]) -> EngineResult<Vec<Dimension>> {
    attribute_names
        .iter()
        .map(|name| name.parse::<Dimension>().map_err(EngineError::from))
        .collect()
}

// ==========================================
// 均值汇总
// ==========================================

/// 各分组百分比的均值汇总
///
/// 先按 `keep ++ across` 聚合, 再对每个 `keep` 键下的各分组百分比求算术平均。
/// 例如 keep = [Month], across = [Vehicle] 得到"各车辆返工率的月度均值"。
///
/// # 错误
/// - keep 与 across 存在重复维度
pub fn mean_rollup(
    classified: &[ClassifiedOrder],
    keep: &[Dimension],
    across: &[Dimension],
) -> EngineResult<BTreeMap<GroupKey, RollupRow>> {
    if let Some(dup) = keep.iter().find(|d| across.contains(d)) {
        return Err(EngineError::OverlappingDimensions(dup.to_string()));
    }

    Ok(rollup_by(classified, keep, across))
}

/// "Geral" 汇总: 所有工单, 不保留维度, 对 `across` 各分组的百分比求均值
///
/// # 返回
/// - Ok(None): 无数据
pub fn general_rollup(
    classified: &[ClassifiedOrder],
    across: &[Dimension],
) -> EngineResult<Option<RollupRow>> {
    let mut table = mean_rollup(classified, &[], across)?;
    Ok(table.remove(&GroupKey::overall()))
}

/// 按车型汇总: 每个车型下各车辆百分比的均值
pub fn model_rollup(classified: &[ClassifiedOrder]) -> BTreeMap<GroupKey, RollupRow> {
    rollup_by(classified, &[Dimension::Model], &[Dimension::Vehicle])
}

/// 按结单月份的 "Geral" 序列: 每月各车辆百分比的均值
pub fn monthly_general_rollup(classified: &[ClassifiedOrder]) -> BTreeMap<GroupKey, RollupRow> {
    rollup_by(classified, &[Dimension::Month], &[Dimension::Vehicle])
}

fn rollup_by(
    classified: &[ClassifiedOrder],
    keep: &[Dimension],
    across: &[Dimension],
) -> BTreeMap<GroupKey, RollupRow> {
    let group_by: Vec<Dimension> = keep.iter().chain(across.iter()).copied().collect();
    let table = aggregate(classified, &group_by);

    let mut buckets: BTreeMap<GroupKey, Vec<&AggregateRow>> = BTreeMap::new();
    for (key, row) in &table {
        buckets.entry(key.prefix(keep.len())).or_default().push(row);
    }

    buckets
        .into_iter()
        .map(|(key, rows)| (key, rollup_rows(&rows)))
        .collect()
}

fn rollup_rows(rows: &[&AggregateRow]) -> RollupRow {
    let totals: Vec<f64> = rows.iter().map(|r| r.total as f64).collect();
    let rework: Vec<f64> = rows.iter().filter_map(|r| r.perc_rework).collect();
    let correction: Vec<f64> = rows.iter().filter_map(|r| r.perc_correction).collect();
    let first_time: Vec<f64> = rows.iter().filter_map(|r| r.perc_first_time).collect();

    RollupRow {
        group_count: rows.len(),
        mean_total: mean(&totals),
        mean_perc_rework: mean(&rework),
        mean_perc_correction: mean(&correction),
        mean_perc_first_time: mean(&first_time),
        std_perc_rework: sample_std(&rework),
    }
}

/// 算术平均（空输入为 None）
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// 样本标准差（n - 1 自由度, 少于 2 个值为 None）
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(sample_std(&[5.0]), None);
        let std = sample_std(&[2.0, 4.0]).unwrap();
        assert!((std - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(
            parse_dimensions(&["month", "vehicle_id"]).unwrap(),
            vec![Dimension::Month, Dimension::Vehicle]
        );
        assert_eq!(
            parse_dimensions(&["garagem"]).unwrap_err(),
            EngineError::UnknownDimension("garagem".to_string())
        );
    }

    #[test]
    fn test_mean_rollup_rejects_overlap() {
        let err = mean_rollup(&[], &[Dimension::Model], &[Dimension::Model]).unwrap_err();
        assert!(matches!(err, EngineError::OverlappingDimensions(_)));
    }

    #[test]
    fn test_empty_input_yields_empty_tables() {
        assert!(aggregate(&[], &[Dimension::Vehicle]).is_empty());
        assert!(aggregate(&[], &[]).is_empty());
        assert_eq!(general_rollup(&[], &[Dimension::Vehicle]).unwrap(), None);
    }
}
