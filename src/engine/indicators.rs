// ==========================================
// 车队维修返工分析系统 - 驾驶舱指标
// ==========================================
// 职责: 由分类结果派生的指标与排行
// - 平均纠正天数 / 平均纠正工单数
// - 纠正天数累计分布曲线
// - 车辆排行（纠正天数合计）/ 最慢纠正工单
// - 分组返工率排行
// - 技师返工率均值与标准差
// - 备件按月汇总
// ==========================================

use crate::domain::parts::PartUsage;
use crate::domain::statistics::{percentage, AggregateRow, GroupKey};
use crate::domain::types::Dimension;
use crate::domain::work_order::ClassifiedOrder;
use crate::engine::rework_statistics::{aggregate, mean, sample_std};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

// ==========================================
// 纠正指标
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionIndicators {
    pub correction_count: usize,
    pub mean_days_to_correct: Option<f64>,
    pub mean_orders_to_correct: Option<f64>,
    pub perc_rework: Option<f64>,
}

/// 纠正指标（仅统计纠正工单的天数/工单数）
pub fn correction_indicators(classified: &[ClassifiedOrder]) -> CorrectionIndicators {
    let mut days = Vec::new();
    let mut orders = Vec::new();
    let mut rework = 0;

    for row in classified {
        if row.is_rework() {
            rework += 1;
        }
        if let (Some(d), Some(n)) = (row.days_to_correct, row.orders_to_correct) {
            days.push(d as f64);
            orders.push(n as f64);
        }
    }

    CorrectionIndicators {
        correction_count: days.len(),
        mean_days_to_correct: mean(&days),
        mean_orders_to_correct: mean(&orders),
        perc_rework: percentage(rework, classified.len()),
    }
}

// ==========================================
// 纠正天数累计分布
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub days_to_correct: i64,
    pub count: usize,                 // 该天数的纠正工单数
    pub cumulative_percentage: f64,   // 纠正天数 <= days_to_correct 的占比
}

/// 纠正天数累计分布（按天数升序, 每个不同天数一个点）
pub fn cumulative_days_to_correct(classified: &[ClassifiedOrder]) -> Vec<CumulativePoint> {
    let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
    for days in classified.iter().filter_map(|r| r.days_to_correct) {
        *histogram.entry(days).or_default() += 1;
    }

    let total: usize = histogram.values().sum();
    let mut running = 0;
    let mut points = Vec::with_capacity(histogram.len());
    for (days_to_correct, count) in histogram {
        running += count;
        points.push(CumulativePoint {
            days_to_correct,
            count,
            cumulative_percentage: 100.0 * running as f64 / total as f64,
        });
    }
    points
}

// ==========================================
// 排行
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleCorrectionDays {
    pub vehicle_id: String,
    pub total_days_to_correct: i64,
    pub correction_count: usize,
}

/// 车辆排行: 纠正天数合计降序, 同值按车辆编号升序
pub fn top_vehicles_by_days_to_correct(
    classified: &[ClassifiedOrder],
    limit: usize,
) -> Vec<VehicleCorrectionDays> {
    let mut by_vehicle: HashMap<&str, (i64, usize)> = HashMap::new();
    for row in classified {
        if let Some(days) = row.days_to_correct {
            let entry = by_vehicle.entry(row.order.vehicle_id.as_str()).or_default();
            entry.0 += days;
            entry.1 += 1;
        }
    }

    let mut ranking: Vec<VehicleCorrectionDays> = by_vehicle
        .into_iter()
        .map(|(vehicle_id, (total, count))| VehicleCorrectionDays {
            vehicle_id: vehicle_id.to_string(),
            total_days_to_correct: total,
            correction_count: count,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.total_days_to_correct
            .cmp(&a.total_days_to_correct)
            .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
    });
    ranking.truncate(limit);
    ranking
}

/// 最慢纠正工单: 纠正天数降序（同值保持分类输出顺序）
pub fn slowest_corrections(classified: &[ClassifiedOrder], limit: usize) -> Vec<ClassifiedOrder> {
    let mut corrections: Vec<&ClassifiedOrder> =
        classified.iter().filter(|r| r.is_correction()).collect();
    corrections.sort_by(|a, b| b.days_to_correct.cmp(&a.days_to_correct));
    corrections.into_iter().take(limit).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGroup {
    pub key: GroupKey,
    #[serde(flatten)]
    pub row: AggregateRow,
}

/// 分组返工率排行: perc_rework 降序, 无数据的分组排在最后
pub fn rank_groups_by_rework(
    table: &BTreeMap<GroupKey, AggregateRow>,
    limit: usize,
) -> Vec<RankedGroup> {
    let mut ranking: Vec<RankedGroup> = table
        .iter()
        .map(|(key, row)| RankedGroup {
            key: key.clone(),
            row: row.clone(),
        })
        .collect();

    ranking.sort_by(|a, b| match (a.row.perc_rework, b.row.perc_rework) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranking.truncate(limit);
    ranking
}

// ==========================================
// 技师汇总
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicSummary {
    pub mechanic_count: usize,
    pub mean_orders: Option<f64>,
    pub mean_perc_rework: Option<f64>,
    pub std_perc_rework: Option<f64>,
    /// 按返工率降序的技师明细
    pub mechanics: Vec<RankedGroup>,
}

/// 技师汇总: 每位技师的返工率, 及其均值与样本标准差
pub fn mechanic_summary(classified: &[ClassifiedOrder]) -> MechanicSummary {
    let table = aggregate(classified, &[Dimension::Mechanic]);
    let totals: Vec<f64> = table.values().map(|r| r.total as f64).collect();
    let rework: Vec<f64> = table.values().filter_map(|r| r.perc_rework).collect();

    MechanicSummary {
        mechanic_count: table.len(),
        mean_orders: mean(&totals),
        mean_perc_rework: mean(&rework),
        std_perc_rework: sample_std(&rework),
        mechanics: rank_groups_by_rework(&table, table.len()),
    }
}

// ==========================================
// 备件按月汇总
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyParts {
    pub year_month: String,
    pub total_quantity: f64,
    pub total_value: f64,
    pub equipment_count: usize,
    /// 当月每台设备的平均更换数量
    pub mean_quantity_per_equipment: Option<f64>,
}

/// 备件更换按月汇总（月份升序）
pub fn parts_by_month(parts: &[PartUsage]) -> Vec<MonthlyParts> {
    let mut by_month: BTreeMap<String, (f64, f64, HashSet<&str>)> = BTreeMap::new();
    for part in parts {
        let entry = by_month.entry(part.year_month()).or_default();
        entry.0 += part.quantity;
        entry.1 += part.value;
        entry.2.insert(part.equipment.as_str());
    }

    by_month
        .into_iter()
        .map(|(year_month, (total_quantity, total_value, equipment))| {
            let equipment_count = equipment.len();
            MonthlyParts {
                year_month,
                total_quantity,
                total_value,
                equipment_count,
                mean_quantity_per_equipment: (equipment_count > 0)
                    .then(|| total_quantity / equipment_count as f64),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn part(day: (i32, u32, u32), quantity: f64, value: f64) -> PartUsage {
        PartUsage {
            order_id: "OS-1".to_string(),
            equipment: if day.2 > 20 { "50124" } else { "50123" }.to_string(),
            part: "PASTILHA".to_string(),
            quantity,
            value,
            date: NaiveDate::from_ymd_opt(day.0, day.1, day.2).unwrap(),
        }
    }

    #[test]
    fn test_parts_by_month() {
        let parts = vec![
            part((2024, 2, 10), 2.0, 100.0),
            part((2024, 1, 5), 1.0, 30.0),
            part((2024, 2, 28), 3.0, 60.0),
        ];
        let months = parts_by_month(&parts);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].year_month, "2024-01");
        assert_eq!(months[1].total_quantity, 5.0);
        assert_eq!(months[1].total_value, 160.0);
        assert_eq!(months[1].equipment_count, 2);
        assert_eq!(months[1].mean_quantity_per_equipment, Some(2.5));
        assert_eq!(months[0].mean_quantity_per_equipment, Some(1.0));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(cumulative_days_to_correct(&[]).is_empty());
        let ind = correction_indicators(&[]);
        assert_eq!(ind.correction_count, 0);
        assert_eq!(ind.mean_days_to_correct, None);
        assert_eq!(ind.perc_rework, None);
        let mech = mechanic_summary(&[]);
        assert_eq!(mech.mechanic_count, 0);
        assert_eq!(mech.mean_perc_rework, None);
    }
}
