// ==========================================
// 统计与聚合测试
// ==========================================
// 覆盖: 任意维度聚合、Geral 均值汇总、按车型汇总、指标
// ==========================================


use fleet_rework_analytics::engine::{
    aggregate, aggregate_by_names, classify, correction_indicators, cumulative_days_to_correct,
    general_rollup, mean_rollup, mechanic_summary, model_rollup, monthly_general_rollup,
    rank_groups_by_rework, slowest_corrections, top_vehicles_by_days_to_correct, EngineError,
};
use fleet_rework_analytics::logging;
use fleet_rework_analytics::{ClassifiedOrder, Dimension, GroupKey, MinGapDays, WorkOrder};
use test_helpers::group_on_days;

fn key(values: &[&str]) -> GroupKey {
    GroupKey(values.iter().map(|v| v.to_string()).collect())
}

fn with_model(mut orders: Vec<WorkOrder>, model: &str) -> Vec<WorkOrder> {
    for o in &mut orders {
        o.model_description = Some(model.to_string());
    }
    orders
}

/// 车辆 A: 1 返工 + 1 纠正（50%）; 车辆 B: 4 次独立纠正（0%）
fn two_vehicle_fixture() -> Vec<ClassifiedOrder> {
    let mut orders = with_model(group_on_days("A", "TROCAR PNEU", &[0, 5]), "TORINO");
    orders.extend(with_model(
        group_on_days("B", "TROCAR PNEU", &[0, 50, 100, 150]),
        "VIALE",
    ));
    classify(&orders, MinGapDays::new(10).unwrap()).classified
}

#[test]
fn test_general_is_mean_of_group_percentages() {
    logging::init_test();
    println!("\n=== 测试：Geral 为各分组百分比的均值 ===");

    let classified = two_vehicle_fixture();

    let general = general_rollup(&classified, &[Dimension::Vehicle, Dimension::Service])
        .unwrap()
        .unwrap();
    assert_eq!(general.group_count, 2);
    assert_eq!(general.mean_perc_rework, Some(25.0));
    assert_eq!(general.mean_total, Some(3.0));

    // 样本标准差: [50, 0] → 25 * sqrt(2)
    let std = general.std_perc_rework.unwrap();
    assert!((std - 25.0 * 2f64.sqrt()).abs() < 1e-9);

    // 合并口径为 1/6, 与均值口径不同
    let pooled = aggregate(&classified, &[]);
    let pooled_rework = pooled[&GroupKey::overall()].perc_rework.unwrap();
    assert!((pooled_rework - 100.0 / 6.0).abs() < 1e-9);
    assert_ne!(general.mean_perc_rework, Some(pooled_rework));
}

#[test]
fn test_general_averages_vehicles_not_vehicle_services() {
    logging::init_test();

    // A: S1 一次修复, S2 两次返工后纠正 → 车辆 A 为 2/4 = 50%
    // B: S1 一次修复 → 0%
    let mut orders = group_on_days("A", "S1", &[0]);
    orders.extend(group_on_days("A", "S2", &[0, 1, 2]));
    orders.extend(group_on_days("B", "S1", &[0]));
    let classified = classify(&orders, MinGapDays::new(10).unwrap()).classified;

    let per_vehicle = general_rollup(&classified, &[Dimension::Vehicle])
        .unwrap()
        .unwrap();
    assert_eq!(per_vehicle.group_count, 2);
    assert_eq!(per_vehicle.mean_perc_rework, Some(25.0));

    // (车辆, 服务) 口径: (0 + 66.7 + 0) / 3
    let per_pair = general_rollup(&classified, &[Dimension::Vehicle, Dimension::Service])
        .unwrap()
        .unwrap();
    assert_eq!(per_pair.group_count, 3);
    assert!((per_pair.mean_perc_rework.unwrap() - 200.0 / 9.0).abs() < 1e-9);

    // 按月序列与 Geral 同口径
    let monthly = monthly_general_rollup(&classified);
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[&key(&["2024-01"])].mean_perc_rework, Some(25.0));
}

#[test]
fn test_general_rollup_without_data() {
    let general = general_rollup(&[], &[Dimension::Vehicle]).unwrap();
    assert!(general.is_none());
}

#[test]
fn test_model_rollup_averages_vehicles_per_model() {
    logging::init_test();

    let mut orders = with_model(group_on_days("A", "S", &[0, 5]), "TORINO");
    orders.extend(with_model(group_on_days("C", "S", &[0, 1, 2, 3]), "TORINO"));
    orders.extend(with_model(group_on_days("B", "S", &[0]), "VIALE"));
    let classified = classify(&orders, MinGapDays::new(10).unwrap()).classified;

    let table = model_rollup(&classified);
    assert_eq!(table.len(), 2);

    // TORINO: A = 50%, C = 75% → 62.5
    let torino = &table[&key(&["TORINO"])];
    assert_eq!(torino.group_count, 2);
    assert_eq!(torino.mean_perc_rework, Some(62.5));

    let viale = &table[&key(&["VIALE"])];
    assert_eq!(viale.group_count, 1);
    assert_eq!(viale.mean_perc_rework, Some(0.0));
    assert_eq!(viale.std_perc_rework, None);
}

#[test]
fn test_mean_rollup_rejects_overlapping_dimensions() {
    let classified = two_vehicle_fixture();
    let err = mean_rollup(&classified, &[Dimension::Vehicle], &[Dimension::Vehicle]).unwrap_err();
    assert!(matches!(err, EngineError::OverlappingDimensions(_)));
}

#[test]
fn test_mean_rollup_by_month() {
    let classified = two_vehicle_fixture();
    let table = mean_rollup(&classified, &[Dimension::Month], &[Dimension::Vehicle]).unwrap();

    // 2024-01: A 两单（50%）+ B 第 0 天（0%）
    let january = &table[&key(&["2024-01"])];
    assert_eq!(january.group_count, 2);
    assert_eq!(january.mean_perc_rework, Some(25.0));

    let total_groups: usize = table.values().map(|r| r.group_count).sum();
    assert!(total_groups >= 2);
}

#[test]
fn test_aggregate_by_arbitrary_dimensions() {
    logging::init_test();

    let classified = two_vehicle_fixture();
    let table = aggregate_by_names(&classified, &["model_description", "vehicle_id"]).unwrap();

    assert_eq!(table.len(), 2);
    let a = &table[&key(&["TORINO", "A"])];
    assert_eq!(a.total, 2);
    assert_eq!(a.rework, 1);
    assert_eq!(a.correction, 1);
    assert_eq!(a.perc_rework, Some(50.0));

    let b = &table[&key(&["VIALE", "B"])];
    assert_eq!(b.total, 4);
    assert_eq!(b.first_time_correction, 4);
    assert_eq!(b.perc_first_time, Some(100.0));

    // 各分组计数之和等于总数
    let total: usize = table.values().map(|r| r.total).sum();
    assert_eq!(total, classified.len());
}

#[test]
fn test_aggregate_unknown_dimension() {
    let classified = two_vehicle_fixture();
    let err = aggregate_by_names(&classified, &["workshop", "garage"]).unwrap_err();
    assert_eq!(err, EngineError::UnknownDimension("garage".to_string()));
}

#[test]
fn test_missing_dimension_value_groups_as_unspecified() {
    let mut orders = group_on_days("A", "S", &[0]);
    orders[0].workshop = None;
    let classified = classify(&orders, MinGapDays::new(10).unwrap()).classified;

    let table = aggregate(&classified, &[Dimension::Workshop]);
    assert!(table.contains_key(&key(&["UNSPECIFIED"])));
}

#[test]
fn test_rank_groups_by_rework() {
    let classified = two_vehicle_fixture();
    let table = aggregate(&classified, &[Dimension::Vehicle]);
    let ranking = rank_groups_by_rework(&table, 1);

    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].key, key(&["A"]));
}

#[test]
fn test_correction_indicators_and_rankings() {
    logging::init_test();

    let mut orders = group_on_days("A", "S", &[0, 5, 9]);
    orders.extend(group_on_days("B", "S", &[0, 2]));
    orders.extend(group_on_days("C", "S", &[0]));
    let classified = classify(&orders, MinGapDays::new(10).unwrap()).classified;

    // 纠正: A 9 天 / 2 单, B 2 天 / 1 单, C 0 天 / 0 单
    let indicators = correction_indicators(&classified);
    assert_eq!(indicators.correction_count, 3);
    assert_eq!(indicators.mean_orders_to_correct, Some(1.0));
    let mean_days = indicators.mean_days_to_correct.unwrap();
    assert!((mean_days - 11.0 / 3.0).abs() < 1e-9);

    let curve = cumulative_days_to_correct(&classified);
    assert_eq!(curve.last().map(|p| p.cumulative_percentage), Some(100.0));
    assert!(curve
        .windows(2)
        .all(|w| w[0].days_to_correct < w[1].days_to_correct));

    let top = top_vehicles_by_days_to_correct(&classified, 2);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].vehicle_id, "A");
    assert_eq!(top[0].total_days_to_correct, 9);

    let slowest = slowest_corrections(&classified, 1);
    assert_eq!(slowest[0].order.vehicle_id, "A");
    assert_eq!(slowest[0].days_to_correct, Some(9));
}

#[test]
fn test_mechanic_summary() {
    let mut orders = group_on_days("A", "S", &[0, 5]);
    orders.extend(group_on_days("B", "S", &[0]));
    orders[2].mechanic_id = Some("9001".to_string());
    let classified = classify(&orders, MinGapDays::new(10).unwrap()).classified;

    // 3041: A 的两单（50%）; 9001: B 一单（0%）
    let summary = mechanic_summary(&classified);
    assert_eq!(summary.mechanic_count, 2);
    assert_eq!(summary.mean_perc_rework, Some(25.0));
    assert_eq!(summary.mean_orders, Some(1.5));
    assert_eq!(summary.mechanics[0].key, key(&["3041"]));
}
