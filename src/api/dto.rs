// ==========================================
// 车队维修返工分析系统 - API 请求/响应 DTO
// ==========================================
// 约定:
// - 无数据用 Report::NoData 表达, 与错误、与数值 0 区分
// - 对外记录为扁平 key → 标量 JSON 对象
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::statistics::{GroupKey, GroupStatistics, RollupRow};
use crate::domain::types::{Dimension, MinGapDays};
use crate::domain::work_order::ClassifiedOrder;
use crate::engine::indicators::{
    CorrectionIndicators, CumulativePoint, MechanicSummary, MonthlyParts, RankedGroup,
    VehicleCorrectionDays,
};
use crate::repository::filter::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 扁平记录
pub type Record = Map<String, Value>;

// ==========================================
// Report - 结果信封
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Report<T> {
    NoData,
    Ready(T),
}

impl<T> Report<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Report::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Report::Ready(data) => Some(data),
            Report::NoData => None,
        }
    }
}

// ==========================================
// 请求
// ==========================================

fn default_group_by() -> Vec<String> {
    vec![
        Dimension::Workshop.attribute_name().to_string(),
        Dimension::Section.attribute_name().to_string(),
        Dimension::Service.attribute_name().to_string(),
    ]
}

/// 返工分析请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReworkAnalysisRequest {
    pub date_from: String, // YYYY-MM-DD
    pub date_to: String,   // YYYY-MM-DD
    pub min_gap_days: Option<i64>,
    #[serde(default)]
    pub workshops: Vec<String>,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub vehicles: Vec<String>,
    /// 分组表维度（属性名）; 缺省为 车间 / 工段 / 服务
    #[serde(default = "default_group_by")]
    pub group_by: Vec<String>,
    /// 覆盖配置中的 Top-N
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl ReworkAnalysisRequest {
    pub fn new(date_from: &str, date_to: &str, min_gap_days: i64) -> Self {
        Self {
            date_from: date_from.to_string(),
            date_to: date_to.to_string(),
            min_gap_days: Some(min_gap_days),
            workshops: Vec::new(),
            sections: Vec::new(),
            services: Vec::new(),
            vehicles: Vec::new(),
            group_by: default_group_by(),
            top_n: None,
        }
    }
}

// ==========================================
// 响应
// ==========================================

/// 返工分析结果
#[derive(Debug, Clone, Serialize)]
pub struct ReworkAnalysis {
    pub run_id: String,
    pub min_gap_days: MinGapDays,
    pub date_range: DateRange,
    /// 纳入统计的结单日期上限（含）; 之后结单的工单尚未观察满一个阈值周期
    pub settled_through: NaiveDate,
    pub fetched_count: usize,
    pub excluded_count: usize,  // 缺少开工时间
    pub unsettled_count: usize, // 末尾观察窗口内结单

    pub summary: GroupStatistics,
    pub by_service: Vec<GroupStatistics>,
    pub general: Option<RollupRow>,
    pub general_by_month: Vec<Record>, // 每月一行, 各车辆百分比的均值
    pub by_model: Vec<Record>,
    pub groups: Vec<Record>,
    pub top_groups: Vec<RankedGroup>,

    pub indicators: CorrectionIndicators,
    pub cumulative_days_to_correct: Vec<CumulativePoint>,
    pub top_vehicles: Vec<VehicleCorrectionDays>,
    pub slowest_corrections: Vec<ClassifiedOrder>,
    pub mechanics: MechanicSummary,
    pub parts_by_month: Vec<MonthlyParts>,

    pub orders: Vec<ClassifiedOrder>,
}

// ==========================================
// 扁平化
// ==========================================

fn flatten_into(prefix: Option<&str>, value: Value, out: &mut Record) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let name = match prefix {
                    Some(p) => format!("{}.{}", p, key),
                    None => key,
                };
                flatten_into(Some(&name), inner, out);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" / ");
            out.insert(prefix.unwrap_or("value").to_string(), Value::String(joined));
        }
        scalar => {
            out.insert(prefix.unwrap_or("value").to_string(), scalar);
        }
    }
}

/// 序列化为扁平记录（嵌套对象展开为 `a.b`, 数组以 " / " 连接）
pub fn to_record<T: Serialize>(row: &T) -> ApiResult<Record> {
    let value = serde_json::to_value(row)?;
    let mut out = Record::new();
    flatten_into(None, value, &mut out);
    Ok(out)
}

/// 序列化为扁平记录列表
pub fn to_records<T: Serialize>(rows: &[T]) -> ApiResult<Vec<Record>> {
    rows.iter().map(to_record).collect()
}

/// 分组表 → 记录: 分组键按维度属性名展开, 再拼接行字段
pub fn group_table_records<R: Serialize>(
    dimensions: &[Dimension],
    table: &BTreeMap<GroupKey, R>,
) -> ApiResult<Vec<Record>> {
    let mut records = Vec::with_capacity(table.len());
    for (key, row) in table {
        let mut record = Record::new();
        for (dim, value) in dimensions.iter().zip(key.values()) {
            record.insert(
                dim.attribute_name().to_string(),
                Value::String(value.clone()),
            );
        }
        record.extend(to_record(row)?);
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::statistics::AggregateRow;
    use crate::domain::statistics::RoleCounts;
    use serde_json::json;

    #[test]
    fn test_report_envelope_serialization() {
        let empty: Report<u32> = Report::NoData;
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({"status": "NO_DATA"}));

        let ready = Report::Ready(vec![1, 2]);
        assert_eq!(
            serde_json::to_value(&ready).unwrap(),
            json!({"status": "READY", "data": [1, 2]})
        );
        assert!(ready.is_ready());
        assert_eq!(ready.ready(), Some(vec![1, 2]));
    }

    #[test]
    fn test_to_record_flattens() {
        #[derive(Serialize)]
        struct Inner {
            b: u32,
        }
        #[derive(Serialize)]
        struct Outer {
            a: Option<f64>,
            inner: Inner,
            key: Vec<String>,
        }

        let record = to_record(&Outer {
            a: None,
            inner: Inner { b: 7 },
            key: vec!["X".into(), "Y".into()],
        })
        .unwrap();
        assert_eq!(record["a"], Value::Null);
        assert_eq!(record["inner.b"], json!(7));
        assert_eq!(record["key"], json!("X / Y"));
    }

    #[test]
    fn test_group_table_records_use_attribute_names() {
        let mut table = BTreeMap::new();
        table.insert(
            GroupKey(vec!["OFICINA A".into(), "2024-01".into()]),
            AggregateRow::from(RoleCounts {
                total: 4,
                rework: 1,
                correction: 3,
                first_time_correction: 2,
                problems: 3,
            }),
        );

        let records =
            group_table_records(&[Dimension::Workshop, Dimension::Month], &table).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["workshop"], json!("OFICINA A"));
        assert_eq!(records[0]["year_month"], json!("2024-01"));
        assert_eq!(records[0]["perc_rework"], json!(25.0));
    }
}
