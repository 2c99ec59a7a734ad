// ==========================================
// 车队维修返工分析系统 - 工单领域模型
// ==========================================
// 职责: 工单 (OS) 输入记录与分类后的输出记录
// 红线: 所有派生字段每次请求重新计算, 不落库
// ==========================================

use crate::domain::types::{CorrectionKind, Dimension, ServiceRole};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 维度值缺失时的占位
pub const UNSPECIFIED: &str = "UNSPECIFIED";

/// 支持的时间戳格式（数据库文本列 / 导入文件）
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// 解析时间戳文本; 仅日期时取当天 00:00; 无法解析返回 None
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ==========================================
// WorkOrder - 工单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub order_id: String,                  // 工单号（与备件台账关联）
    pub vehicle_id: String,                // 车辆编号
    pub service_description: String,       // 服务描述（"同一问题"分组键）
    pub model_description: Option<String>, // 车型
    pub workshop: Option<String>,          // 车间
    pub section: Option<String>,           // 工段
    pub mechanic_id: Option<String>,       // 执行技师
    pub start_time: Option<NaiveDateTime>, // 开工时间（排序键, 缺失则不参与分类）
    pub close_time: Option<NaiveDateTime>, // 结单时间
    pub parts_used: Option<f64>,           // 备件用量（来自备件台账）
}

impl WorkOrder {
    /// 报表月份 YYYY-MM（结单时间优先, 缺失时取开工时间）
    pub fn year_month(&self) -> Option<String> {
        self.close_time
            .or(self.start_time)
            .map(|ts| ts.format("%Y-%m").to_string())
    }

    /// 取分组维度对应的值
    pub fn dimension_value(&self, dimension: Dimension) -> String {
        let value = match dimension {
            Dimension::Vehicle => Some(self.vehicle_id.clone()),
            Dimension::Service => Some(self.service_description.clone()),
            Dimension::Model => self.model_description.clone(),
            Dimension::Workshop => self.workshop.clone(),
            Dimension::Section => self.section.clone(),
            Dimension::Mechanic => self.mechanic_id.clone(),
            Dimension::Month => self.year_month(),
        };

        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| UNSPECIFIED.to_string())
    }
}

// ==========================================
// ClassifiedOrder - 分类后的工单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedOrder {
    #[serde(flatten)]
    pub order: WorkOrder,
    pub gap_days: i64,                  // 距同组上一张工单的天数（组内首单为 0）
    pub role: ServiceRole,              // 返工 / 纠正
    pub days_to_correct: Option<i64>,   // 仅纠正工单: 周期起点到本单的天数
    pub orders_to_correct: Option<u32>, // 仅纠正工单: 周期内返工工单数
    pub episode_no: u32,                // 组内问题周期序号（从 1 开始）
}

impl ClassifiedOrder {
    pub fn is_rework(&self) -> bool {
        self.role == ServiceRole::ReworkTrigger
    }

    pub fn is_correction(&self) -> bool {
        self.role == ServiceRole::Correction
    }

    /// 纠正类型（非纠正工单返回 None）
    pub fn correction_kind(&self) -> Option<CorrectionKind> {
        match self.role {
            ServiceRole::Correction => Some(CorrectionKind::from_orders_to_correct(
                self.orders_to_correct.unwrap_or(0),
            )),
            ServiceRole::ReworkTrigger => None,
        }
    }

    pub fn is_first_time_correction(&self) -> bool {
        self.correction_kind() == Some(CorrectionKind::FirstTime)
    }

    /// 问题标识: (车辆, 服务, 周期序号)
    pub fn problem_key(&self) -> (&str, &str, u32) {
        (
            self.order.vehicle_id.as_str(),
            self.order.service_description.as_str(),
            self.episode_no,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> WorkOrder {
        WorkOrder {
            order_id: "OS-1".to_string(),
            vehicle_id: "50123".to_string(),
            service_description: "TROCAR PASTILHA DE FREIO".to_string(),
            model_description: None,
            workshop: Some("GARAGEM CENTRAL".to_string()),
            section: Some("  ".to_string()),
            mechanic_id: Some("3041".to_string()),
            start_time: NaiveDate::from_ymd_opt(2024, 3, 30)
                .unwrap()
                .and_hms_opt(8, 0, 0),
            close_time: NaiveDate::from_ymd_opt(2024, 4, 2)
                .unwrap()
                .and_hms_opt(17, 0, 0),
            parts_used: None,
        }
    }

    #[test]
    fn test_year_month_prefers_close_time() {
        let mut o = order();
        assert_eq!(o.year_month().as_deref(), Some("2024-04"));
        o.close_time = None;
        assert_eq!(o.year_month().as_deref(), Some("2024-03"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-05-06 07:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-06T07:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-06T07:30:00.000"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-05-06").map(|t| t.date()),
            Some(expected.date())
        );
        assert_eq!(parse_timestamp("06/05/2024"), None);
        assert_eq!(parse_timestamp("  "), None);
    }

    #[test]
    fn test_dimension_value_fallback() {
        let o = order();
        assert_eq!(o.dimension_value(Dimension::Model), UNSPECIFIED);
        assert_eq!(o.dimension_value(Dimension::Section), UNSPECIFIED);
        assert_eq!(o.dimension_value(Dimension::Workshop), "GARAGEM CENTRAL");
    }
}
