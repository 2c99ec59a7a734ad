// ==========================================
// 车队维修返工分析系统 - 备件台账模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 备件更换记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartUsage {
    pub order_id: String,  // 关联工单号
    pub equipment: String, // 设备/车辆编号
    pub part: String,      // 备件名称
    pub quantity: f64,
    pub value: f64,
    pub date: NaiveDate, // 更换日期
}

impl PartUsage {
    pub fn year_month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}
