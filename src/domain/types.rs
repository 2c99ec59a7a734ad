// ==========================================
// 车队维修返工分析系统 - 领域类型定义
// ==========================================
// 职责: 工单角色、分组维度、返工阈值等基础类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 工单角色 (Service Role)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与报表字段一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceRole {
    ReworkTrigger, // 返工: 之后过早出现同一问题
    Correction,    // 纠正: 关闭一个问题周期
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceRole::ReworkTrigger => write!(f, "REWORK_TRIGGER"),
            ServiceRole::Correction => write!(f, "CORRECTION"),
        }
    }
}

// ==========================================
// 纠正类型 (Correction Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrectionKind {
    FirstTime, // 一次修复: 周期内无返工
    Late,      // 延迟修复: 周期内存在返工
}

impl CorrectionKind {
    /// 由周期内返工次数判定纠正类型
    pub fn from_orders_to_correct(orders_to_correct: u32) -> Self {
        if orders_to_correct == 0 {
            CorrectionKind::FirstTime
        } else {
            CorrectionKind::Late
        }
    }
}

// ==========================================
// 返工阈值 (Min Gap Days)
// ==========================================
// 红线: 阈值必须为正整数, 在边界处校验, 引擎内部不再兜底

/// 界面提供的阈值预设（引擎层不做限制）
pub const MIN_GAP_PRESETS: [i64; 3] = [10, 15, 30];

/// 返工判定阈值（天）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MinGapDays(i64);

impl MinGapDays {
    /// 构造阈值
    ///
    /// # 返回
    /// - Some(MinGapDays): days >= 1
    /// - None: 非正数
    pub fn new(days: i64) -> Option<Self> {
        if days >= 1 {
            Some(Self(days))
        } else {
            None
        }
    }

    pub fn days(self) -> i64 {
        self.0
    }
}

/// 默认取第一个预设（10 天）
impl Default for MinGapDays {
    fn default() -> Self {
        Self(MIN_GAP_PRESETS[0])
    }
}

impl fmt::Display for MinGapDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}天", self.0)
    }
}

impl<'de> Deserialize<'de> for MinGapDays {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let days = i64::deserialize(deserializer)?;
        MinGapDays::new(days)
            .ok_or_else(|| serde::de::Error::custom(format!("返工阈值必须为正整数: {}", days)))
    }
}

// ==========================================
// 分组维度 (Dimension)
// ==========================================
// 用途: 聚合层的 group-by 键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Vehicle,
    Service,
    Model,
    Workshop,
    Section,
    Mechanic,
    Month, // 结单月份 YYYY-MM（缺失时取开工月份）
}

impl Dimension {
    /// 报表列名
    pub fn attribute_name(self) -> &'static str {
        match self {
            Dimension::Vehicle => "vehicle_id",
            Dimension::Service => "service_description",
            Dimension::Model => "model_description",
            Dimension::Workshop => "workshop",
            Dimension::Section => "section",
            Dimension::Mechanic => "mechanic_id",
            Dimension::Month => "year_month",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// 未知维度名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDimension(pub String);

impl fmt::Display for UnknownDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的分组维度: {}", self.0)
    }
}

impl std::error::Error for UnknownDimension {}

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vehicle" | "vehicle_id" => Ok(Dimension::Vehicle),
            "service" | "service_description" => Ok(Dimension::Service),
            "model" | "model_description" => Ok(Dimension::Model),
            "workshop" => Ok(Dimension::Workshop),
            "section" => Ok(Dimension::Section),
            "mechanic" | "mechanic_id" => Ok(Dimension::Mechanic),
            "month" | "year_month" => Ok(Dimension::Month),
            other => Err(UnknownDimension(other.to_string())),
        }
    }
}
