// ==========================================
// 车队维修返工分析系统 - 查询过滤条件
// ==========================================
// 说明: 各维度条件为"与"关系; 列表为空或包含"全部"哨兵表示该维度不过滤
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// "全部"哨兵（规范值）
pub const ALL: &str = "ALL";

/// 识别为"全部"的哨兵（界面沿用 TODAS）
pub fn is_all_sentinel(value: &str) -> bool {
    matches!(
        value.trim().to_uppercase().as_str(),
        "ALL" | "TODAS" | "TODOS"
    )
}

// ==========================================
// Selection - 维度选择
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    All,
    Only(Vec<String>),
}

impl Selection {
    /// 由取值列表构造; 空列表或包含哨兵 → All
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Self {
        let cleaned: Vec<String> = values
            .iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        if cleaned.is_empty() || cleaned.iter().any(|v| is_all_sentinel(v)) {
            Selection::All
        } else {
            Selection::Only(cleaned)
        }
    }

    /// 修正界面多选列表
    ///
    /// 规则（按选择顺序）:
    /// 1. 未选择任何项 → [ALL]
    /// 2. 先选了其他项后又选 ALL → [ALL]
    /// 3. 先选 ALL 后又选其他项 → 去掉 ALL
    /// 4. 其他情况原样返回
    pub fn repair_ui_list(list: &[String]) -> Vec<String> {
        if list.is_empty() {
            return vec![ALL.to_string()];
        }

        if list.len() > 1 && list[1..].iter().any(|v| is_all_sentinel(v)) {
            return vec![ALL.to_string()];
        }

        if list.len() > 1 && list.iter().any(|v| is_all_sentinel(v)) {
            return list
                .iter()
                .filter(|v| !is_all_sentinel(v))
                .cloned()
                .collect();
        }

        list.to_vec()
    }

    /// 具体取值（All 返回 None）
    pub fn values(&self) -> Option<&[String]> {
        match self {
            Selection::All => None,
            Selection::Only(values) => Some(values),
        }
    }
}

// ==========================================
// DateRange - 日期区间（闭区间）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// 构造; from > to 返回 None
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        if from <= to {
            Some(Self { from, to })
        } else {
            None
        }
    }

    /// 右开边界: to 的次日
    pub fn end_exclusive(&self) -> NaiveDate {
        self.to.succ_opt().unwrap_or(self.to)
    }

    /// 闭区间包含
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

// ==========================================
// 过滤条件
// ==========================================

/// 工单查询条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderFilter {
    pub date_range: DateRange,
    #[serde(default)]
    pub workshops: Selection,
    #[serde(default)]
    pub sections: Selection,
    #[serde(default)]
    pub services: Selection,
    #[serde(default)]
    pub vehicles: Selection,
}

impl WorkOrderFilter {
    /// 仅限日期区间, 其他维度不过滤
    pub fn for_range(date_range: DateRange) -> Self {
        Self {
            date_range,
            workshops: Selection::All,
            sections: Selection::All,
            services: Selection::All,
            vehicles: Selection::All,
        }
    }
}

/// 备件查询条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartsFilter {
    pub date_range: DateRange,
    #[serde(default)]
    pub equipment: Selection,
}
