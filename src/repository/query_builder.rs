// ==========================================
// 车队维修返工分析系统 - 参数化查询构建器
// ==========================================
// 职责: 拼接 WHERE 条件片段 + 收集位置参数
// 红线: 取值一律走 `?` 占位符, 只有代码内的常量列名进入 SQL 文本
// ==========================================

use crate::repository::filter::Selection;
use rusqlite::types::Value;

/// 构建 IN 子句的 SQL 片段
///
/// # 返回
/// - 例如: "w.vehicle_id IN (?, ?, ?)"
/// - 空列表返回 "1 = 0"（不匹配任何行）
pub fn build_in_clause<T: AsRef<str>>(column_name: &str, values: &[T]) -> String {
    if values.is_empty() {
        return "1 = 0".to_string();
    }

    let placeholders = values.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    format!("{} IN ({})", column_name, placeholders)
}

// ==========================================
// SqlFilterBuilder - WHERE 条件构建器
// ==========================================
#[derive(Debug, Default)]
pub struct SqlFilterBuilder {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl SqlFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加单参数条件, 例如 `condition("datetime(w.close_time) >= datetime(?)", v)`
    pub fn condition(mut self, clause: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(clause.to_string());
        self.params.push(value.into());
        self
    }

    /// 追加维度选择条件; Selection::All 不追加任何条件
    pub fn selection(mut self, column_name: &str, selection: &Selection) -> Self {
        if let Some(values) = selection.values() {
            self.clauses.push(build_in_clause(column_name, values));
            self.params
                .extend(values.iter().map(|v| Value::Text(v.clone())));
        }
        self
    }

    /// WHERE 子句（无条件时为空串）
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_in_clause() {
        assert_eq!(build_in_clause("w.section", &["A", "B"]), "w.section IN (?, ?)");
        let empty: Vec<String> = vec![];
        assert_eq!(build_in_clause("w.section", &empty), "1 = 0");
    }

    #[test]
    fn test_builder_skips_all_selection() {
        let builder = SqlFilterBuilder::new()
            .condition("date(p.usage_date) >= date(?)", "2024-01-01".to_string())
            .selection("p.equipment", &Selection::All);
        assert_eq!(builder.where_clause(), "WHERE date(p.usage_date) >= date(?)");
        assert_eq!(builder.params().len(), 1);
    }

    #[test]
    fn test_builder_keeps_values_out_of_sql() {
        let hostile = "X'); DROP TABLE work_order; --".to_string();
        let builder = SqlFilterBuilder::new()
            .selection("w.vehicle_id", &Selection::Only(vec![hostile.clone(), "B".into()]));
        let sql = builder.where_clause();
        assert_eq!(sql, "WHERE w.vehicle_id IN (?, ?)");
        assert!(!sql.contains("DROP"));
        assert_eq!(builder.params()[0], Value::Text(hostile));
    }

    #[test]
    fn test_empty_builder() {
        let builder = SqlFilterBuilder::new();
        assert_eq!(builder.where_clause(), "");
        assert!(builder.params().is_empty());
    }
}
