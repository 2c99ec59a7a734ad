// ==========================================
// 车队维修返工分析系统 - 请求参数校验
// ==========================================
// 职责: 在 API 边界把原始参数转换为强类型（日期区间、返工阈值、维度）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::{Dimension, MinGapDays};
use crate::repository::filter::DateRange;
use chrono::NaiveDate;

/// 解析 ISO-8601 日期 (YYYY-MM-DD)
pub fn parse_iso_date(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::InvalidInput(format!("{} 不是有效的 YYYY-MM-DD 日期: {:?}", field, raw))
    })
}

/// 校验日期区间（闭区间, 起始不得晚于结束）
pub fn validate_date_range(date_from: &str, date_to: &str) -> ApiResult<DateRange> {
    let from = parse_iso_date("date_from", date_from)?;
    let to = parse_iso_date("date_to", date_to)?;
    DateRange::new(from, to).ok_or_else(|| {
        ApiError::InvalidInput(format!("起始日期 {} 晚于结束日期 {}", from, to))
    })
}

/// 校验返工阈值: 必填, 正整数
pub fn validate_min_gap_days(min_gap_days: Option<i64>) -> ApiResult<MinGapDays> {
    let days = min_gap_days
        .ok_or_else(|| ApiError::InvalidInput("缺少返工阈值 min_gap_days".to_string()))?;
    MinGapDays::new(days)
        .ok_or_else(|| ApiError::InvalidInput(format!("返工阈值必须为正整数天数: {}", days)))
}

/// 解析分组维度; 空列表表示整体
pub fn validate_dimensions(names: &[String]) -> ApiResult<Vec<Dimension>> {
    names
        .iter()
        .map(|name| {
            name.parse::<Dimension>()
                .map_err(|e| ApiError::InvalidInput(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_date_range() {
        let range = validate_date_range("2024-01-01", " 2024-03-31").unwrap();
        assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        assert!(matches!(
            validate_date_range("2024-04-01", "2024-03-31"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_date_range("01/04/2024", "2024-03-31"),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_min_gap_days() {
        assert_eq!(validate_min_gap_days(Some(15)).unwrap().days(), 15);
        assert!(validate_min_gap_days(None).is_err());
        assert!(validate_min_gap_days(Some(0)).is_err());
        assert!(validate_min_gap_days(Some(-10)).is_err());
    }

    #[test]
    fn test_validate_dimensions() {
        let dims = validate_dimensions(&["workshop".to_string(), "month".to_string()]).unwrap();
        assert_eq!(dims, vec![Dimension::Workshop, Dimension::Month]);
        assert!(validate_dimensions(&["color".to_string()]).is_err());
    }
}
