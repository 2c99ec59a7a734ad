// ==========================================
// 车队维修返工分析系统 - 字段映射器
// ==========================================
// 职责: 源表头 → 领域字段映射 + 类型转换
// 源表头: 工单系统导出的葡语列名, 同时接受 snake_case 英文列名
// ==========================================

use crate::domain::parts::PartUsage;
use crate::domain::work_order::{parse_timestamp, WorkOrder};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRecord;
use chrono::NaiveDate;

// 表头别名（已大写）
const ORDER_ID: &[&str] = &["NUMERO DA OS", "ORDER_ID", "OS"];
const VEHICLE_ID: &[&str] = &["CODIGO DO VEICULO", "VEHICLE_ID"];
const SERVICE: &[&str] = &["DESCRICAO DO SERVICO", "SERVICE_DESCRIPTION"];
const MODEL: &[&str] = &["DESCRICAO DO MODELO", "MODEL_DESCRIPTION"];
const WORKSHOP: &[&str] = &["DESCRICAO DA OFICINA", "WORKSHOP"];
const SECTION: &[&str] = &["DESCRICAO DA SECAO", "SECTION"];
const MECHANIC: &[&str] = &["COLABORADOR QUE EXECUTOU O SERVICO", "MECHANIC_ID"];
const START_TIME: &[&str] = &["DATA INICIO SERVIÇO", "DATA INICIO SERVICO", "START_TIME"];
const CLOSE_TIME: &[&str] = &["DATA DE FECHAMENTO DO SERVICO", "CLOSE_TIME"];

const EQUIPMENT: &[&str] = &["EQUIPAMENTO", "EQUIPMENT"];
const PART: &[&str] = &["PRODUTO", "PECA", "PART"];
const QUANTITY: &[&str] = &["QUANTIDADE", "QUANTITY"];
const VALUE: &[&str] = &["VALOR", "VALUE"];
const USAGE_DATE: &[&str] = &["DATA", "DATA_TROCA", "DATE"];

/// 文件内容类型（按表头识别）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    WorkOrders,
    PartsLedger,
}

impl RecordLayout {
    /// 按首行表头识别; 都不匹配返回 None
    pub fn detect(first: &RawRecord) -> Option<Self> {
        let has = |aliases: &[&str]| aliases.iter().any(|a| first.contains_key(*a));
        if has(VEHICLE_ID) && has(SERVICE) {
            Some(RecordLayout::WorkOrders)
        } else if has(EQUIPMENT) && has(QUANTITY) {
            Some(RecordLayout::PartsLedger)
        } else {
            None
        }
    }
}

fn get_string(row: &RawRecord, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn require(row: &RawRecord, aliases: &[&str], row_number: usize) -> ImportResult<String> {
    get_string(row, aliases).ok_or_else(|| ImportError::RequiredFieldMissing {
        row: row_number,
        field: aliases[0].to_string(),
    })
}

/// 解析数值; 兼容逗号小数点
fn parse_f64(row: &RawRecord, aliases: &[&str], row_number: usize) -> ImportResult<f64> {
    match get_string(row, aliases) {
        None => Ok(0.0),
        Some(value) => value
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| ImportError::InvalidValue {
                row: row_number,
                field: aliases[0].to_string(),
                value,
            }),
    }
}

/// 工单行映射
///
/// 时间戳无法解析时保留为 None（分类时排除并计数）, 不视为导入失败
pub fn map_work_order(row: &RawRecord, row_number: usize) -> ImportResult<WorkOrder> {
    Ok(WorkOrder {
        order_id: require(row, ORDER_ID, row_number)?,
        vehicle_id: require(row, VEHICLE_ID, row_number)?,
        service_description: require(row, SERVICE, row_number)?,
        model_description: get_string(row, MODEL),
        workshop: get_string(row, WORKSHOP),
        section: get_string(row, SECTION),
        mechanic_id: get_string(row, MECHANIC),
        start_time: get_string(row, START_TIME).as_deref().and_then(parse_timestamp),
        close_time: get_string(row, CLOSE_TIME).as_deref().and_then(parse_timestamp),
        parts_used: None,
    })
}

/// 备件台账行映射
pub fn map_part_usage(row: &RawRecord, row_number: usize) -> ImportResult<PartUsage> {
    let raw_date = require(row, USAGE_DATE, row_number)?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(&raw_date).map(|t| t.date()))
        .ok_or_else(|| ImportError::InvalidValue {
            row: row_number,
            field: USAGE_DATE[0].to_string(),
            value: raw_date.clone(),
        })?;

    Ok(PartUsage {
        order_id: require(row, ORDER_ID, row_number)?,
        equipment: require(row, EQUIPMENT, row_number)?,
        part: get_string(row, PART).unwrap_or_default(),
        quantity: parse_f64(row, QUANTITY, row_number)?,
        value: parse_f64(row, VALUE, row_number)?,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_work_order_with_source_headers() {
        let r = row(&[
            ("NUMERO DA OS", "OS-77"),
            ("CODIGO DO VEICULO", "50123"),
            ("DESCRICAO DO SERVICO", "TROCAR LAMPADA"),
            ("DESCRICAO DA OFICINA", ""),
            ("DATA INICIO SERVIÇO", "2024-01-03 08:00:00"),
            ("DATA DE FECHAMENTO DO SERVICO", "sem data"),
        ]);
        let order = map_work_order(&r, 2).unwrap();
        assert_eq!(order.order_id, "OS-77");
        assert_eq!(order.workshop, None);
        assert!(order.start_time.is_some());
        assert!(order.close_time.is_none());
    }

    #[test]
    fn test_missing_vehicle_is_rejected() {
        let r = row(&[("ORDER_ID", "OS-1"), ("SERVICE_DESCRIPTION", "X")]);
        let err = map_work_order(&r, 5).unwrap_err();
        assert!(matches!(err, ImportError::RequiredFieldMissing { row: 5, .. }));
    }

    #[test]
    fn test_map_part_usage() {
        let r = row(&[
            ("OS", "OS-1"),
            ("EQUIPAMENTO", "50123"),
            ("PRODUTO", "PASTILHA"),
            ("QUANTIDADE", "2"),
            ("VALOR", "35,50"),
            ("DATA", "2024-02-10"),
        ]);
        assert_eq!(RecordLayout::detect(&r), Some(RecordLayout::PartsLedger));
        let part = map_part_usage(&r, 2).unwrap();
        assert_eq!(part.quantity, 2.0);
        assert_eq!(part.value, 35.5);
        assert_eq!(part.year_month(), "2024-02");
    }

    #[test]
    fn test_bad_quantity_is_rejected() {
        let r = row(&[
            ("NUMERO DA OS", "OS-1"),
            ("EQUIPAMENTO", "50123"),
            ("QUANTIDADE", "duas"),
            ("DATA", "2024-02-10"),
        ]);
        let err = map_part_usage(&r, 9).unwrap_err();
        assert!(matches!(err, ImportError::InvalidValue { row: 9, ref value, .. } if value == "duas"));
    }

    #[test]
    fn test_detect_layout() {
        let r = row(&[("VEHICLE_ID", "1"), ("SERVICE_DESCRIPTION", "X")]);
        assert_eq!(RecordLayout::detect(&r), Some(RecordLayout::WorkOrders));
        assert_eq!(RecordLayout::detect(&row(&[("FOO", "1")])), None);
    }
}
