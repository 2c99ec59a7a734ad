// ==========================================
// 车队维修返工分析系统 - 导入层
// ==========================================
// 职责: 外部导出文件（CSV/Excel）→ SQLite 工单表/备件台账
// 流程: 解析 → 识别表头 → 映射 → 落库
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod work_order_importer;

pub use error::{ImportError, ImportResult};
pub use field_mapper::{map_part_usage, map_work_order, RecordLayout};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use work_order_importer::{ImportSummary, WorkOrderImporter, WorkOrderImporterImpl};
