// ==========================================
// 车队维修返工分析系统 - 命令行入口
// ==========================================
// 用法:
//   fleet-rework import  <db_path> <file>...
//   fleet-rework analyze <db_path> <date_from> <date_to> [min_gap_days]
//   fleet-rework config  <db_path> [key value]
// 输出: JSON（stdout）, 日志写 stderr
// ==========================================

use anyhow::{anyhow, bail, Context};
use fleet_rework_analytics::api::ReworkAnalysisRequest;
use fleet_rework_analytics::app::{get_default_db_path, AppState};
use fleet_rework_analytics::importer::WorkOrderImporter;
use fleet_rework_analytics::logging;
use std::path::PathBuf;

const USAGE: &str = "用法:
  fleet-rework import  <db_path> <file>...
  fleet-rework analyze <db_path> <date_from> <date_to> [min_gap_days]
  fleet-rework config  <db_path> [key value]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let db_path = args
        .get(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "-")
        .unwrap_or_else(get_default_db_path);

    tracing::info!(
        version = fleet_rework_analytics::VERSION,
        db_path = %db_path,
        command,
        "{}",
        fleet_rework_analytics::APP_NAME
    );

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command {
        "import" => {
            let files: Vec<PathBuf> = args.iter().skip(2).map(PathBuf::from).collect();
            if files.is_empty() {
                bail!("import 需要至少一个文件\n{}", USAGE);
            }

            let results = state.importer.batch_import(files).await;
            let report: Vec<serde_json::Value> = results
                .into_iter()
                .map(|r| match r {
                    Ok(summary) => serde_json::json!({"status": "OK", "summary": summary}),
                    Err(message) => serde_json::json!({"status": "FAILED", "error": message}),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "analyze" => {
            let (Some(date_from), Some(date_to)) = (args.get(2), args.get(3)) else {
                bail!("analyze 需要起止日期\n{}", USAGE);
            };

            let min_gap_days = match args.get(4) {
                Some(raw) => raw
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("min_gap_days 不是整数: {}", raw))?,
                None => state.rework_api.analysis_config()?.default_min_gap_days.days(),
            };

            let request = ReworkAnalysisRequest::new(date_from, date_to, min_gap_days);
            let report = state
                .rework_api
                .analyze(&request)
                .with_context(|| format!("分析失败: {} ~ {}", date_from, date_to))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "config" => match (args.get(2), args.get(3)) {
            (Some(key), Some(value)) => {
                state
                    .config_manager
                    .set_value(key, value)
                    .map_err(|e| anyhow!("写入配置 {} 失败: {}", key, e))?;
                let snapshot = state
                    .config_manager
                    .get_config_snapshot()
                    .map_err(|e| anyhow!("读取配置失败: {}", e))?;
                println!("{}", snapshot);
            }
            _ => {
                let config = state.rework_api.analysis_config()?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
        other => {
            bail!("未知命令: {}\n{}", other, USAGE);
        }
    }

    Ok(())
}
