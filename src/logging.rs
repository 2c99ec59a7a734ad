// ==========================================
// 日志系统初始化
// ==========================================
// tracing + tracing-subscriber, RUST_LOG 控制级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤器: 本库 info, 慢查询 warn
const DEFAULT_FILTER: &str = "info,slow_sql=warn";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器
///   例如: RUST_LOG=debug 或 RUST_LOG=fleet_rework_analytics=trace,perf=info
/// - FLEET_REWORK_LOG_JSON: 设为 1 时输出 JSON 行
///
/// # 示例
/// ```no_run
/// use fleet_rework_analytics::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("FLEET_REWORK_LOG_JSON")
        .map(|v| v.trim() == "1")
        .unwrap_or(false);

    // 日志写 stderr, stdout 留给报表 JSON
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// 初始化测试环境的日志系统
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
