// ==========================================
// 车队维修返工分析系统 - 性能统计
// ==========================================
// 职责: 分析请求耗时 + 读/写语句计数 + 慢查询日志
// 依赖: rusqlite `trace` 特性
// ==========================================

use rusqlite::Connection;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 开关环境变量
pub const ENV_PERF_SQL: &str = "FLEET_REWORK_PERF_SQL";
/// 慢 SQL 阈值环境变量（毫秒）
pub const ENV_SLOW_SQL_MS: &str = "FLEET_REWORK_SLOW_SQL_MS";

/// 0 表示关闭统计
static SLOW_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

/// 当前线程上正在计时的请求（可嵌套）
#[derive(Debug, Default, Clone, Copy)]
struct StatementTally {
    reads: u64,
    writes: u64,
    slow: u64,
}

thread_local! {
    static OPEN_SPANS: RefCell<Vec<StatementTally>> = RefCell::new(Vec::new());
}

fn with_open_spans(f: impl FnOnce(&mut StatementTally)) {
    OPEN_SPANS.with(|spans| {
        if let Some(outermost) = spans.borrow_mut().first_mut() {
            f(outermost);
        }
    });
}

// ==========================================
// SqlPerfSettings
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlPerfSettings {
    pub enabled: bool,
    pub slow_sql_ms: u64,
}

impl SqlPerfSettings {
    /// Debug 构建默认开启（阈值 50ms）, Release 默认关闭（阈值 200ms）
    pub fn from_env() -> Self {
        let enabled = std::env::var(ENV_PERF_SQL)
            .map(|v| parse_flag(&v))
            .unwrap_or(cfg!(debug_assertions));
        let default_ms = if cfg!(debug_assertions) { 50 } else { 200 };
        let slow_sql_ms = std::env::var(ENV_SLOW_SQL_MS)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|ms: &u64| *ms > 0)
            .unwrap_or(default_ms);

        Self {
            enabled,
            slow_sql_ms,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim();
    ["1", "true", "on", "yes", "sim"]
        .iter()
        .any(|t| raw.eq_ignore_ascii_case(t))
}

fn is_read_statement(sql: &str) -> bool {
    let head = sql.trim_start().get(..6).unwrap_or("");
    head.eq_ignore_ascii_case("select") || head.eq_ignore_ascii_case("pragma")
}

/// 单行展示, 超长截断
fn one_line(sql: &str, limit: usize) -> String {
    let mut out = String::with_capacity(sql.len().min(limit + 1));
    for (n, word) in sql.split_whitespace().enumerate() {
        if n > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    match out.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &out[..cut]),
        None => out,
    }
}

/// 在连接上挂载 trace/profile 回调; 关闭时卸载
pub fn install_sqlite_tracing(conn: &mut Connection, settings: SqlPerfSettings) {
    if settings.enabled {
        SLOW_THRESHOLD_MS.store(settings.slow_sql_ms, Ordering::Relaxed);
        conn.trace(Some(on_statement));
        conn.profile(Some(on_statement_done));
    } else {
        SLOW_THRESHOLD_MS.store(0, Ordering::Relaxed);
        conn.trace(None);
        conn.profile(None);
    }
}

fn on_statement(sql: &str) {
    let read = is_read_statement(sql);
    with_open_spans(|tally| {
        if read {
            tally.reads += 1;
        } else {
            tally.writes += 1;
        }
    });
}

fn on_statement_done(sql: &str, took: Duration) {
    let threshold = SLOW_THRESHOLD_MS.load(Ordering::Relaxed);
    let took_ms = took.as_millis() as u64;
    if threshold == 0 || took_ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        took_ms,
        threshold_ms = threshold,
        sql = %one_line(sql, 400),
        "慢查询"
    );
    with_open_spans(|tally| tally.slow += 1);
}

// ==========================================
// PerfGuard - 请求耗时
// ==========================================
/// drop 时输出一条 `perf` 日志: 耗时、读/写语句数、慢查询数
///
/// 嵌套时语句只计入最外层请求
pub struct PerfGuard {
    op: &'static str,
    started: Instant,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        OPEN_SPANS.with(|spans| spans.borrow_mut().push(StatementTally::default()));
        Self {
            op,
            started: Instant::now(),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let tally = OPEN_SPANS
            .with(|spans| spans.borrow_mut().pop())
            .unwrap_or_default();

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            sql_reads = tally.reads,
            sql_writes = tally.writes,
            slow_sql = tally.slow,
            "分析请求完成"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line() {
        assert_eq!(one_line("SELECT  *\n  FROM t", 100), "SELECT * FROM t");
        assert_eq!(one_line("SELECT * FROM work_order", 6), "SELECT…");
    }

    #[test]
    fn test_flags_and_statement_kind() {
        assert!(parse_flag(" Sim "));
        assert!(!parse_flag("0"));
        assert!(is_read_statement("  select 1"));
        assert!(!is_read_statement("INSERT INTO parts_usage VALUES (1)"));
    }

    #[test]
    fn test_statements_counted_inside_guard() {
        let mut conn = Connection::open_in_memory().unwrap();
        install_sqlite_tracing(
            &mut conn,
            SqlPerfSettings {
                enabled: true,
                slow_sql_ms: 10_000,
            },
        );

        let _guard = PerfGuard::new("test");
        conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
            .unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(n, 1);

        let tally = OPEN_SPANS.with(|s| s.borrow().first().copied()).unwrap();
        assert!(tally.reads >= 1);
        assert!(tally.writes >= 1);
        assert_eq!(tally.slow, 0);
    }
}
