// ==========================================
// 车队维修返工分析系统 - 仓储层错误类型
// ==========================================
// 说明: 取数失败一律上抛, 由 API 层归为 DataAccess, 不重试
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("无法打开数据库: {0}")]
    Open(String),

    /// 其他连接持有写锁且超过 busy_timeout
    #[error("数据库繁忙: {0}")]
    Busy(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    Transaction(String),

    /// 列值与期望类型不符（例如数量列存了文本）
    #[error("数据行无法解析: {0}")]
    CorruptRow(String),

    #[error("数据库查询失败: {0}")]
    Query(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) => match e.code {
                ErrorCode::CannotOpen | ErrorCode::NotADatabase => {
                    RepositoryError::Open(err.to_string())
                }
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    RepositoryError::Busy(err.to_string())
                }
                _ => RepositoryError::Query(err.to_string()),
            },
            rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => {
                RepositoryError::CorruptRow(err.to_string())
            }
            _ => RepositoryError::Query(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_type_mismatch_is_corrupt_row() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT 'abc'", [], |row| row.get::<_, f64>(0))
            .unwrap_err();
        assert!(matches!(
            RepositoryError::from(err),
            RepositoryError::CorruptRow(_)
        ));
    }

    #[test]
    fn test_syntax_error_is_query_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("SELEC 1", []).unwrap_err();
        assert!(matches!(RepositoryError::from(err), RepositoryError::Query(_)));
    }
}
