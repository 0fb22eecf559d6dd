use crate::db::migrations;
use crate::shared::errors::{AppError, AppResult};
use log::info;
use rusqlite::Connection;
use std::path::Path;

/// データベース接続を開き、マイグレーションを実行する
///
/// # 引数
/// * `path` - データベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
pub fn open_database(path: &Path) -> AppResult<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| AppError::Database(format!("データベースのオープンに失敗しました: {e}")))?;

    migrations::run_migrations(&conn)?;

    info!("データベースを初期化しました: {}", path.display());

    Ok(conn)
}

/// インメモリのデータベース接続を開く（テスト・開発用）
///
/// # 戻り値
/// マイグレーション適用済みのインメモリ接続、または失敗時はエラー
pub fn open_in_memory() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| AppError::Database(format!("データベースのオープンに失敗しました: {e}")))?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_database_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("subtra.db");

        let conn = open_database(&db_path).unwrap();

        // テーブルが作成されている
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'subscriptions'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert!(db_path.exists());
    }

    #[test]
    fn test_open_database_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("subtra.db");

        // 2回開いてもマイグレーションは失敗しない
        drop(open_database(&db_path).unwrap());
        open_database(&db_path).unwrap();
    }
}
