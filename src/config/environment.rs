use crate::services::billing_engine::DEFAULT_RENEWING_SOON_DAYS;
use log::warn;

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境変数から読み込むアプリケーション設定
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: Environment,
    /// ログレベル（error / warn / info / debug / trace）
    pub log_level: String,
    /// 「まもなく更新」と判定する日数
    pub reminder_window_days: i64,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 読み込む環境変数
    /// - `ENVIRONMENT`: "production" でプロダクション環境、それ以外は開発環境
    /// - `LOG_LEVEL`: ログレベル（デフォルト "info"）
    /// - `REMINDER_WINDOW_DAYS`: リマインダー日数（デフォルト 7、不正な値は
    ///   警告を出してデフォルトにフォールバック）
    ///
    /// # 戻り値
    /// 読み込んだ設定
    pub fn from_env() -> Self {
        let environment = match std::env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Environment::Production,
            _ => {
                if cfg!(debug_assertions) {
                    Environment::Development
                } else {
                    Environment::Production
                }
            }
        };

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let reminder_window_days = match std::env::var("REMINDER_WINDOW_DAYS") {
            Ok(value) => match value.parse::<i64>() {
                Ok(days) if days >= 0 => days,
                _ => {
                    warn!(
                        "REMINDER_WINDOW_DAYSの値が不正です: {value}。デフォルト値{DEFAULT_RENEWING_SOON_DAYS}を使用します"
                    );
                    DEFAULT_RENEWING_SOON_DAYS
                }
            },
            Err(_) => DEFAULT_RENEWING_SOON_DAYS,
        };

        EnvironmentConfig {
            environment,
            log_level,
            reminder_window_days,
        }
    }

    /// プロダクション環境かどうかを判定する
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # 引数
/// * `env` - 実行環境
///
/// # 戻り値
/// データベースファイル名
///
/// # ファイル名の規則
/// - 開発環境: "dev_subtra.db"
/// - プロダクション環境: "subtra.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_subtra.db",
        Environment::Production => "subtra.db",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_database_filename() {
        // 開発環境のデータベースファイル名をテスト
        assert_eq!(
            get_database_filename(Environment::Development),
            "dev_subtra.db"
        );

        // プロダクション環境のデータベースファイル名をテスト
        assert_eq!(get_database_filename(Environment::Production), "subtra.db");
    }

    #[test]
    fn test_environment_equality() {
        // Environment列挙型の等価性をテスト
        assert_eq!(Environment::Development, Environment::Development);
        assert_ne!(Environment::Development, Environment::Production);
    }

    #[test]
    fn test_from_env_defaults() {
        // 環境変数未設定時のデフォルト値を確認
        // （既存の環境変数に依存しないようクリアはしない。リマインダー日数の
        // デフォルトのみ検証する）
        let config = EnvironmentConfig::from_env();
        assert!(config.reminder_window_days >= 0);
        assert!(!config.log_level.is_empty());
    }
}
