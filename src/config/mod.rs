pub mod environment;

pub use environment::{get_database_filename, Environment, EnvironmentConfig};

use log::{info, warn};

/// アプリケーション設定を初期化する
///
/// .envファイルの読み込みとログシステムの初期化を行い、読み込んだ設定を
/// 返す。プロセス起動時に一度だけ呼び出すこと。
///
/// # 戻り値
/// 読み込んだ環境設定
pub fn initialize() -> EnvironmentConfig {
    // 環境変数を読み込み（.envファイルがある場合）
    if dotenv::dotenv().is_err() {
        // .envファイルがない場合は無視（本番環境では環境変数が直接設定される）
        warn!(".envファイルが見つかりません。環境変数が直接設定されていることを確認してください。");
    }

    let config = EnvironmentConfig::from_env();
    initialize_logging(&config);

    info!(
        "アプリケーション設定を初期化しました: environment={:?}, reminder_window_days={}",
        config.environment, config.reminder_window_days
    );

    config
}

/// ログシステムを初期化する
///
/// # 引数
/// * `config` - 環境設定
pub fn initialize_logging(config: &EnvironmentConfig) {
    // ログレベルを設定
    let log_level = match config.log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    // env_loggerを初期化（テストなどで多重初期化されても失敗させない）
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();
}
