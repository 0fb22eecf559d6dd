use thiserror::Error;

/// アプリケーション全体で使用される統一エラー型
#[derive(Debug, Error)]
pub enum AppError {
    /// データベース関連のエラー
    #[error("データベースエラー: {0}")]
    Database(String),

    /// バリデーション関連のエラー
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// リソースが見つからない場合のエラー
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 請求サイクルが不正な場合のエラー
    #[error("不正な請求サイクル: {0}")]
    InvalidCycle(String),

    /// 日付が解析できない場合のエラー
    #[error("不正な日付: {0}")]
    InvalidDate(String),

    /// リマインダー通知の送信に失敗した場合のエラー
    #[error("通知送信エラー: {0}")]
    Dispatch(String),

    /// I/O関連のエラー
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    /// JSON解析エラー
    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),
}

/// エラーの重要度を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// 低重要度（ユーザー入力エラーなど）
    Low,
    /// 中重要度（通知送信の一時的エラーなど）
    Medium,
    /// 高重要度（データベースエラーなど）
    High,
}

impl AppError {
    /// ユーザーに表示するためのフレンドリーなメッセージを取得
    ///
    /// # 戻り値
    /// ユーザーに表示可能なエラーメッセージ
    pub fn user_message(&self) -> &str {
        match self {
            AppError::Database(_) => "データベース操作でエラーが発生しました",
            AppError::Validation(msg) => msg,
            AppError::NotFound(msg) => msg,
            AppError::InvalidCycle(_) => "請求サイクルの値が不正です",
            AppError::InvalidDate(_) => "日付の形式が不正です",
            AppError::Dispatch(_) => "リマインダー通知の送信に失敗しました",
            AppError::Io(_) => "ファイル操作でエラーが発生しました",
            AppError::Json(_) => "データ形式の解析でエラーが発生しました",
        }
    }

    /// エラーの詳細情報を取得
    ///
    /// # 戻り値
    /// エラーの詳細情報（ログ出力用）
    pub fn details(&self) -> String {
        format!("{self}")
    }

    /// エラーの重要度を取得
    ///
    /// # 戻り値
    /// エラーの重要度レベル
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Database(_) => ErrorSeverity::High,
            AppError::Validation(_) => ErrorSeverity::Low,
            AppError::NotFound(_) => ErrorSeverity::Low,
            AppError::InvalidCycle(_) => ErrorSeverity::Low,
            AppError::InvalidDate(_) => ErrorSeverity::Low,
            AppError::Dispatch(_) => ErrorSeverity::Medium,
            AppError::Io(_) => ErrorSeverity::Medium,
            AppError::Json(_) => ErrorSeverity::Medium,
        }
    }

    /// バリデーションエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - バリデーションエラーメッセージ
    ///
    /// # 戻り値
    /// バリデーションエラー
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation(message.into())
    }

    /// リソース未発見エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `resource` - 見つからなかったリソース名
    ///
    /// # 戻り値
    /// リソース未発見エラー
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        AppError::NotFound(format!("{}が見つかりません", resource.into()))
    }

    /// 請求サイクルエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `value` - 認識できなかった請求サイクルの値
    ///
    /// # 戻り値
    /// 請求サイクルエラー
    pub fn invalid_cycle<S: Into<String>>(value: S) -> Self {
        AppError::InvalidCycle(value.into())
    }

    /// 日付エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `value` - 解析できなかった日付文字列
    ///
    /// # 戻り値
    /// 日付エラー
    pub fn invalid_date<S: Into<String>>(value: S) -> Self {
        AppError::InvalidDate(value.into())
    }

    /// 通知送信エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 送信エラーメッセージ
    ///
    /// # 戻り値
    /// 通知送信エラー
    pub fn dispatch<S: Into<String>>(message: S) -> Self {
        AppError::Dispatch(message.into())
    }
}

/// AppErrorからStringへの変換（呼び出し側での表示用）
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.user_message().to_string()
    }
}

/// rusqlite::ErrorからAppErrorへの変換
impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        AppError::Database(error.to_string())
    }
}

/// Result型のエイリアス（アプリケーション全体で使用）
pub type AppResult<T> = Result<T, AppError>;
