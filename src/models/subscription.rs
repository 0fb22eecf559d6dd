use crate::shared::errors::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 請求サイクルを表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    /// 毎週
    Weekly,
    /// 毎月
    Monthly,
    /// 3ヶ月ごと
    Quarterly,
    /// 毎年
    Yearly,
}

impl BillingCycle {
    /// サポートされるすべての請求サイクル
    pub const ALL: [BillingCycle; 4] = [
        BillingCycle::Weekly,
        BillingCycle::Monthly,
        BillingCycle::Quarterly,
        BillingCycle::Yearly,
    ];

    /// 保存形式の文字列を取得
    ///
    /// # 戻り値
    /// データベースに保存される文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl FromStr for BillingCycle {
    type Err = AppError;

    /// 文字列から請求サイクルを解析する
    ///
    /// 認識できない値は設定エラーとして扱い、暗黙のデフォルトには
    /// フォールバックしない。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(BillingCycle::Weekly),
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(AppError::invalid_cycle(other)),
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// サブスクリプションの表示用ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionStatus {
    /// 期限切れ（次回請求日が過ぎている）
    Expired,
    /// 一時停止中
    Paused,
    /// まもなく更新（次回請求日が間近）
    RenewingSoon,
    /// アクティブ
    Active,
}

/// サブスクリプションデータモデル
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Subscription {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub amount: f64,
    pub currency: String,
    pub billing_cycle: String,
    pub category: String,
    pub start_date: String,
    pub next_billing_date: Option<String>,
    pub is_active: bool,
    pub reminder_preference: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Subscription {
    /// 請求サイクルを列挙型として取得する
    ///
    /// # 戻り値
    /// 請求サイクル、または値が認識できない場合はエラー
    pub fn cycle(&self) -> Result<BillingCycle, AppError> {
        self.billing_cycle.parse()
    }

    /// 次回請求日をカレンダー日付として取得する
    ///
    /// # 戻り値
    /// 次回請求日（未設定の場合はNone）、または解析できない場合はエラー
    pub fn next_billing(&self) -> Result<Option<NaiveDate>, AppError> {
        self.next_billing_date
            .as_deref()
            .map(parse_calendar_date)
            .transpose()
    }
}

/// サブスクリプション作成用DTO
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionDto {
    pub name: String,
    pub amount: f64,
    pub currency: String,
    pub billing_cycle: String,
    pub category: String,
    pub start_date: String,
    pub reminder_preference: String,
}

/// サブスクリプション更新用DTO
///
/// 開始日と次回請求日は編集では変更しない。次回請求日が再計算されるのは
/// 再開操作のときのみ。
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubscriptionDto {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub billing_cycle: Option<String>,
    pub category: Option<String>,
    pub reminder_preference: Option<String>,
}

/// `YYYY-MM-DD` 形式の文字列をカレンダー日付として解析する
///
/// 年月日の成分から直接 `NaiveDate` を構築するため、汎用の日時パーサが
/// UTC深夜として解釈してローカルタイムゾーンで日付が1日ずれる問題が
/// 起きない。日付の解析はアプリケーション全体でこの関数に統一する。
///
/// # 引数
/// * `value` - `YYYY-MM-DD` 形式の日付文字列
///
/// # 戻り値
/// カレンダー日付、または解析できない場合はエラー
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| AppError::invalid_date(value))
}
