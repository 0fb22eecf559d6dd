use crate::models::{BillingCycle, Subscription, SubscriptionStatus};
use chrono::{Days, Months, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// 「まもなく更新」と判定するデフォルトの日数
pub const DEFAULT_RENEWING_SOON_DAYS: i64 = 7;

/// 1ヶ月あたりの平均週数（52週 ÷ 12ヶ月）
const WEEKS_PER_MONTH: f64 = 52.0 / 12.0;

/// 開始日から1サイクル後の次回請求日を計算する
///
/// 月・四半期・年のサイクルはカレンダー演算で進める（固定日数ではない）。
/// 月末をまたぐ場合はchronoの規則に従い月末に丸められる
/// （例: 1月31日 + 1ヶ月 = 2月28日または29日）。
///
/// # 引数
/// * `start` - 起点となるカレンダー日付
/// * `cycle` - 請求サイクル
///
/// # 戻り値
/// 1サイクル進めた日付。すべてのサイクルで起点より厳密に後になる
pub fn next_billing_date(start: NaiveDate, cycle: BillingCycle) -> NaiveDate {
    let advanced = match cycle {
        BillingCycle::Weekly => start.checked_add_days(Days::new(7)),
        BillingCycle::Monthly => start.checked_add_months(Months::new(1)),
        BillingCycle::Quarterly => start.checked_add_months(Months::new(3)),
        BillingCycle::Yearly => start.checked_add_months(Months::new(12)),
    };

    // chronoの表現上限（西暦約26万年）付近でのみ飽和する
    advanced.unwrap_or(NaiveDate::MAX)
}

/// サブスクリプションの表示用ステータスを判定する
///
/// 判定は以下の順序で行い、最初に一致したものを返す。「期限切れ」は
/// 一時停止や更新間近より常に優先される。
/// 1. 次回請求日が今日より前 → 期限切れ（`is_active` に関わらず）
/// 2. 一時停止中 → 一時停止
/// 3. 次回請求日までの残り日数が 0〜`window_days` → まもなく更新
/// 4. それ以外 → アクティブ
///
/// # 引数
/// * `today` - 基準日（テスト可能にするため外部から注入する）
/// * `next_billing_date` - 次回請求日（未設定の場合はNone）
/// * `is_active` - アクティブフラグ（falseは一時停止）
/// * `window_days` - 「まもなく更新」と判定する日数
///
/// # 戻り値
/// 表示用ステータス
pub fn classify_status(
    today: NaiveDate,
    next_billing_date: Option<NaiveDate>,
    is_active: bool,
    window_days: i64,
) -> SubscriptionStatus {
    if let Some(next) = next_billing_date {
        if next < today {
            return SubscriptionStatus::Expired;
        }
    }

    if !is_active {
        return SubscriptionStatus::Paused;
    }

    if let Some(next) = next_billing_date {
        let remaining = (next - today).num_days();
        if (0..=window_days).contains(&remaining) {
            return SubscriptionStatus::RenewingSoon;
        }
    }

    SubscriptionStatus::Active
}

/// 任意のサイクルの金額を月額換算する
///
/// すべてのサイクルを正規化する。週額は52/12倍、四半期額は1/3、年額は
/// 1/12として月額に換算する。
///
/// # 引数
/// * `amount` - サイクルごとの金額
/// * `cycle` - 請求サイクル
///
/// # 戻り値
/// 月額換算した金額
pub fn monthly_equivalent(amount: f64, cycle: BillingCycle) -> f64 {
    match cycle {
        BillingCycle::Weekly => amount * WEEKS_PER_MONTH,
        BillingCycle::Monthly => amount,
        BillingCycle::Quarterly => amount / 3.0,
        BillingCycle::Yearly => amount / 12.0,
    }
}

/// カテゴリごとの集計値
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// カテゴリ内のサブスクリプション数
    pub count: usize,
    /// カテゴリ内の月額換算合計
    pub monthly_total: f64,
}

/// 更新間近のサブスクリプション（リマインダー・ダッシュボード表示用）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingRenewal {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub currency: String,
    pub next_billing_date: NaiveDate,
}

/// 集計中にスキップしたレコードの問題情報
///
/// 請求サイクルや日付が不正なレコードは集計から除外し、問題として記録する。
/// 呼び出し側がユーザーへの警告表示かログ出力かを判断する。
#[derive(Debug, Clone, Serialize)]
pub struct RecordIssue {
    pub id: i64,
    pub name: String,
    pub message: String,
}

/// サブスクリプション集計の結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    /// アクティブ（更新間近を含む）の月額換算合計
    pub total_active_monthly: f64,
    /// 一時停止中の月額換算合計（「節約可能額」として表示される）
    pub total_paused_monthly: f64,
    /// カテゴリ別の内訳（期限切れを除く）
    pub category_breakdown: BTreeMap<String, CategoryTotal>,
    /// 期限切れを除いたサブスクリプション数（一時停止中を含む）
    pub active_count: usize,
    /// 期限切れを除いた一時停止中のサブスクリプション数
    pub paused_count: usize,
    /// 更新間近のサブスクリプション（次回請求日の昇順、同日はID順）
    pub upcoming_renewals: Vec<UpcomingRenewal>,
    /// スキップしたレコードの問題一覧
    pub issues: Vec<RecordIssue>,
}

impl AggregateReport {
    /// アクティブ分の年額換算合計を取得
    pub fn total_active_yearly(&self) -> f64 {
        self.total_active_monthly * 12.0
    }

    /// 一時停止分の年額換算合計（年間の節約可能額）を取得
    pub fn total_paused_yearly(&self) -> f64 {
        self.total_paused_monthly * 12.0
    }

    /// アクティブなサブスクリプション1件あたりの平均月額を取得
    pub fn average_active_monthly(&self) -> f64 {
        let active = self.active_count.saturating_sub(self.paused_count);
        self.total_active_monthly / (active.max(1) as f64)
    }
}

/// サブスクリプションのコレクションを1パスで集計する
///
/// 期限切れと判定されたレコードは、アクティブ合計・一時停止合計・
/// カテゴリ内訳・件数のすべてから除外され、ユーザーが再開するまで
/// 集計には現れない。
///
/// サイクルや日付が解析できないレコードはスキップして `issues` に記録し、
/// 集計全体は継続する（部分的成功）。空のコレクションはゼロ値の結果を返す。
///
/// 結果は入力順に依存しない。カテゴリ内訳はキー順、更新間近の一覧は
/// 次回請求日（同日はID）の昇順で決定的に並ぶ。
///
/// # 引数
/// * `subscriptions` - 集計対象のサブスクリプション
/// * `today` - 基準日
/// * `window_days` - 「まもなく更新」と判定する日数
///
/// # 戻り値
/// 集計結果
pub fn aggregate(
    subscriptions: &[Subscription],
    today: NaiveDate,
    window_days: i64,
) -> AggregateReport {
    let mut report = AggregateReport::default();

    for sub in subscriptions {
        // サイクルと次回請求日を先に解析し、不正なレコードはスキップ
        let (cycle, next) = match (sub.cycle(), sub.next_billing()) {
            (Ok(cycle), Ok(next)) => (cycle, next),
            (Err(e), _) | (_, Err(e)) => {
                report.issues.push(RecordIssue {
                    id: sub.id,
                    name: sub.name.clone(),
                    message: e.details(),
                });
                continue;
            }
        };

        let status = classify_status(today, next, sub.is_active, window_days);

        // 期限切れはすべての集計から除外
        if status == SubscriptionStatus::Expired {
            continue;
        }

        report.active_count += 1;

        let monthly = monthly_equivalent(sub.amount, cycle);
        match status {
            SubscriptionStatus::Paused => {
                report.paused_count += 1;
                report.total_paused_monthly += monthly;
            }
            _ => {
                report.total_active_monthly += monthly;
            }
        }

        let entry = report
            .category_breakdown
            .entry(sub.category.clone())
            .or_insert(CategoryTotal {
                count: 0,
                monthly_total: 0.0,
            });
        entry.count += 1;
        entry.monthly_total += monthly;

        if status == SubscriptionStatus::RenewingSoon {
            if let Some(next) = next {
                report.upcoming_renewals.push(UpcomingRenewal {
                    id: sub.id,
                    name: sub.name.clone(),
                    amount: sub.amount,
                    currency: sub.currency.clone(),
                    next_billing_date: next,
                });
            }
        }
    }

    // 次回請求日の昇順、同日はID順で決定的に並べる
    report
        .upcoming_renewals
        .sort_by_key(|r| (r.next_billing_date, r.id));

    report
}
