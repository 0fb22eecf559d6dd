use crate::db::subscription_operations;
use crate::services::billing_engine::{self, UpcomingRenewal};
use crate::shared::errors::AppResult;
use chrono::NaiveDate;
use log::{error, info, warn};
use rusqlite::Connection;

/// リマインダー通知の送信先となる外部ディスパッチャ
///
/// プッシュ通知・メールなどの配送トランスポートはこのコアの外にある。
/// エンジンはフィルタ済みの更新間近一覧を渡すだけで、配送方法には
/// 関与しない。
pub trait ReminderDispatcher {
    /// ユーザーへのリマインダー通知を送信する
    ///
    /// # 引数
    /// * `user_id` - ユーザーID
    /// * `renewals` - 更新間近のサブスクリプション一覧
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー
    fn dispatch(&self, user_id: &str, renewals: &[UpcomingRenewal]) -> AppResult<()>;
}

/// リマインダースキャンの実行結果サマリー
#[derive(Debug, Default)]
pub struct ReminderRunSummary {
    /// スキャンしたユーザー数
    pub users_scanned: usize,
    /// 通知を送信したユーザー数
    pub reminders_dispatched: usize,
    /// 失敗したユーザーとエラーメッセージの一覧
    pub failures: Vec<(String, String)>,
}

/// 全ユーザーのリマインダースキャンを実行する
///
/// 日次の定期ジョブから呼び出される。各ユーザーを独立に処理し、
/// 1ユーザーの失敗は記録するだけで他のユーザーの処理は継続する。
/// リトライは行わない（リトライは外側のジョブ基盤の責務）。
///
/// # 引数
/// * `conn` - データベース接続
/// * `dispatcher` - 通知ディスパッチャ
/// * `today` - 基準日
/// * `window_days` - リマインダー対象とする日数
///
/// # 戻り値
/// 実行結果サマリー、またはユーザー一覧の取得に失敗した場合はエラー
pub fn run_reminder_scan(
    conn: &Connection,
    dispatcher: &dyn ReminderDispatcher,
    today: NaiveDate,
    window_days: i64,
) -> AppResult<ReminderRunSummary> {
    info!("リマインダースキャンを開始します: 基準日={today}");

    let user_ids = subscription_operations::list_user_ids(conn)?;
    let mut summary = ReminderRunSummary::default();

    for user_id in user_ids {
        summary.users_scanned += 1;

        let subscriptions = match subscription_operations::find_all(conn, &user_id) {
            Ok(subs) => subs,
            Err(e) => {
                error!("ユーザー {user_id} のサブスクリプション取得に失敗しました: {e}");
                summary.failures.push((user_id, e.details()));
                continue;
            }
        };

        let report = billing_engine::aggregate(&subscriptions, today, window_days);

        for issue in &report.issues {
            warn!(
                "ユーザー {user_id} のレコードをスキップしました: id={}, name={}, 理由={}",
                issue.id, issue.name, issue.message
            );
        }

        if report.upcoming_renewals.is_empty() {
            continue;
        }

        match dispatcher.dispatch(&user_id, &report.upcoming_renewals) {
            Ok(()) => {
                summary.reminders_dispatched += 1;
                info!(
                    "ユーザー {user_id} に{}件の更新リマインダーを送信しました",
                    report.upcoming_renewals.len()
                );
            }
            Err(e) => {
                error!("ユーザー {user_id} へのリマインダー送信に失敗しました: {e}");
                summary.failures.push((user_id, e.details()));
            }
        }
    }

    info!(
        "リマインダースキャンが完了しました: 対象ユーザー={}, 送信={}, 失敗={}",
        summary.users_scanned,
        summary.reminders_dispatched,
        summary.failures.len()
    );

    Ok(summary)
}

/// リマインダーメールのHTML本文を生成する
///
/// # 引数
/// * `user_name` - 表示用のユーザー名
/// * `renewals` - 更新間近のサブスクリプション一覧
///
/// # 戻り値
/// メール本文のHTML文字列
pub fn render_reminder_email(user_name: &str, renewals: &[UpcomingRenewal]) -> String {
    let rows: String = renewals
        .iter()
        .map(|r| {
            format!(
                "      <tr><td>{}</td><td>{} {:.2}</td><td>{}</td></tr>\n",
                r.name,
                r.currency,
                r.amount,
                r.next_billing_date.format("%Y-%m-%d")
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <body>\n\
           <h1>サブスクリプション更新のお知らせ</h1>\n\
           <p>{user_name} さん</p>\n\
           <p>以下のサブスクリプションがまもなく更新されます。</p>\n\
           <table>\n\
             <thead>\n\
               <tr><th>サービス</th><th>金額</th><th>更新日</th></tr>\n\
             </thead>\n\
             <tbody>\n{rows}    </tbody>\n\
           </table>\n\
           <p>サービスを中断しないよう、お支払い方法が最新であることをご確認ください。</p>\n\
         </body>\n\
         </html>\n"
    )
}
