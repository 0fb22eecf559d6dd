use crate::models::Subscription;

/// CSVエクスポートの固定ヘッダー行
const CSV_HEADER: &str = "Name,Amount,Currency,Billing Cycle,Category,Status,Next Billing Date";

/// 文字列フィールドをCSV用に引用符で囲む
///
/// 埋め込みの `"` は `""` にエスケープする。
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// サブスクリプション一覧をCSV文字列に変換する
///
/// ステータス列は既存のスプレッドシート互換性のため `Active` / `Paused` の
/// 2値のみを出力する（期限切れ・更新間近の細分類は使わない）。空の
/// コレクションはヘッダー行のみを返す。
///
/// # 引数
/// * `subscriptions` - エクスポート対象のサブスクリプション
///
/// # 戻り値
/// CSV形式の文字列（呼び出し側がそのままダウンロードに使用する）
pub fn export_to_csv(subscriptions: &[Subscription]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for sub in subscriptions {
        let status = if sub.is_active { "Active" } else { "Paused" };
        let next = sub.next_billing_date.as_deref().unwrap_or("");

        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            quote(&sub.name),
            sub.amount,
            quote(&sub.currency),
            quote(&sub.billing_cycle),
            quote(&sub.category),
            quote(status),
            quote(next),
        ));
    }

    csv
}
