use crate::models::{
    parse_calendar_date, BillingCycle, CreateSubscriptionDto, Subscription, UpdateSubscriptionDto,
};
use crate::services::billing_engine;
use crate::shared::errors::{AppError, AppResult};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

/// SELECT句の共通カラムリスト
const SUBSCRIPTION_COLUMNS: &str = "id, user_id, name, amount, currency, billing_cycle, category, \
     start_date, next_billing_date, is_active, reminder_preference, created_at, updated_at";

/// 行をSubscriptionにマッピングする
fn row_to_subscription(row: &Row) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        amount: row.get(3)?,
        currency: row.get(4)?,
        billing_cycle: row.get(5)?,
        category: row.get(6)?,
        start_date: row.get(7)?,
        next_billing_date: row.get(8)?,
        is_active: row.get::<_, i64>(9)? != 0,
        reminder_preference: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// 作成用DTOを検証し、請求サイクルと開始日を解析して返す
///
/// # 引数
/// * `dto` - サブスクリプション作成用DTO
///
/// # 戻り値
/// 解析済みの請求サイクルと開始日、または検証失敗時はエラー
fn validate_create(dto: &CreateSubscriptionDto) -> AppResult<(BillingCycle, NaiveDate)> {
    if dto.name.trim().is_empty() {
        return Err(AppError::validation("名前は必須です"));
    }

    if dto.amount < 0.0 {
        return Err(AppError::validation("金額は0以上である必要があります"));
    }

    let cycle: BillingCycle = dto.billing_cycle.parse()?;
    let start = parse_calendar_date(&dto.start_date)?;

    Ok((cycle, start))
}

/// サブスクリプションを作成する
///
/// 次回請求日は開始日から1サイクル後として計算され、キャッシュとして
/// 保存される。作成直後はアクティブ状態になる。
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
/// * `dto` - サブスクリプション作成用DTO
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラー
pub fn create(
    conn: &Connection,
    user_id: &str,
    dto: CreateSubscriptionDto,
) -> AppResult<Subscription> {
    let (cycle, start) = validate_create(&dto)?;

    let next = billing_engine::next_billing_date(start, cycle).format("%Y-%m-%d").to_string();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO subscriptions (user_id, name, amount, currency, billing_cycle, category, \
         start_date, next_billing_date, is_active, reminder_preference, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10, ?11)",
        params![
            user_id,
            dto.name.trim(),
            dto.amount,
            dto.currency,
            cycle.as_str(),
            dto.category,
            dto.start_date,
            next,
            dto.reminder_preference,
            now,
            now
        ],
    )?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, user_id, id)
}

/// IDでサブスクリプションを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
/// * `id` - サブスクリプションID
///
/// # 戻り値
/// サブスクリプション、または失敗時はエラー
pub fn find_by_id(conn: &Connection, user_id: &str, id: i64) -> AppResult<Subscription> {
    conn.query_row(
        &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1 AND id = ?2"),
        params![user_id, id],
        row_to_subscription,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            AppError::NotFound(format!("ID {id} のサブスクリプションが見つかりません"))
        }
        _ => AppError::Database(e.to_string()),
    })
}

/// ユーザーのサブスクリプション一覧を取得する
///
/// 集計エンジンはこの一覧をスナップショットとして受け取る。
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
///
/// # 戻り値
/// 名前順のサブスクリプションのリスト、または失敗時はエラー
pub fn find_all(conn: &Connection, user_id: &str) -> AppResult<Vec<Subscription>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1 ORDER BY name, id"
    ))?;

    let subscriptions = stmt.query_map(params![user_id], row_to_subscription)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// サブスクリプションを更新する
///
/// フィールドの編集のみを行い、次回請求日は再計算しない（再計算されるのは
/// 再開操作のみ）。
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
/// * `id` - サブスクリプションID
/// * `dto` - サブスクリプション更新用DTO
///
/// # 戻り値
/// 更新されたサブスクリプション、または失敗時はエラー
pub fn update(
    conn: &Connection,
    user_id: &str,
    id: i64,
    dto: UpdateSubscriptionDto,
) -> AppResult<Subscription> {
    // 更新後の値を先に検証
    if let Some(ref name) = dto.name {
        if name.trim().is_empty() {
            return Err(AppError::validation("名前は必須です"));
        }
    }
    if let Some(amount) = dto.amount {
        if amount < 0.0 {
            return Err(AppError::validation("金額は0以上である必要があります"));
        }
    }
    if let Some(ref billing_cycle) = dto.billing_cycle {
        billing_cycle.parse::<BillingCycle>()?;
    }

    let now = Utc::now().to_rfc3339();

    // 既存のサブスクリプションを取得
    let existing = find_by_id(conn, user_id, id)?;

    // 更新するフィールドを決定
    let name = dto.name.unwrap_or(existing.name);
    let amount = dto.amount.unwrap_or(existing.amount);
    let currency = dto.currency.unwrap_or(existing.currency);
    let billing_cycle = dto.billing_cycle.unwrap_or(existing.billing_cycle);
    let category = dto.category.unwrap_or(existing.category);
    let reminder_preference = dto.reminder_preference.unwrap_or(existing.reminder_preference);

    conn.execute(
        "UPDATE subscriptions
         SET name = ?1, amount = ?2, currency = ?3, billing_cycle = ?4, category = ?5, \
             reminder_preference = ?6, updated_at = ?7
         WHERE user_id = ?8 AND id = ?9",
        params![
            name.trim(),
            amount,
            currency,
            billing_cycle,
            category,
            reminder_preference,
            now,
            user_id,
            id
        ],
    )?;

    find_by_id(conn, user_id, id)
}

/// サブスクリプションを一時停止する
///
/// 次回請求日は保持される。期限切れのまま停止しても自動的な繰り越しは
/// 行われない。
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
/// * `id` - サブスクリプションID
///
/// # 戻り値
/// 更新されたサブスクリプション、または失敗時はエラー
pub fn pause(conn: &Connection, user_id: &str, id: i64) -> AppResult<Subscription> {
    let now = Utc::now().to_rfc3339();

    let rows_affected = conn.execute(
        "UPDATE subscriptions SET is_active = 0, updated_at = ?1 WHERE user_id = ?2 AND id = ?3",
        params![now, user_id, id],
    )?;

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "ID {id} のサブスクリプションが見つかりません"
        )));
    }

    find_by_id(conn, user_id, id)
}

/// サブスクリプションを再開する
///
/// 次回請求日は元の開始日ではなく「今日」を起点に1サイクル後として
/// 再計算される。つまり再開によってサイクルの位相はリセットされる。
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
/// * `id` - サブスクリプションID
/// * `today` - 基準日
///
/// # 戻り値
/// 更新されたサブスクリプション、または失敗時はエラー
pub fn resume(
    conn: &Connection,
    user_id: &str,
    id: i64,
    today: NaiveDate,
) -> AppResult<Subscription> {
    let existing = find_by_id(conn, user_id, id)?;
    let cycle = existing.cycle()?;

    let next = billing_engine::next_billing_date(today, cycle).format("%Y-%m-%d").to_string();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "UPDATE subscriptions SET is_active = 1, next_billing_date = ?1, updated_at = ?2 \
         WHERE user_id = ?3 AND id = ?4",
        params![next, now, user_id, id],
    )?;

    find_by_id(conn, user_id, id)
}

/// サブスクリプションを削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
/// * `id` - サブスクリプションID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete(conn: &Connection, user_id: &str, id: i64) -> AppResult<()> {
    let rows_affected = conn.execute(
        "DELETE FROM subscriptions WHERE user_id = ?1 AND id = ?2",
        params![user_id, id],
    )?;

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "ID {id} のサブスクリプションが見つかりません"
        )));
    }

    Ok(())
}

/// サブスクリプションを持つすべてのユーザーIDを取得する
///
/// リマインダーの定期スキャンが対象ユーザーを列挙するために使用する。
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// ユーザーIDのリスト（昇順）、または失敗時はエラー
pub fn list_user_ids(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT user_id FROM subscriptions ORDER BY user_id")?;

    let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;

    ids.collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;

    fn create_dto(name: &str, cycle: &str, start_date: &str) -> CreateSubscriptionDto {
        CreateSubscriptionDto {
            name: name.to_string(),
            amount: 9.99,
            currency: "USD".to_string(),
            billing_cycle: cycle.to_string(),
            category: "動画".to_string(),
            start_date: start_date.to_string(),
            reminder_preference: "email".to_string(),
        }
    }

    #[test]
    fn test_create_computes_next_billing_date() {
        let conn = open_in_memory().unwrap();

        let sub = create(&conn, "user-1", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();

        assert_eq!(sub.name, "Netflix");
        assert!(sub.is_active);
        // 次回請求日は開始日の1サイクル後
        assert_eq!(sub.next_billing_date.as_deref(), Some("2024-02-15"));
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let conn = open_in_memory().unwrap();

        // 空の名前
        let result = create(&conn, "user-1", create_dto("  ", "monthly", "2024-01-15"));
        assert!(matches!(result, Err(AppError::Validation(_))));

        // 負の金額
        let mut dto = create_dto("Netflix", "monthly", "2024-01-15");
        dto.amount = -1.0;
        assert!(matches!(
            create(&conn, "user-1", dto),
            Err(AppError::Validation(_))
        ));

        // 不正なサイクル
        let result = create(&conn, "user-1", create_dto("Netflix", "annual", "2024-01-15"));
        assert!(matches!(result, Err(AppError::InvalidCycle(_))));

        // 不正な日付
        let result = create(&conn, "user-1", create_dto("Netflix", "monthly", "01/15/2024"));
        assert!(matches!(result, Err(AppError::InvalidDate(_))));
    }

    #[test]
    fn test_find_all_is_scoped_to_user() {
        let conn = open_in_memory().unwrap();

        create(&conn, "user-1", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();
        create(&conn, "user-1", create_dto("Spotify", "monthly", "2024-01-15")).unwrap();
        create(&conn, "user-2", create_dto("iCloud", "monthly", "2024-01-15")).unwrap();

        let subs = find_all(&conn, "user-1").unwrap();
        assert_eq!(subs.len(), 2);
        // 名前順で返る
        assert_eq!(subs[0].name, "Netflix");
        assert_eq!(subs[1].name, "Spotify");
    }

    #[test]
    fn test_find_by_id_other_user_is_not_found() {
        let conn = open_in_memory().unwrap();

        let sub = create(&conn, "user-1", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();

        // 別ユーザーのIDでは取得できない
        let result = find_by_id(&conn, "user-2", sub.id);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_update_does_not_recompute_next_billing_date() {
        let conn = open_in_memory().unwrap();

        let sub = create(&conn, "user-1", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();

        let updated = update(
            &conn,
            "user-1",
            sub.id,
            UpdateSubscriptionDto {
                amount: Some(19.99),
                billing_cycle: Some("yearly".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.amount, 19.99);
        assert_eq!(updated.billing_cycle, "yearly");
        // 編集では次回請求日は変わらない
        assert_eq!(updated.next_billing_date.as_deref(), Some("2024-02-15"));
    }

    #[test]
    fn test_update_rejects_invalid_cycle() {
        let conn = open_in_memory().unwrap();

        let sub = create(&conn, "user-1", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();

        let result = update(
            &conn,
            "user-1",
            sub.id,
            UpdateSubscriptionDto {
                billing_cycle: Some("biweekly".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AppError::InvalidCycle(_))));
    }

    #[test]
    fn test_pause_keeps_next_billing_date() {
        let conn = open_in_memory().unwrap();

        let sub = create(&conn, "user-1", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();
        let paused = pause(&conn, "user-1", sub.id).unwrap();

        assert!(!paused.is_active);
        assert_eq!(paused.next_billing_date, sub.next_billing_date);
    }

    #[test]
    fn test_resume_recomputes_from_today() {
        let conn = open_in_memory().unwrap();

        let sub = create(&conn, "user-1", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();
        pause(&conn, "user-1", sub.id).unwrap();

        // 再開時は「今日」を起点にサイクルの位相がリセットされる
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let resumed = resume(&conn, "user-1", sub.id, today).unwrap();

        assert!(resumed.is_active);
        assert_eq!(resumed.next_billing_date.as_deref(), Some("2024-04-10"));
    }

    #[test]
    fn test_delete_removes_record() {
        let conn = open_in_memory().unwrap();

        let sub = create(&conn, "user-1", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();
        delete(&conn, "user-1", sub.id).unwrap();

        assert!(matches!(
            find_by_id(&conn, "user-1", sub.id),
            Err(AppError::NotFound(_))
        ));

        // 既に削除済みのIDは見つからない
        assert!(matches!(
            delete(&conn, "user-1", sub.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_user_ids() {
        let conn = open_in_memory().unwrap();

        create(&conn, "user-b", create_dto("Netflix", "monthly", "2024-01-15")).unwrap();
        create(&conn, "user-a", create_dto("Spotify", "monthly", "2024-01-15")).unwrap();
        create(&conn, "user-a", create_dto("iCloud", "monthly", "2024-01-15")).unwrap();

        let ids = list_user_ids(&conn).unwrap();
        assert_eq!(ids, vec!["user-a".to_string(), "user-b".to_string()]);
    }
}
