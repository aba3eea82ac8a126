//! クレート全体で使用される定数
//!
//! デフォルト値とcookie名をまとめて管理します。

/// クライアントのデフォルト値
pub mod defaults {
    use std::time::Duration;

    /// ターゲット未指定時のベースURL
    pub const TARGET: &str = "http://localhost/openexam";

    pub const TIMEOUT_SECS: u64 = 60;
    pub const TIMEOUT: Duration = Duration::from_secs(TIMEOUT_SECS);

    /// 低速監視: この転送速度（bytes/sec）を下回る状態が続くと中断
    pub const LOW_SPEED_LIMIT: u32 = 1;
    pub const LOW_SPEED_TIME_SECS: u64 = 60;
    pub const LOW_SPEED_TIME: Duration = Duration::from_secs(LOW_SPEED_TIME_SECS);

    /// グローバルロック取得の待ち時間上限
    pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
}

/// セッション関連の定数
pub mod session {
    /// サーバー側（PHP）のセッションcookie名
    pub const COOKIE_NAME: &str = "PHPSESSID";
}
