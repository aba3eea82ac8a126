//! エラー処理
//!
//! 呼び出し元に返るエラーはすべて [`ClientError`]。
//! - ロック取得失敗（Lock）
//! - グローバル初期化・ハンドル生成の失敗（Initialization）
//! - オプション設定の失敗（Configuration）
//! - 転送の失敗（Request）
//! - 設定ファイルの失敗（Config）

use crate::transport::TransportCode;
use std::fmt;

/// エラーコード
///
/// Rustコンパイラ風の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // 1xx: ロック
    E0101, // 共有Mutexを取得できない

    // 2xx: 初期化
    E0201, // グローバル初期化の失敗
    E0202, // ハンドル生成の失敗

    // 3xx: オプション設定
    E0301, // オプション設定の失敗
    E0302, // 書き込みコールバック設定の失敗

    // 4xx: 転送
    E0401, // 転送エラー
    E0402, // タイムアウト・低速監視による中断

    // 5xx: 設定ファイル
    E0501,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 失敗した段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    GlobalInit,
    CreateHandle,
    Cookie,
    WriteCallback,
    HttpVersion,
    Timeout,
    LowSpeedLimit,
    LowSpeedTime,
    Url,
    Post,
    PostFields,
    Perform,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::GlobalInit => "initialize transport globally",
            Stage::CreateHandle => "create transport handle",
            Stage::Cookie => "set cookie (session ID) option",
            Stage::WriteCallback => "set write callback",
            Stage::HttpVersion => "set HTTP protocol 1.0 option",
            Stage::Timeout => "set timeout option",
            Stage::LowSpeedLimit => "set low speed limit option",
            Stage::LowSpeedTime => "set low speed time option",
            Stage::Url => "set URL option",
            Stage::Post => "set POST option",
            Stage::PostFields => "set POST fields option",
            Stage::Perform => "perform request",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 共有Mutexをタイムアウト内に取得できなかった
    #[error("failed acquire lock ({operation})")]
    Lock { operation: &'static str },
    #[error("failed {stage}: {code}")]
    Initialization { stage: Stage, code: TransportCode },
    #[error("failed {stage}: {code}")]
    Configuration { stage: Stage, code: TransportCode },
    #[error("failed {stage}: {code}")]
    Request { stage: Stage, code: TransportCode },
    /// 設定ファイルの読み込み・パース失敗
    #[error("config: {0}")]
    Config(String),
}

impl ClientError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Lock { .. } => ErrorCode::E0101,
            ClientError::Initialization {
                stage: Stage::GlobalInit,
                ..
            } => ErrorCode::E0201,
            ClientError::Initialization { .. } => ErrorCode::E0202,
            ClientError::Configuration {
                stage: Stage::WriteCallback,
                ..
            } => ErrorCode::E0302,
            ClientError::Configuration { .. } => ErrorCode::E0301,
            ClientError::Request { code, .. } if code.is_timeout() => ErrorCode::E0402,
            ClientError::Request { .. } => ErrorCode::E0401,
            ClientError::Config(_) => ErrorCode::E0501,
        }
    }

    /// 失敗した段階（ロック・設定ファイルのエラーには無い）
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ClientError::Initialization { stage, .. }
            | ClientError::Configuration { stage, .. }
            | ClientError::Request { stage, .. } => Some(*stage),
            ClientError::Lock { .. } | ClientError::Config(_) => None,
        }
    }

    /// エンジンのエラーコード
    pub fn transport_code(&self) -> Option<&TransportCode> {
        match self {
            ClientError::Initialization { code, .. }
            | ClientError::Configuration { code, .. }
            | ClientError::Request { code, .. } => Some(code),
            ClientError::Lock { .. } | ClientError::Config(_) => None,
        }
    }

    /// タイムアウトまたは低速監視による中断か
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Request { code, .. } if code.is_timeout())
    }

    /// 短い形式（1行）
    pub fn short(&self) -> String {
        format!("error[{}]: {}", self.code(), self)
    }
}
