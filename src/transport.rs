//! トランスポート抽象
//!
//! ネイティブHTTPエンジン（libcurl）が提供する機能を trait で表現する:
//! - グローバル初期化/後始末
//! - ハンドルの生成（破棄は Drop）
//! - オプションのリセットと設定
//! - 同期転送（書き込みコールバック付き）

pub mod libcurl;
#[cfg(test)]
pub(crate) mod mock;

use crate::error::Stage;
use std::fmt;
use std::time::Duration;

pub use self::libcurl::{CurlHandle, CurlTransport};

/// エンジンが返したエラーコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportCode {
    code: u32,
    description: String,
    timed_out: bool,
}

impl TransportCode {
    pub fn new<S: Into<String>>(code: u32, description: S) -> Self {
        Self {
            code,
            description: description.into(),
            timed_out: false,
        }
    }

    /// タイムアウト（低速監視による中断を含む）として扱う
    pub fn with_timeout(mut self) -> Self {
        self.timed_out = true;
        self
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// 全体タイムアウトまたは低速監視で中断されたか
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

impl fmt::Display for TransportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description, self.code)
    }
}

/// リクエストごとに設定するオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOption<'a> {
    Cookie(&'a str),
    /// HTTP/1.0 に固定
    HttpVersion10,
    Timeout(Duration),
    LowSpeedLimit(u32),
    LowSpeedTime(Duration),
    Url(&'a str),
    Post,
    PostFields(&'a [u8]),
}

impl TransferOption<'_> {
    /// 設定に失敗したときに報告する段階
    pub fn stage(&self) -> Stage {
        match self {
            TransferOption::Cookie(_) => Stage::Cookie,
            TransferOption::HttpVersion10 => Stage::HttpVersion,
            TransferOption::Timeout(_) => Stage::Timeout,
            TransferOption::LowSpeedLimit(_) => Stage::LowSpeedLimit,
            TransferOption::LowSpeedTime(_) => Stage::LowSpeedTime,
            TransferOption::Url(_) => Stage::Url,
            TransferOption::Post => Stage::Post,
            TransferOption::PostFields(_) => Stage::PostFields,
        }
    }
}

/// perform の失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformError {
    /// 書き込みコールバックを設定できなかった
    WriteCallback(TransportCode),
    /// 転送そのものが失敗した
    Transfer(TransportCode),
}

/// プロセス全体で共有されるエンジン
pub trait Transport: Send + Sync + 'static {
    type Handle: TransportHandle;

    fn global_init(&self) -> Result<(), TransportCode>;

    /// カウンタが0になったときだけ呼ばれる。失敗は観測しない
    fn global_cleanup(&self);

    fn create_handle(&self) -> Result<Self::Handle, TransportCode>;
}

/// クライアントが排他的に所有する1本の転送ハンドル
pub trait TransportHandle: Send {
    /// 前回のリクエストの設定をすべて破棄
    fn reset(&mut self);

    fn set_option(&mut self, option: TransferOption<'_>) -> Result<(), TransportCode>;

    /// 同期転送。完了または失敗するまで戻らない
    ///
    /// `sink` は受信チャンクごとに0回以上呼ばれ、消費したバイト数を返す。
    /// チャンク長より短い値を返すと転送は中断される。
    fn perform(&mut self, sink: &mut dyn FnMut(&[u8]) -> usize) -> Result<(), PerformError>;
}
