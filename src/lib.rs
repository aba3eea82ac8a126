//! 試験管理サービス向けの同期HTTPクライアント
//!
//! セッションcookie付きのPOSTをロール別のエンドポイントへ送り、
//! レスポンスの生バイト列を受け取る。
//!
//! - [`RequestClient`]: 1本の転送ハンドルを所有し、1回ずつブロッキング送信
//! - [`TransportGuard`]: 生存クライアント数を数え、トランスポートの
//!   グローバル初期化/後始末を 0→1 / 1→0 の遷移でのみ行う
//! - [`Response`]: 書き込みコールバックで受け取ったバイト列

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod guard;
pub mod lazy_init;
pub mod response;
pub mod transport;

pub use client::{build_url, RequestClient};
pub use config::ClientConfig;
pub use error::{ClientError, ErrorCode, Stage};
pub use guard::{Registration, TransportGuard};
pub use response::{BufferPolicy, Response};
pub use transport::{CurlTransport, TransportCode};
