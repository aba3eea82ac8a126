//! Lazy初期化サポート
//!
//! libcurl用のガードは初回使用時にのみ作成され、プロセス終了まで残る。
//! グローバル初期化そのものはクライアント登録時（0→1）に行われる。

use crate::guard::TransportGuard;
use crate::transport::CurlTransport;
use once_cell::sync::Lazy;
use std::sync::Arc;

static CURL_GUARD: Lazy<Arc<TransportGuard<CurlTransport>>> =
    Lazy::new(|| Arc::new(TransportGuard::new(CurlTransport)));

/// プロセス全体で共有されるlibcurlのガード
pub fn curl_guard() -> &'static Arc<TransportGuard<CurlTransport>> {
    &CURL_GUARD
}
