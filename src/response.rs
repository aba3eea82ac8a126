//! レスポンスバッファ
//!
//! 転送中に書き込みコールバックから受け取ったバイト列をそのまま連結する。
//! 内容の解釈（JSON等）は行わない。

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// 送信ごとのバッファの扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferPolicy {
    /// 転送前に毎回クリアする（レスポンスNは前回に依存しない）
    #[default]
    Clear,
    /// クリアせず連結し続ける
    Accumulate,
}

/// 受信した生バイト列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// チャンクを末尾に追加し、消費したバイト数を返す
    pub fn append(&mut self, chunk: &[u8]) -> usize {
        self.body.extend_from_slice(chunk);
        chunk.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    /// UTF-8として読む（不正なバイトは置換）
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub(crate) fn clear(&mut self) {
        self.body.clear();
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.body.truncate(len);
    }
}

impl AsRef<[u8]> for Response {
    fn as_ref(&self) -> &[u8] {
        &self.body
    }
}
