//! テスト用のスクリプト化トランスポート
//!
//! グローバル初期化の状態を追跡し、次の違反を数える:
//! - 初期化済みなのに再初期化
//! - 未初期化でのハンドル生成・転送
//! - ハンドルが残っている状態での後始末

use super::{PerformError, TransferOption, Transport, TransportCode, TransportHandle};
use crate::error::Stage;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 記録用に所有権を持たせたオプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOption {
    Cookie(String),
    HttpVersion10,
    Timeout(Duration),
    LowSpeedLimit(u32),
    LowSpeedTime(Duration),
    Url(String),
    Post,
    PostFields(Vec<u8>),
}

impl From<TransferOption<'_>> for RecordedOption {
    fn from(option: TransferOption<'_>) -> Self {
        match option {
            TransferOption::Cookie(c) => RecordedOption::Cookie(c.to_string()),
            TransferOption::HttpVersion10 => RecordedOption::HttpVersion10,
            TransferOption::Timeout(t) => RecordedOption::Timeout(t),
            TransferOption::LowSpeedLimit(l) => RecordedOption::LowSpeedLimit(l),
            TransferOption::LowSpeedTime(t) => RecordedOption::LowSpeedTime(t),
            TransferOption::Url(u) => RecordedOption::Url(u.to_string()),
            TransferOption::Post => RecordedOption::Post,
            TransferOption::PostFields(b) => RecordedOption::PostFields(b.to_vec()),
        }
    }
}

/// 1回の perform で返す結果
#[derive(Debug, Clone)]
pub enum Reply {
    Chunks(Vec<Vec<u8>>),
    /// チャンクを渡した後に失敗する
    Fail(Vec<Vec<u8>>, TransportCode),
}

impl Reply {
    pub fn chunks(chunks: &[&str]) -> Self {
        Reply::Chunks(chunks.iter().map(|c| c.as_bytes().to_vec()).collect())
    }
}

#[derive(Default)]
struct MockState {
    initialized: AtomicBool,
    init_calls: AtomicUsize,
    cleanup_calls: AtomicUsize,
    live_handles: AtomicUsize,
    violations: AtomicUsize,
    fail_init: AtomicBool,
    fail_create: AtomicBool,
    fail_option: Mutex<Option<Stage>>,
    replies: Mutex<VecDeque<Reply>>,
    /// perform ごとに、その時点で設定されていたオプション
    performed: Mutex<Vec<Vec<RecordedOption>>>,
}

impl MockState {
    fn violation(&self) {
        self.violations.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_global_init(&self, fail: bool) {
        self.state.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create_handle(&self, fail: bool) {
        self.state.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_option(&self, stage: Option<Stage>) {
        *self.state.fail_option.lock() = stage;
    }

    pub fn push_reply(&self, reply: Reply) {
        self.state.replies.lock().push_back(reply);
    }

    pub fn init_calls(&self) -> usize {
        self.state.init_calls.load(Ordering::SeqCst)
    }

    pub fn cleanup_calls(&self) -> usize {
        self.state.cleanup_calls.load(Ordering::SeqCst)
    }

    pub fn violations(&self) -> usize {
        self.state.violations.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized.load(Ordering::SeqCst)
    }

    pub fn live_handles(&self) -> usize {
        self.state.live_handles.load(Ordering::SeqCst)
    }

    pub fn performed(&self) -> Vec<Vec<RecordedOption>> {
        self.state.performed.lock().clone()
    }
}

impl Transport for MockTransport {
    type Handle = MockHandle;

    fn global_init(&self) -> Result<(), TransportCode> {
        if self.state.fail_init.load(Ordering::SeqCst) {
            return Err(TransportCode::new(2, "Failed initialization"));
        }
        if self.state.initialized.swap(true, Ordering::SeqCst) {
            self.state.violation();
        }
        self.state.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn global_cleanup(&self) {
        if !self.state.initialized.swap(false, Ordering::SeqCst)
            || self.state.live_handles.load(Ordering::SeqCst) != 0
        {
            self.state.violation();
        }
        self.state.cleanup_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn create_handle(&self) -> Result<MockHandle, TransportCode> {
        if !self.is_initialized() {
            self.state.violation();
        }
        if self.state.fail_create.load(Ordering::SeqCst) {
            return Err(TransportCode::new(27, "Out of memory"));
        }
        self.state.live_handles.fetch_add(1, Ordering::SeqCst);
        Ok(MockHandle {
            state: Arc::clone(&self.state),
            options: Vec::new(),
        })
    }
}

pub struct MockHandle {
    state: Arc<MockState>,
    options: Vec<RecordedOption>,
}

impl TransportHandle for MockHandle {
    fn reset(&mut self) {
        self.options.clear();
    }

    fn set_option(&mut self, option: TransferOption<'_>) -> Result<(), TransportCode> {
        if *self.state.fail_option.lock() == Some(option.stage()) {
            return Err(TransportCode::new(48, "An unknown option was passed in to libcurl"));
        }
        self.options.push(option.into());
        Ok(())
    }

    fn perform(&mut self, sink: &mut dyn FnMut(&[u8]) -> usize) -> Result<(), PerformError> {
        if !self.state.initialized.load(Ordering::SeqCst) {
            self.state.violation();
        }
        if *self.state.fail_option.lock() == Some(Stage::WriteCallback) {
            return Err(PerformError::WriteCallback(TransportCode::new(
                48,
                "An unknown option was passed in to libcurl",
            )));
        }
        self.state.performed.lock().push(self.options.clone());

        let reply = self
            .state
            .replies
            .lock()
            .pop_front()
            .unwrap_or(Reply::Chunks(Vec::new()));
        let (chunks, failure) = match reply {
            Reply::Chunks(chunks) => (chunks, None),
            Reply::Fail(chunks, code) => (chunks, Some(code)),
        };

        for chunk in chunks {
            if sink(&chunk) != chunk.len() {
                return Err(PerformError::Transfer(TransportCode::new(
                    23,
                    "Failed writing received data to disk/application",
                )));
            }
        }
        match failure {
            Some(code) => Err(PerformError::Transfer(code)),
            None => Ok(()),
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if !self.state.initialized.load(Ordering::SeqCst) {
            // 後始末より先に破棄されていなければならない
            self.state.violation();
        }
        self.state.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
