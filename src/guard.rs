//! トランスポートのグローバル初期化ガード
//!
//! 生存中のクライアント数を数え、0→1 でグローバル初期化、1→0 で
//! グローバル後始末を行う。カウンタの確認から初期化・更新までは
//! 1つのMutexを保持したまま実行する。
//!
//! ロック取得は `lock_timeout` までしか待たない。取得できなければ
//! [`ClientError::Lock`] になり、カウンタには触れない。

use crate::constants::defaults;
use crate::error::{ClientError, Stage};
use crate::transport::Transport;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Mutexで保護される状態
#[derive(Debug, Default)]
pub struct GuardState {
    clients: usize,
}

impl GuardState {
    pub fn clients(&self) -> usize {
        self.clients
    }
}

pub struct TransportGuard<T: Transport> {
    transport: T,
    state: Mutex<GuardState>,
    lock_timeout: Duration,
    /// Drop 経路で返せなかったエラー
    last_error: Mutex<Option<ClientError>>,
}

impl<T: Transport> TransportGuard<T> {
    pub fn new(transport: T) -> Self {
        Self::with_lock_timeout(transport, defaults::LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(transport: T, lock_timeout: Duration) -> Self {
        Self {
            transport,
            state: Mutex::new(GuardState::default()),
            lock_timeout,
            last_error: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 共有状態のロックを取得（スコープを抜けると解放）
    pub fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, GuardState>, ClientError> {
        self.state
            .try_lock_for(self.lock_timeout)
            .ok_or(ClientError::Lock { operation })
    }

    /// クライアントを1つ登録し、専用のハンドルを作る
    ///
    /// 失敗した場合カウンタは変化しない。この呼び出しでグローバル初期化を
    /// 行っていれば後始末も済ませてから返す。
    pub fn register(self: &Arc<Self>) -> Result<(T::Handle, Registration<T>), ClientError> {
        let mut state = self.lock("register")?;

        let first = state.clients == 0;
        if first {
            self.transport
                .global_init()
                .map_err(|code| ClientError::Initialization {
                    stage: Stage::GlobalInit,
                    code,
                })?;
            debug!("transport globally initialized");
        }

        // カウンタを正しく保つため、ハンドル生成もロック内で行う
        let handle = match self.transport.create_handle() {
            Ok(handle) => handle,
            Err(code) => {
                if first {
                    self.transport.global_cleanup();
                    debug!("transport globally cleaned up after failed handle creation");
                }
                return Err(ClientError::Initialization {
                    stage: Stage::CreateHandle,
                    code,
                });
            }
        };

        state.clients += 1;
        debug!(clients = state.clients, "client registered");

        Ok((
            handle,
            Registration {
                guard: Arc::clone(self),
            },
        ))
    }

    /// 登録を1つ解除し、最後の1つならグローバル後始末を行う
    ///
    /// ロックを取れなければカウンタは減らない。その1件分は以後戻らず、
    /// このガードではグローバル後始末が二度と行われない。
    fn release(&self) -> Result<(), ClientError> {
        let mut state = self.lock("release")?;

        state.clients -= 1;
        debug!(clients = state.clients, "client released");

        if state.clients == 0 {
            self.transport.global_cleanup();
            debug!("transport globally cleaned up");
        }
        Ok(())
    }

    pub fn has_clients(&self) -> Result<bool, ClientError> {
        Ok(self.lock("has_clients")?.clients != 0)
    }

    pub fn client_count(&self) -> Result<usize, ClientError> {
        Ok(self.lock("client_count")?.clients)
    }

    /// Drop 経路で記録されたエラーを取り出す（取り出すと空になる）
    pub fn take_last_error(&self) -> Option<ClientError> {
        self.last_error.lock().take()
    }

    fn record(&self, err: ClientError) {
        *self.last_error.lock() = Some(err);
    }
}

impl<T: Transport + fmt::Debug> fmt::Debug for TransportGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportGuard")
            .field("transport", &self.transport)
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

/// 登録トークン。Drop で登録を解除する
///
/// Drop 時にロックを取れなかった場合は [`TransportGuard::take_last_error`]
/// に記録されるだけで、カウンタには1件分が残り続ける。
pub struct Registration<T: Transport> {
    guard: Arc<TransportGuard<T>>,
}

impl<T: Transport> Registration<T> {
    pub fn guard(&self) -> &Arc<TransportGuard<T>> {
        &self.guard
    }
}

impl<T: Transport> Drop for Registration<T> {
    fn drop(&mut self) {
        if let Err(err) = self.guard.release() {
            // Drop からは返せないので記録して続行
            error!("failed to release transport client: {err}");
            self.guard.record(err);
        }
    }
}
