//! リクエストクライアント
//!
//! セッションcookie付きのPOSTをロール別のエンドポイントへ送り、
//! レスポンスの生バイト列を受け取る。
//!
//! - 1インスタンスにつき転送ハンドルは1本（生存期間中ずっと有効）
//! - `send` は転送が終わるまで呼び出しスレッドをブロックする
//! - 同じインスタンスで同時に送信はできない（`&mut self`）
//!
//! ```no_run
//! use exam_request::RequestClient;
//!
//! let mut client = RequestClient::with_target("https://exam.example.com/openexam")?;
//! client.set_session("0123456789abcdef");
//! client.set_role("student");
//!
//! let response = client.send("core/ajax/student/exam/read", "{}")?;
//! println!("{}", response.text());
//! # Ok::<(), exam_request::ClientError>(())
//! ```

use crate::config::ClientConfig;
use crate::constants::session;
use crate::error::{ClientError, Stage};
use crate::guard::{Registration, TransportGuard};
use crate::lazy_init;
use crate::response::{BufferPolicy, Response};
use crate::transport::{
    CurlTransport, PerformError, TransferOption, Transport, TransportHandle,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 送信先URLを組み立てる（`target/role/uri`、正規化やエスケープはしない）
pub fn build_url(target: &str, role: &str, uri: &str) -> String {
    let mut url = String::with_capacity(target.len() + role.len() + uri.len() + 2);
    url.push_str(target);
    url.push('/');
    url.push_str(role);
    url.push('/');
    url.push_str(uri);
    url
}

pub struct RequestClient<T: Transport = CurlTransport> {
    // フィールドの宣言順 = Drop順。ハンドルを先に破棄してから登録を解除する
    handle: T::Handle,
    registration: Registration<T>,
    response: Response,

    target: String,
    session: String,
    role: String,
    timeout: Duration,
    low_speed_limit: u32,
    low_speed_time: Duration,
    buffer_policy: BufferPolicy,
}

impl RequestClient<CurlTransport> {
    /// デフォルトのターゲットで作成
    pub fn new() -> Result<Self, ClientError> {
        Self::from_config(&ClientConfig::default())
    }

    pub fn with_target<S: Into<String>>(target: S) -> Result<Self, ClientError> {
        Self::from_config(&ClientConfig::with_target(target))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(lazy_init::curl_guard(), config)
    }

    /// プロセス全体でクライアントが1つ以上生存しているか
    pub fn has_clients() -> Result<bool, ClientError> {
        lazy_init::curl_guard().has_clients()
    }

    /// プロセス全体で生存しているクライアント数
    pub fn client_count() -> Result<usize, ClientError> {
        lazy_init::curl_guard().client_count()
    }
}

impl<T: Transport> RequestClient<T> {
    /// 任意のトランスポートのガードに登録して作成
    ///
    /// 登録に失敗した場合はクライアントは作られず、カウンタも変化しない。
    pub fn with_transport(
        guard: &Arc<TransportGuard<T>>,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        let (handle, registration) = guard.register()?;

        Ok(Self {
            handle,
            registration,
            response: Response::new(),
            target: config.target.clone(),
            session: config.session.clone(),
            role: config.role.clone(),
            timeout: config.timeout_duration(),
            low_speed_limit: config.low_speed_limit,
            low_speed_time: config.low_speed_time_duration(),
            buffer_policy: config.buffer_policy,
        })
    }

    pub fn guard(&self) -> &Arc<TransportGuard<T>> {
        self.registration.guard()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_target<S: Into<String>>(&mut self, target: S) {
        self.target = target.into();
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn set_session<S: Into<String>>(&mut self, session: S) {
        self.session = session.into();
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn set_role<S: Into<String>>(&mut self, role: S) {
        self.role = role.into();
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn low_speed_limit(&self) -> u32 {
        self.low_speed_limit
    }

    pub fn set_low_speed_limit(&mut self, limit: u32) {
        self.low_speed_limit = limit;
    }

    pub fn low_speed_time(&self) -> Duration {
        self.low_speed_time
    }

    pub fn set_low_speed_time(&mut self, time: Duration) {
        self.low_speed_time = time;
    }

    pub fn buffer_policy(&self) -> BufferPolicy {
        self.buffer_policy
    }

    pub fn set_buffer_policy(&mut self, policy: BufferPolicy) {
        self.buffer_policy = policy;
    }

    /// 最後に成功した送信のレスポンス
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// `send_as(uri, role, ..)` が使うURL
    pub fn url_for(&self, role: &str, uri: &str) -> String {
        build_url(&self.target, role, uri)
    }

    /// デフォルトのロールで送信
    pub fn send<P: AsRef<[u8]>>(
        &mut self,
        uri: &str,
        payload: P,
    ) -> Result<&Response, ClientError> {
        let role = self.role.clone();
        self.send_as(uri, &role, payload)
    }

    /// ロールを指定して送信（保存されたデフォルトのロールは変更しない）
    pub fn send_as<P: AsRef<[u8]>>(
        &mut self,
        uri: &str,
        role: &str,
        payload: P,
    ) -> Result<&Response, ClientError> {
        let url = self.url_for(role, uri);
        let payload = payload.as_ref();
        debug!(url = %url, payload_len = payload.len(), "sending request");

        self.configure(&url, payload)?;

        if self.buffer_policy == BufferPolicy::Clear {
            self.response.clear();
        }
        let mark = self.response.len();

        // perform は同期なので、戻った時点でレスポンスは確定している
        let response = &mut self.response;
        let result = self
            .handle
            .perform(&mut |chunk: &[u8]| response.append(chunk));

        match result {
            Ok(()) => {
                debug!(
                    url = %url,
                    response_len = self.response.len() - mark,
                    "request completed"
                );
                Ok(&self.response)
            }
            Err(err) => {
                // 失敗した転送の部分的なバイト列は残さない
                self.response.truncate(mark);
                let err = match err {
                    PerformError::WriteCallback(code) => ClientError::Configuration {
                        stage: Stage::WriteCallback,
                        code,
                    },
                    PerformError::Transfer(code) => ClientError::Request {
                        stage: Stage::Perform,
                        code,
                    },
                };
                warn!(url = %url, "request failed: {err}");
                Err(err)
            }
        }
    }

    /// 前回の設定を破棄し、今回のリクエストのオプションを設定する
    fn configure(&mut self, url: &str, payload: &[u8]) -> Result<(), ClientError> {
        self.handle.reset();

        let cookie = format!("{}={}", session::COOKIE_NAME, self.session);
        let options = [
            TransferOption::Cookie(&cookie),
            TransferOption::HttpVersion10,
            TransferOption::Timeout(self.timeout),
            TransferOption::LowSpeedLimit(self.low_speed_limit),
            TransferOption::LowSpeedTime(self.low_speed_time),
            TransferOption::Url(url),
            TransferOption::Post,
            TransferOption::PostFields(payload),
        ];

        for option in options {
            self.handle
                .set_option(option)
                .map_err(|code| ClientError::Configuration {
                    stage: option.stage(),
                    code,
                })?;
        }
        Ok(())
    }
}
