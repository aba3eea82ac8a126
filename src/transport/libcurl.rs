//! libcurl によるトランスポート実装

use super::{PerformError, TransferOption, Transport, TransportCode, TransportHandle};
use curl::easy::{Easy, HttpVersion};

/// libcurl 全体（`curl_global_init` / `curl_global_cleanup`）
///
/// libcurl は内部でも初期化回数を数えているため、`curl` クレート側の
/// 一度きりの初期化と併用しても後始末が早まることはない。
#[derive(Debug, Default, Clone, Copy)]
pub struct CurlTransport;

impl Transport for CurlTransport {
    type Handle = CurlHandle;

    fn global_init(&self) -> Result<(), TransportCode> {
        // SAFETY: 呼び出しはガードのMutex内で直列化されている
        let rc = unsafe { curl_sys::curl_global_init(curl_sys::CURL_GLOBAL_ALL) };
        if rc == curl_sys::CURLE_OK {
            Ok(())
        } else {
            Err(from_curl(&curl::Error::new(rc)))
        }
    }

    fn global_cleanup(&self) {
        // SAFETY: global_init と対になる呼び出しのみ（ガードが保証）
        unsafe { curl_sys::curl_global_cleanup() }
    }

    fn create_handle(&self) -> Result<CurlHandle, TransportCode> {
        Ok(CurlHandle { easy: Easy::new() })
    }
}

/// easy ハンドル1本。Drop で `curl_easy_cleanup` される
pub struct CurlHandle {
    easy: Easy,
}

impl TransportHandle for CurlHandle {
    fn reset(&mut self) {
        self.easy.reset();
    }

    fn set_option(&mut self, option: TransferOption<'_>) -> Result<(), TransportCode> {
        let easy = &mut self.easy;
        let result = match option {
            TransferOption::Cookie(cookie) => easy.cookie(cookie),
            TransferOption::HttpVersion10 => easy.http_version(HttpVersion::V10),
            TransferOption::Timeout(timeout) => easy.timeout(timeout),
            TransferOption::LowSpeedLimit(limit) => easy.low_speed_limit(limit),
            TransferOption::LowSpeedTime(time) => easy.low_speed_time(time),
            TransferOption::Url(url) => easy.url(url),
            TransferOption::Post => easy.post(true),
            TransferOption::PostFields(body) => easy.post_fields_copy(body),
        };
        result.map_err(|e| from_curl(&e))
    }

    fn perform(&mut self, sink: &mut dyn FnMut(&[u8]) -> usize) -> Result<(), PerformError> {
        let mut transfer = self.easy.transfer();
        transfer
            .write_function(|chunk| Ok(sink(chunk)))
            .map_err(|e| PerformError::WriteCallback(from_curl(&e)))?;
        transfer
            .perform()
            .map_err(|e| PerformError::Transfer(from_curl(&e)))
    }
}

fn from_curl(err: &curl::Error) -> TransportCode {
    let description = match err.extra_description() {
        Some(extra) => format!("{}: {}", err.description(), extra),
        None => err.description().to_string(),
    };
    // CURLcode の幅はプラットフォームで異なる（c_uint / c_int）
    #[allow(clippy::unnecessary_cast)]
    let code = TransportCode::new(err.code() as u32, description);
    if err.is_operation_timedout() {
        code.with_timeout()
    } else {
        code
    }
}
