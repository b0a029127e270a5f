//! Streamed HTTP GET (libcurl) into a file, with status and content-type gating.
//!
//! The gate is evaluated when the first body chunk arrives, so rejected responses never
//! touch the disk. The target file is created lazily on the first accepted chunk.

use crate::candidate::FailureReason;
use crate::config::FetchConfig;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str;
use std::time::Duration;

/// What a successful transfer produced.
#[derive(Debug, Clone)]
pub struct StreamReport {
    pub bytes: u64,
    pub sha256: String,
    pub content_type: Option<String>,
}

/// Failure plus the number of body bytes seen before it.
#[derive(Debug, Clone)]
pub struct StreamFailure {
    pub reason: FailureReason,
    pub bytes: u64,
}

#[derive(Default)]
struct StreamState {
    status: Option<u32>,
    content_type: Option<String>,
    gate_checked: bool,
    rejection: Option<FailureReason>,
    file: Option<File>,
    hasher: Sha256,
    bytes: u64,
}

/// Parses the status code out of a status line such as `HTTP/1.1 404 Not Found`.
pub fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// True when a `Content-Type` value names an image media type.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media| media.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

/// Checks the final response head against the fetch policy.
pub fn check_response_head(
    status: Option<u32>,
    content_type: Option<&str>,
    validate_content_type: bool,
) -> Result<(), FailureReason> {
    let Some(code) = status else {
        return Err(FailureReason::Transport {
            detail: "no HTTP status line in response".to_string(),
            timed_out: false,
        });
    };
    if !(200..300).contains(&code) {
        return Err(FailureReason::HttpStatus { code });
    }
    if validate_content_type && !content_type.is_some_and(is_image_content_type) {
        return Err(FailureReason::WrongContentType {
            content_type: content_type.map(str::to_string),
        });
    }
    Ok(())
}

fn transport(e: &curl::Error) -> FailureReason {
    FailureReason::Transport {
        detail: e.to_string(),
        timed_out: e.is_operation_timedout(),
    }
}

impl StreamState {
    fn on_header(&mut self, line: &str) {
        let line = line.trim_end();
        // A new status line starts a new response head (redirects, 100-continue).
        if let Some(code) = parse_status_line(line) {
            self.status = Some(code);
            self.content_type = None;
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-type") {
                self.content_type = Some(value.trim().to_string());
            }
        }
    }

    /// Returns false to abort the transfer.
    fn on_body(&mut self, data: &[u8], target: &Path, validate_content_type: bool) -> bool {
        if !self.gate_checked {
            self.gate_checked = true;
            if let Err(reason) =
                check_response_head(self.status, self.content_type.as_deref(), validate_content_type)
            {
                self.rejection = Some(reason);
                return false;
            }
        }
        if let Err(e) = self.write(data, target) {
            self.rejection = Some(FailureReason::Storage {
                detail: e.to_string(),
            });
            return false;
        }
        true
    }

    fn write(&mut self, data: &[u8], target: &Path) -> std::io::Result<()> {
        let file = match self.file.take() {
            Some(f) => f,
            None => File::create(target)?,
        };
        let file = self.file.insert(file);
        file.write_all(data)?;
        self.hasher.update(data);
        self.bytes += data.len() as u64;
        Ok(())
    }
}

/// GETs `url` and streams the body into `target`.
///
/// On failure `target` may exist with partial content; the caller owns cleanup.
pub fn stream_to_file(url: &str, cfg: &FetchConfig, target: &Path) -> Result<StreamReport, StreamFailure> {
    let fail = |reason: FailureReason| StreamFailure { reason, bytes: 0 };
    let state = RefCell::new(StreamState::default());

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(|e| fail(transport(&e)))?;
    easy.follow_location(true).map_err(|e| fail(transport(&e)))?;
    easy.max_redirections(10).map_err(|e| fail(transport(&e)))?;
    easy.connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .map_err(|e| fail(transport(&e)))?;
    easy.timeout(Duration::from_secs(cfg.timeout_secs))
        .map_err(|e| fail(transport(&e)))?;
    easy.useragent(&cfg.user_agent).map_err(|e| fail(transport(&e)))?;

    let mut list = curl::easy::List::new();
    list.append(&format!("Accept: {}", cfg.accept.trim()))
        .map_err(|e| fail(transport(&e)))?;
    easy.http_headers(list).map_err(|e| fail(transport(&e)))?;

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    state.borrow_mut().on_header(line);
                }
                true
            })
            .map_err(|e| fail(transport(&e)))?;
        transfer
            .write_function(|data| {
                let accepted = state
                    .borrow_mut()
                    .on_body(data, target, cfg.validate_content_type);
                // Returning a short count makes libcurl abort with a write error.
                Ok(if accepted { data.len() } else { 0 })
            })
            .map_err(|e| fail(transport(&e)))?;
        transfer.perform()
    };

    let mut state = state.into_inner();
    let bytes = state.bytes;
    if let Err(e) = perform_result {
        let reason = match state.rejection.take() {
            Some(reason) if e.is_write_error() => reason,
            _ => transport(&e),
        };
        return Err(StreamFailure { reason, bytes });
    }

    let status = easy
        .response_code()
        .ok()
        .filter(|code| *code != 0)
        .or(state.status);
    // Empty bodies never reach the write callback, so gate them here.
    check_response_head(status, state.content_type.as_deref(), cfg.validate_content_type)
        .map_err(|reason| StreamFailure { reason, bytes })?;

    let storage_err = |e: std::io::Error| StreamFailure {
        reason: FailureReason::Storage {
            detail: e.to_string(),
        },
        bytes,
    };
    match state.file.take() {
        Some(mut f) => {
            f.flush().map_err(storage_err)?;
            f.sync_all().map_err(storage_err)?;
        }
        None => {
            File::create(target).map_err(storage_err)?;
        }
    }

    Ok(StreamReport {
        bytes,
        sha256: hex::encode(state.hasher.finalize()),
        content_type: state.content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_parsing() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK"), Some(200));
        assert_eq!(parse_status_line("HTTP/2 404"), Some(404));
        assert_eq!(parse_status_line("HTTP/1.1 301 Moved Permanently\r\n".trim_end()), Some(301));
        assert_eq!(parse_status_line("Content-Type: image/png"), None);
        assert_eq!(parse_status_line(""), None);
    }

    #[test]
    fn image_content_types() {
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type("IMAGE/JPEG; charset=binary"));
        assert!(is_image_content_type(" image/webp"));
        assert!(!is_image_content_type("text/html; charset=utf-8"));
        assert!(!is_image_content_type("application/octet-stream"));
        assert!(!is_image_content_type(""));
    }

    #[test]
    fn head_check_status_before_content_type() {
        assert_eq!(
            check_response_head(Some(404), Some("text/html"), true),
            Err(FailureReason::HttpStatus { code: 404 })
        );
        assert_eq!(check_response_head(Some(200), Some("image/png"), true), Ok(()));
    }

    #[test]
    fn head_check_content_type_only_when_strict() {
        assert_eq!(
            check_response_head(Some(200), Some("text/html"), true),
            Err(FailureReason::WrongContentType {
                content_type: Some("text/html".to_string())
            })
        );
        assert_eq!(
            check_response_head(Some(200), None, true),
            Err(FailureReason::WrongContentType { content_type: None })
        );
        assert_eq!(check_response_head(Some(200), Some("text/html"), false), Ok(()));
    }

    #[test]
    fn head_check_requires_http_status() {
        for validate in [true, false] {
            assert!(matches!(
                check_response_head(None, Some("image/png"), validate),
                Err(FailureReason::Transport { timed_out: false, .. })
            ));
        }
    }

    #[test]
    fn body_without_status_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("x.png.part");
        let mut st = StreamState::default();
        assert!(!st.on_body(b"raw bytes", &target, false));
        assert!(!target.exists());
        assert!(matches!(st.rejection, Some(FailureReason::Transport { .. })));
    }

    #[test]
    fn header_lines_reset_on_new_status() {
        let mut st = StreamState::default();
        st.on_header("HTTP/1.1 302 Found\r\n");
        st.on_header("Content-Type: text/html\r\n");
        st.on_header("HTTP/1.1 200 OK\r\n");
        assert_eq!(st.status, Some(200));
        assert!(st.content_type.is_none());
        st.on_header("content-type: image/gif\r\n");
        assert_eq!(st.content_type.as_deref(), Some("image/gif"));
    }

    #[test]
    fn rejected_body_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("x.jpg.part");
        let mut st = StreamState::default();
        st.on_header("HTTP/1.1 200 OK");
        st.on_header("Content-Type: text/html");
        assert!(!st.on_body(b"<html>", &target, true));
        assert!(!target.exists());
        assert!(matches!(st.rejection, Some(FailureReason::WrongContentType { .. })));
    }

    #[test]
    fn accepted_body_is_written_and_hashed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("x.png.part");
        let mut st = StreamState::default();
        st.on_header("HTTP/1.1 200 OK");
        st.on_header("Content-Type: image/png");
        assert!(st.on_body(b"hel", &target, true));
        assert!(st.on_body(b"lo\n", &target, true));
        drop(st.file.take());
        assert_eq!(std::fs::read(&target).unwrap(), b"hello\n");
        assert_eq!(st.bytes, 6);
        assert_eq!(
            hex::encode(st.hasher.finalize()),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }
}
