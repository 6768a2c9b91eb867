//! Request message targets: where a finished body is committed.

use crate::error::InternalError;
use std::future::Future;

///
/// RequestMessage
///
/// A header set plus exactly one body commit. The body is rendered in full
/// before it is committed, so a failed write never reaches the message.
///

pub trait RequestMessage: Send {
    fn set_header(&mut self, name: &str, value: &str);

    fn commit_body(&mut self, body: Vec<u8>) -> impl Future<Output = Result<(), InternalError>> + Send;
}

///
/// RequestBody
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestBody {
    pub headers: Vec<(String, String)>,
    pub content: Vec<u8>,
}

impl RequestBody {
    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The content as UTF-8 text.
    pub fn text(&self) -> Result<&str, InternalError> {
        std::str::from_utf8(&self.content)
            .map_err(|err| InternalError::message_unsupported(format!("body is not utf-8: {err}")))
    }
}

///
/// ODataRequestMessage
///
/// Standalone, in-memory message. Yields its [`RequestBody`] once the body
/// has been committed.
///

#[derive(Debug, Default)]
pub struct ODataRequestMessage {
    headers: Vec<(String, String)>,
    content: Option<Vec<u8>>,
}

impl ODataRequestMessage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.content.is_some()
    }

    /// Consume the message. Fails if no body was committed.
    pub fn into_body(self) -> Result<RequestBody, InternalError> {
        let content = self
            .content
            .ok_or_else(|| InternalError::message_invariant("request body was never committed"))?;

        Ok(RequestBody {
            headers: self.headers,
            content,
        })
    }
}

impl RequestMessage for ODataRequestMessage {
    fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    async fn commit_body(&mut self, body: Vec<u8>) -> Result<(), InternalError> {
        if self.content.is_some() {
            return Err(InternalError::message_invariant("request body was already committed"));
        }
        self.content = Some(body);

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorClass, ErrorOrigin};

    #[tokio::test]
    async fn body_commits_once() {
        let mut message = ODataRequestMessage::new();
        message.set_header("Content-Type", "application/json");
        message.set_header("content-type", "application/xml");

        message.commit_body(b"{}".to_vec()).await.unwrap();
        let err = message.commit_body(b"{}".to_vec()).await.unwrap_err();
        assert_eq!(err.class, ErrorClass::InvariantViolation);
        assert_eq!(err.origin, ErrorOrigin::Message);

        let body = message.into_body().unwrap();
        assert_eq!(body.headers.len(), 1);
        assert_eq!(body.header("CONTENT-TYPE"), Some("application/xml"));
        assert_eq!(body.text().unwrap(), "{}");
    }

    #[test]
    fn uncommitted_message_has_no_body() {
        assert!(ODataRequestMessage::new().into_body().is_err());
    }

    #[test]
    fn non_utf8_content_is_reported() {
        let body = RequestBody {
            headers: Vec::new(),
            content: vec![0xff, 0xfe],
        };

        assert!(body.text().unwrap_err().is_unsupported());
    }
}
