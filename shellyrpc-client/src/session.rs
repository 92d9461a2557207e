//! Per-attempt response interpretation
//!
//! One request may be attempted at most twice: the plain attempt and one
//! re-authenticated retry. The functions here classify a received frame so
//! the manager can decide between delivering it, retrying with fresh
//! credentials, or giving up.

use shellyrpc_core::AUTH_REQUIRED_CODE;

/// Outcome of a single send/receive attempt.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// Deliver this text to the caller.
    Done(String),
    /// Credentials were refreshed, resend the request.
    Retry,
    /// The whole request fails.
    Failed,
}

/// Classification of a received frame.
#[derive(Debug)]
pub(crate) enum Interpretation {
    /// The frame is the final answer for this call, verbatim.
    Deliver(String),
    /// The frame is an authentication challenge; the raw text is kept so the
    /// challenge can be parsed out of it.
    NeedsAuth(String),
    /// An error arrived on the retry attempt; the call is over.
    Rejected,
}

/// Classify an inbound frame.
///
/// Non-JSON frames and error objects without a numeric 401 code are
/// delivered verbatim; the manager only special-cases the
/// authentication-required code, and only on the first attempt.
pub(crate) fn interpret_response(text: String, is_retry: bool) -> Interpretation {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
        return Interpretation::Deliver(text);
    };
    let Some(error) = value.get("error") else {
        return Interpretation::Deliver(text);
    };
    if is_retry {
        return Interpretation::Rejected;
    }
    let Some(code) = error.get("code").and_then(|c| c.as_i64()) else {
        return Interpretation::Deliver(text);
    };
    if code != AUTH_REQUIRED_CODE {
        return Interpretation::Deliver(text);
    }
    Interpretation::NeedsAuth(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_is_delivered() {
        let text = r#"{"id":1,"result":{"apower":12.34}}"#.to_string();
        assert!(matches!(
            interpret_response(text, false),
            Interpretation::Deliver(_)
        ));
    }

    #[test]
    fn test_non_json_is_delivered_verbatim() {
        match interpret_response("plain text".to_string(), false) {
            Interpretation::Deliver(text) => assert_eq!(text, "plain text"),
            other => panic!("unexpected interpretation: {:?}", other),
        }
    }

    #[test]
    fn test_error_without_code_is_delivered() {
        let text = r#"{"error":{"message":"boom"}}"#.to_string();
        assert!(matches!(
            interpret_response(text, false),
            Interpretation::Deliver(_)
        ));
    }

    #[test]
    fn test_non_401_error_is_delivered() {
        let text = r#"{"error":{"code":-103,"message":"bad params"}}"#.to_string();
        assert!(matches!(
            interpret_response(text, false),
            Interpretation::Deliver(_)
        ));
    }

    #[test]
    fn test_401_needs_auth_on_first_attempt() {
        let text = r#"{"error":{"code":401,"message":"{\"realm\":\"r\",\"nonce\":1,\"nc\":1}"}}"#
            .to_string();
        assert!(matches!(
            interpret_response(text, false),
            Interpretation::NeedsAuth(_)
        ));
    }

    #[test]
    fn test_any_error_on_retry_is_rejected() {
        let text = r#"{"error":{"code":401,"message":"{}"}}"#.to_string();
        assert!(matches!(
            interpret_response(text, true),
            Interpretation::Rejected
        ));

        let text = r#"{"error":{"code":-103,"message":"still bad"}}"#.to_string();
        assert!(matches!(
            interpret_response(text, true),
            Interpretation::Rejected
        ));
    }

    #[test]
    fn test_non_numeric_code_is_delivered() {
        let text = r#"{"error":{"code":"401","message":"stringly typed"}}"#.to_string();
        assert!(matches!(
            interpret_response(text, false),
            Interpretation::Deliver(_)
        ));
    }
}
