//! Opaque cursor and pagination envelope primitives shared by backend
//! endpoints.
//!
//! A [`Cursor`] is a continuation token: URL-safe base64 over a serde JSON
//! payload chosen by the issuing store. Consumers treat the token as
//! unparseable; only the issuer round-trips it through [`Cursor::decode`].

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while decoding a continuation token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The token is not valid URL-safe base64.
    #[error("continuation token is not valid base64")]
    Encoding,
    /// The token decoded to bytes that do not match the issuer's payload
    /// shape.
    #[error("continuation token payload is malformed")]
    Payload,
}

/// Opaque continuation token for cursor-based pagination.
///
/// Serialises transparently as its string form so it can travel in query
/// strings and response bodies unchanged.
///
/// # Examples
/// ```
/// use pagination::Cursor;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Resume {
///     last_key: i64,
/// }
///
/// let cursor = Cursor::encode(&Resume { last_key: 7 })?;
/// assert_eq!(cursor.decode::<Resume>()?, Resume { last_key: 7 });
/// # Ok::<(), pagination::CursorError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a token received from a client without validating it.
    ///
    /// Validation happens in [`Cursor::decode`]; a tampered token surfaces
    /// there as a [`CursorError`].
    #[must_use]
    pub const fn from_token(token: String) -> Self {
        Self(token)
    }

    /// Encode an issuer payload into an opaque token.
    ///
    /// # Errors
    /// Returns [`CursorError::Payload`] when the payload cannot be
    /// serialised to JSON.
    pub fn encode<T: Serialize>(payload: &T) -> Result<Self, CursorError> {
        let bytes = serde_json::to_vec(payload).map_err(|_| CursorError::Payload)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Decode the token back into the issuer payload.
    ///
    /// # Errors
    /// Returns [`CursorError::Encoding`] for tokens that are not base64 and
    /// [`CursorError::Payload`] for tokens whose bytes do not deserialise
    /// into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.0.as_bytes())
            .map_err(|_| CursorError::Encoding)?;
        serde_json::from_slice(&bytes).map_err(|_| CursorError::Payload)
    }

    /// Borrow the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of results together with the continuation cursor, when further
/// results exist.
///
/// The cursor is `None` on the final page; issuers never hand out a cursor
/// that yields zero further items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in the issuer's natural order.
    pub items: Vec<T>,
    /// Continuation token for the next page, absent on the final page.
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Build a page from items and an optional continuation cursor.
    #[must_use]
    pub const fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self { items, next_cursor }
    }

    /// Map the page items while preserving the cursor.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Build the `next` link for a collection by attaching the cursor to the
/// collection URL.
///
/// Any `cursor` query parameter already present on the collection URL is
/// replaced, so the link is a function of the supplied cursor only.
///
/// # Examples
/// ```
/// use pagination::{Cursor, next_link};
/// use url::Url;
///
/// let collection = Url::parse("https://api.example.test/v1/boats")?;
/// let link = next_link(&collection, &Cursor::from_token("abc".to_owned()));
/// assert_eq!(link.as_str(), "https://api.example.test/v1/boats?cursor=abc");
/// # Ok::<(), url::ParseError>(())
/// ```
#[must_use]
pub fn next_link(collection: &Url, cursor: &Cursor) -> Url {
    let retained: Vec<(String, String)> = collection
        .query_pairs()
        .filter(|(name, _)| name != "cursor")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut link = collection.clone();
    {
        let mut pairs = link.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(retained);
        pairs.append_pair("cursor", cursor.as_str());
    }
    link
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Resume {
        last_key: i64,
    }

    #[rstest]
    fn cursor_round_trips_issuer_payload() {
        let decoded =
            Cursor::encode(&Resume { last_key: 42 }).and_then(|cursor| cursor.decode::<Resume>());
        assert_eq!(decoded, Ok(Resume { last_key: 42 }));
    }

    #[rstest]
    #[case("not base64 at all!")]
    #[case("####")]
    fn tampered_tokens_fail_decoding(#[case] token: &str) {
        let cursor = Cursor::from_token(token.to_owned());
        assert_eq!(cursor.decode::<Resume>(), Err(CursorError::Encoding));
    }

    #[rstest]
    fn wrong_payload_shape_is_rejected() {
        let decoded =
            Cursor::encode(&"just a string").and_then(|cursor| cursor.decode::<Resume>());
        assert_eq!(decoded, Err(CursorError::Payload));
    }

    #[rstest]
    fn tokens_serialise_transparently() {
        let cursor = Cursor::from_token("abc123".to_owned());
        assert_eq!(
            serde_json::to_string(&cursor).ok(),
            Some("\"abc123\"".to_owned())
        );
    }

    #[rstest]
    fn page_map_preserves_cursor() {
        let cursor = Cursor::from_token("abc".to_owned());
        let page = Page::new(vec![1_i64, 2], Some(cursor.clone()));

        let mapped = page.map(|n| n * 10);

        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.next_cursor, Some(cursor));
    }

    #[rstest]
    fn next_link_replaces_existing_cursor_parameter() {
        let link = Url::parse("https://api.example.test/v1/boats?cursor=old")
            .map(|collection| next_link(&collection, &Cursor::from_token("fresh".to_owned())));
        assert_eq!(
            link.as_ref().map(Url::as_str),
            Ok("https://api.example.test/v1/boats?cursor=fresh")
        );
    }
}
