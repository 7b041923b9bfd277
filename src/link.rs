//! Account-link state machine
//!
//! Interprets registry responses for verify / unverify / force-verify and
//! collapses them into one [`LinkOutcome`] per call. The registry is the
//! single source of truth for the chat-id <-> ckey bijection; this layer is
//! stateless, never retries, and never assumes a mutation happened unless
//! the registry confirmed it with a success status.
//!
//! The registry encodes which side of a pair caused a 409 with a sentinel:
//! a conflict payload prefixed with `@` is a chat identity, a bare string is
//! a ckey. That convention is decoded here, immediately on receipt, and is
//! not allowed to leak any further.

use lazy_regex::regex_is_match;
use log::warn;
use reqwest::StatusCode;
use serde_json::json;

use crate::api::{ApiClient, ApiResponse};
use crate::errors::ApiError;

/// Prefix marking a registry payload value as a chat identity.
const CHAT_MARKER: char = '@';

/// Result of attempting to create or remove one identity pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new pair was established.
    Created { ckey: String, chat_id: String },
    /// An existing pair was removed.
    Removed { ckey: String, chat_id: String },
    /// The invoking chat identity already maps to a different ckey.
    ChatAlreadyLinked { existing_ckey: String },
    /// The ckey (or the token's ckey) already maps to a different chat
    /// identity.
    CkeyAlreadyLinked { existing_chat_id: String },
    /// The referenced ckey or one-time token does not exist.
    NotFound,
    /// Unlink attempted on a pair that does not exist.
    NotLinked,
    /// The token failed the local shape check; the registry was not called.
    InvalidToken,
    /// The registry could not be reached or answered something outside the
    /// contract.
    TransportFailure,
}

/// Checks the one-time-token shape grammar (three digits, dash, three
/// digits). Tokens failing this never reach the registry.
pub fn token_shape_ok(token: &str) -> bool {
    regex_is_match!(r"^\d{3}-\d{3}$", token)
}

/// Normalizes an operator-supplied ckey the way the backend stores it.
pub fn normalize_ckey(ckey: &str) -> String {
    ckey.trim().to_lowercase()
}

/// Redeems a one-time token for the invoking chat identity.
///
/// Malformed tokens short-circuit to [`LinkOutcome::InvalidToken`] without a
/// backend call; a well-shaped token the registry does not know yields
/// [`LinkOutcome::NotFound`]. The local shape check always wins.
pub async fn verify_by_token(api: &ApiClient, chat_id: &str, token: &str) -> LinkOutcome {
    if !token_shape_ok(token) {
        return LinkOutcome::InvalidToken;
    }

    let response = api
        .post(
            "verify",
            &json!({ "discord_id": chat_id, "one_time_token": token }),
        )
        .await;

    map_create(response, chat_id, "verify")
}

/// Links `ckey` to `chat_id` directly, bypassing the one-time token. The
/// ckey is case-normalized before the call; 404 means the player does not
/// exist.
pub async fn force_link(api: &ApiClient, chat_id: &str, ckey: &str) -> LinkOutcome {
    let ckey = normalize_ckey(ckey);

    let response = api
        .post("verify", &json!({ "discord_id": chat_id, "ckey": ckey }))
        .await;

    map_create(response, chat_id, "force-verify")
}

/// Removes the pair owned by `chat_id`, if any.
pub async fn unlink_by_chat_id(api: &ApiClient, chat_id: &str) -> LinkOutcome {
    let response = api.post("unverify", &json!({ "discord_id": chat_id })).await;

    let response = match checked(response, "unverify") {
        Ok(response) => response,
        Err(outcome) => return outcome,
    };

    match response.status {
        StatusCode::OK => match response.text() {
            Ok(ckey) => LinkOutcome::Removed {
                ckey,
                chat_id: chat_id.to_string(),
            },
            Err(err) => transport("unverify", &err),
        },
        StatusCode::NOT_FOUND => LinkOutcome::NotFound,
        StatusCode::CONFLICT => LinkOutcome::NotLinked,
        status => unexpected("unverify", status),
    }
}

/// Removes the pair owning `ckey`, if any. The removed chat identity comes
/// back marker-prefixed in the response body.
pub async fn unlink_by_ckey(api: &ApiClient, ckey: &str) -> LinkOutcome {
    let ckey = normalize_ckey(ckey);

    let response = api.post("unverify", &json!({ "ckey": ckey })).await;

    let response = match checked(response, "unverify") {
        Ok(response) => response,
        Err(outcome) => return outcome,
    };

    match response.status {
        StatusCode::OK => match response.text() {
            Ok(body) => match body.strip_prefix(CHAT_MARKER) {
                Some(chat_id) => LinkOutcome::Removed {
                    ckey,
                    chat_id: chat_id.to_string(),
                },
                None => {
                    warn!("unverify: 200 body is not a chat identity: {body:?}");
                    LinkOutcome::TransportFailure
                }
            },
            Err(err) => transport("unverify", &err),
        },
        StatusCode::NOT_FOUND => LinkOutcome::NotFound,
        StatusCode::CONFLICT => LinkOutcome::NotLinked,
        status => unexpected("unverify", status),
    }
}

/// Shared mapping for the two pair-creating calls (`verify`,
/// `force-verify`): both POST to `/verify` and share the status contract.
fn map_create(
    response: Result<ApiResponse, ApiError>,
    chat_id: &str,
    operation: &str,
) -> LinkOutcome {
    let response = match checked(response, operation) {
        Ok(response) => response,
        Err(outcome) => return outcome,
    };

    match response.status {
        StatusCode::OK => match response.text() {
            Ok(ckey) => LinkOutcome::Created {
                ckey,
                chat_id: chat_id.to_string(),
            },
            Err(err) => transport(operation, &err),
        },
        StatusCode::NOT_FOUND => LinkOutcome::NotFound,
        StatusCode::CONFLICT => match response.text() {
            Ok(payload) => decode_conflict(&payload),
            Err(err) => transport(operation, &err),
        },
        status => unexpected(operation, status),
    }
}

/// Decodes a 409 payload into the conflicting side of the existing pair.
///
/// A marker-prefixed value means the ckey/token side is already claimed by
/// that chat identity; a bare value is the ckey the invoking chat identity
/// is already linked to.
fn decode_conflict(payload: &str) -> LinkOutcome {
    match payload.strip_prefix(CHAT_MARKER) {
        Some(chat_id) => LinkOutcome::CkeyAlreadyLinked {
            existing_chat_id: chat_id.to_string(),
        },
        None => LinkOutcome::ChatAlreadyLinked {
            existing_ckey: payload.to_string(),
        },
    }
}

fn checked(
    response: Result<ApiResponse, ApiError>,
    operation: &str,
) -> Result<ApiResponse, LinkOutcome> {
    response.map_err(|err| transport(operation, &err))
}

fn transport(operation: &str, err: &dyn std::fmt::Display) -> LinkOutcome {
    warn!("{operation}: registry call failed: {err}");
    LinkOutcome::TransportFailure
}

fn unexpected(operation: &str, status: StatusCode) -> LinkOutcome {
    warn!("{operation}: unexpected registry status {status}");
    LinkOutcome::TransportFailure
}
