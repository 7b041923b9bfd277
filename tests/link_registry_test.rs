//! Integration tests for the account-link state machine against a mocked
//! registry (wiremock).
//!
//! Run with: cargo test --test link_registry_test

use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use centcom::config::ApiConfig;
use centcom::link::{self, LinkOutcome};
use centcom::ApiClient;

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&ApiConfig {
        url: server.uri(),
        token: "test-secret".to_string(),
    })
    .unwrap()
}

// ============================================================================
// verify_by_token
// ============================================================================

mod verify_tests {
    use super::*;

    #[tokio::test]
    async fn well_shaped_token_creates_a_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_json(json!({ "discord_id": "42", "one_time_token": "123-456" })))
            .respond_with(ResponseTemplate::new(200).set_body_json("shaftbuster"))
            .mount(&server)
            .await;

        let outcome = link::verify_by_token(&client(&server), "42", "123-456").await;

        assert_eq!(
            outcome,
            LinkOutcome::Created {
                ckey: "shaftbuster".to_string(),
                chat_id: "42".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn malformed_tokens_never_reach_the_registry() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let api = client(&server);
        for token in ["12-345", "1234-56", "abcdef", "123-45a", ""] {
            let outcome = link::verify_by_token(&api, "42", token).await;
            assert_eq!(outcome, LinkOutcome::InvalidToken, "token: {token:?}");
        }

        // Mock expectations (zero calls) are checked when `server` drops.
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = link::verify_by_token(&client(&server), "42", "999-999").await;

        assert_eq!(outcome, LinkOutcome::NotFound);
    }

    #[tokio::test]
    async fn bare_conflict_payload_means_the_chat_account_is_taken() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(409).set_body_json("shaftbuster"))
            .mount(&server)
            .await;

        let outcome = link::verify_by_token(&client(&server), "42", "123-456").await;

        assert_eq!(
            outcome,
            LinkOutcome::ChatAlreadyLinked {
                existing_ckey: "shaftbuster".to_string()
            }
        );
    }

    #[tokio::test]
    async fn marked_conflict_payload_means_the_token_is_taken() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_json(json!({ "discord_id": "42", "one_time_token": "123-456" })))
            .respond_with(ResponseTemplate::new(409).set_body_json("@42"))
            .mount(&server)
            .await;

        let outcome = link::verify_by_token(&client(&server), "42", "123-456").await;

        assert_eq!(
            outcome,
            LinkOutcome::CkeyAlreadyLinked {
                existing_chat_id: "42".to_string()
            }
        );
    }

    #[tokio::test]
    async fn double_redemption_never_creates_twice() {
        let server = MockServer::start().await;
        // First redemption succeeds and consumes the token; the registry
        // reports the existing pair on the double-click.
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json("shaftbuster"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(409).set_body_json("shaftbuster"))
            .mount(&server)
            .await;

        let api = client(&server);
        let first = link::verify_by_token(&api, "42", "123-456").await;
        let second = link::verify_by_token(&api, "42", "123-456").await;

        assert!(matches!(first, LinkOutcome::Created { .. }));
        assert_eq!(
            second,
            LinkOutcome::ChatAlreadyLinked {
                existing_ckey: "shaftbuster".to_string()
            }
        );
    }

    #[tokio::test]
    async fn server_error_is_a_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = link::verify_by_token(&client(&server), "42", "123-456").await;

        assert_eq!(outcome, LinkOutcome::TransportFailure);
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let outcome = link::verify_by_token(&client(&server), "42", "123-456").await;

        assert_eq!(outcome, LinkOutcome::TransportFailure);
    }
}

// ============================================================================
// force_link
// ============================================================================

mod force_link_tests {
    use super::*;

    #[tokio::test]
    async fn operator_supplied_ckey_is_normalized_before_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_json(json!({ "discord_id": "42", "ckey": "shaftbuster" })))
            .respond_with(ResponseTemplate::new(200).set_body_json("shaftbuster"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = link::force_link(&client(&server), "42", "  ShaftBuster ").await;

        assert_eq!(
            outcome,
            LinkOutcome::Created {
                ckey: "shaftbuster".to_string(),
                chat_id: "42".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = link::force_link(&client(&server), "42", "nobody").await;

        assert_eq!(outcome, LinkOutcome::NotFound);
    }

    #[tokio::test]
    async fn relinking_a_linked_chat_account_conflicts_with_the_old_ckey() {
        let server = MockServer::start().await;
        // Chat identity already holds a pair with ckey `oldkey`; linking a
        // different ckey must surface that pair, never a second Created.
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_json(json!({ "discord_id": "42", "ckey": "newkey" })))
            .respond_with(ResponseTemplate::new(409).set_body_json("oldkey"))
            .mount(&server)
            .await;

        let outcome = link::force_link(&client(&server), "42", "newkey").await;

        assert_eq!(
            outcome,
            LinkOutcome::ChatAlreadyLinked {
                existing_ckey: "oldkey".to_string()
            }
        );
    }

    #[tokio::test]
    async fn linking_a_taken_ckey_conflicts_with_its_owner() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(409).set_body_json("@20482048"))
            .mount(&server)
            .await;

        let outcome = link::force_link(&client(&server), "42", "shaftbuster").await;

        assert_eq!(
            outcome,
            LinkOutcome::CkeyAlreadyLinked {
                existing_chat_id: "20482048".to_string()
            }
        );
    }
}

// ============================================================================
// unlink_by_chat_id / unlink_by_ckey
// ============================================================================

mod unlink_tests {
    use super::*;

    #[tokio::test]
    async fn unlink_by_chat_id_returns_the_removed_ckey() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/unverify"))
            .and(body_json(json!({ "discord_id": "42" })))
            .respond_with(ResponseTemplate::new(200).set_body_json("shaftbuster"))
            .mount(&server)
            .await;

        let outcome = link::unlink_by_chat_id(&client(&server), "42").await;

        assert_eq!(
            outcome,
            LinkOutcome::Removed {
                ckey: "shaftbuster".to_string(),
                chat_id: "42".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unlink_by_chat_id_on_unlinked_account_is_not_linked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/unverify"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let outcome = link::unlink_by_chat_id(&client(&server), "42").await;

        assert_eq!(outcome, LinkOutcome::NotLinked);
    }

    #[tokio::test]
    async fn unlink_by_ckey_decodes_the_removed_chat_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/unverify"))
            .and(body_json(json!({ "ckey": "shaftbuster" })))
            .respond_with(ResponseTemplate::new(200).set_body_json("@42"))
            .mount(&server)
            .await;

        let outcome = link::unlink_by_ckey(&client(&server), "ShaftBuster").await;

        assert_eq!(
            outcome,
            LinkOutcome::Removed {
                ckey: "shaftbuster".to_string(),
                chat_id: "42".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn verify_unlink_unlink_sequence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json("shaftbuster"))
            .mount(&server)
            .await;
        // The pair exists for exactly one removal; the registry answers 404
        // for the ckey afterwards.
        Mock::given(method("POST"))
            .and(path("/unverify"))
            .respond_with(ResponseTemplate::new(200).set_body_json("@42"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/unverify"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = client(&server);
        let created = link::verify_by_token(&api, "42", "123-456").await;
        let removed = link::unlink_by_ckey(&api, "shaftbuster").await;
        let repeat = link::unlink_by_ckey(&api, "shaftbuster").await;

        assert!(matches!(created, LinkOutcome::Created { .. }));
        assert!(matches!(removed, LinkOutcome::Removed { .. }));
        assert_eq!(repeat, LinkOutcome::NotFound);
    }

    #[tokio::test]
    async fn unmarked_removal_body_is_a_transport_failure() {
        let server = MockServer::start().await;
        // A 200 body without the chat-identity marker is outside the
        // contract for the ckey path.
        Mock::given(method("POST"))
            .and(path("/unverify"))
            .respond_with(ResponseTemplate::new(200).set_body_json("shaftbuster"))
            .mount(&server)
            .await;

        let outcome = link::unlink_by_ckey(&client(&server), "shaftbuster").await;

        assert_eq!(outcome, LinkOutcome::TransportFailure);
    }
}

// ============================================================================
// Backend client contract
// ============================================================================

mod client_contract_tests {
    use super::*;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn expected_statuses_come_back_as_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/player/discord/"))
            .and(query_param("ckey", "shaftbuster"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let response = client(&server)
            .get("player/discord/", &[("ckey", "shaftbuster")])
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn bearer_credential_is_attached_to_every_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server"))
            .and(header("authorization", "Bearer test-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).get("server", &[]).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unreachable_registry_fails_the_call_outright() {
        let api = ApiClient::new(&ApiConfig {
            // Port 9 (discard) is never listening locally.
            url: "http://127.0.0.1:9".to_string(),
            token: "test-secret".to_string(),
        })
        .unwrap();

        assert!(api.get("server", &[]).await.is_err());
    }
}
