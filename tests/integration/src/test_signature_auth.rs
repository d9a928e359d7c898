//! Signature authentication flows through the full stack.

#[cfg(test)]
mod tests {
    use gatekeeper_auth::RequestSigner;

    use crate::{authorize, body_bytes, stack_at};

    const T0: i64 = 1_700_000_000;

    const STORE: &str = r#"{
        "routes": [
            {
                "id": "r-secure",
                "pattern": "/api/secure",
                "domain": "*",
                "methods": {"POST": "signature"},
                "service_name": "secure"
            },
            {
                "id": "r-flex",
                "pattern": "/api/flex",
                "domain": "*",
                "methods": {"POST": "any"},
                "service_name": "flex"
            }
        ],
        "clients": [
            {
                "id": "c-2",
                "name": "batch signer",
                "shared_secret": "s-xyz",
                "status": "active"
            },
            {
                "id": "c-3",
                "name": "other signer",
                "api_key": "k-3",
                "shared_secret": "s-other",
                "status": "active"
            }
        ],
        "permissions": [
            {
                "client_id": "c-2",
                "route_id": "r-secure",
                "allowed_methods": ["POST"]
            },
            {
                "client_id": "c-3",
                "route_id": "r-flex",
                "allowed_methods": ["POST"]
            }
        ]
    }"#;

    fn signed_headers<'a>(
        uri: &'a str,
        signed: &'a gatekeeper_auth::SignedHeaders,
    ) -> Vec<(&'a str, &'a str)> {
        let mut headers = vec![
            ("x-original-uri", uri),
            ("x-original-method", "POST"),
            ("x-original-host", "api.x"),
            ("x-signature", signed.signature.as_str()),
            ("x-timestamp", signed.timestamp.as_str()),
            ("x-body-hash", signed.body_hash.as_str()),
        ];
        if let Some(client_id) = &signed.client_id {
            headers.push(("x-client-id", client_id.as_str()));
        }
        headers
    }

    #[tokio::test]
    async fn test_should_allow_fresh_signed_subrequest() {
        let (authorizer, _) = stack_at(STORE, T0 + 60);
        let signed = RequestSigner::new("s-xyz").sign_at("POST", "/api/secure", b"{}", T0);

        let resp = authorize(&authorizer, &signed_headers("/api/secure", &signed), b"{}").await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-client-id").unwrap(), "c-2");
        assert_eq!(resp.headers().get("x-auth-route-id").unwrap(), "r-secure");
    }

    #[tokio::test]
    async fn test_should_deny_replay_past_the_freshness_window() {
        let (authorizer, _) = stack_at(STORE, T0 + 400);
        let signed = RequestSigner::new("s-xyz").sign_at("POST", "/api/secure", b"{}", T0);

        let resp = authorize(&authorizer, &signed_headers("/api/secure", &signed), b"{}").await;

        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"signature_expired");
    }

    #[tokio::test]
    async fn test_should_accept_again_after_the_clock_rewinds_into_the_window() {
        let (authorizer, clock) = stack_at(STORE, T0 + 400);
        let signed = RequestSigner::new("s-xyz").sign_at("POST", "/api/secure", b"{}", T0);

        let resp = authorize(&authorizer, &signed_headers("/api/secure", &signed), b"{}").await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);

        clock.set(T0 + 100);
        let resp = authorize(&authorizer, &signed_headers("/api/secure", &signed), b"{}").await;
        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_deny_body_differing_from_the_signed_digest() {
        let (authorizer, _) = stack_at(STORE, T0);
        let signed = RequestSigner::new("s-xyz").sign_at("POST", "/api/secure", b"{}", T0);

        let resp = authorize(
            &authorizer,
            &signed_headers("/api/secure", &signed),
            b"{\"evil\":true}",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"body_tampered");
    }

    #[tokio::test]
    async fn test_should_deny_signature_from_an_unknown_secret() {
        let (authorizer, _) = stack_at(STORE, T0);
        let signed = RequestSigner::new("s-unknown").sign_at("POST", "/api/secure", b"{}", T0);

        let resp = authorize(&authorizer, &signed_headers("/api/secure", &signed), b"{}").await;

        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"invalid_signature");
    }

    #[tokio::test]
    async fn test_should_deny_partial_bundle_as_missing_credentials() {
        let (authorizer, _) = stack_at(STORE, T0);
        let signed = RequestSigner::new("s-xyz").sign_at("POST", "/api/secure", b"{}", T0);

        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/api/secure"),
                ("x-original-method", "POST"),
                ("x-signature", signed.signature.as_str()),
                ("x-timestamp", signed.timestamp.as_str()),
            ],
            b"{}",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"missing_credentials");
    }

    #[tokio::test]
    async fn test_should_resolve_secret_via_client_hint() {
        let (authorizer, _) = stack_at(STORE, T0);
        let signed = RequestSigner::new("s-xyz")
            .with_client_id("c-2")
            .sign_at("POST", "/api/secure", b"{}", T0);

        let resp = authorize(&authorizer, &signed_headers("/api/secure", &signed), b"{}").await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-client-id").unwrap(), "c-2");
    }

    #[tokio::test]
    async fn test_should_sign_the_path_without_the_query_string() {
        // The adapter strips the query string before matching and
        // verification; signers sign the bare path.
        let (authorizer, _) = stack_at(STORE, T0);
        let signed = RequestSigner::new("s-xyz").sign_at("POST", "/api/secure", b"{}", T0);

        let resp = authorize(
            &authorizer,
            &signed_headers("/api/secure?tag=nightly", &signed),
            b"{}",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_prefer_signature_over_key_when_either_is_accepted() {
        let (authorizer, _) = stack_at(STORE, T0);

        // Signed request on the flexible route authenticates as the
        // signer even though a valid key is also present.
        let signed = RequestSigner::new("s-other").sign_at("POST", "/api/flex", b"{}", T0);
        let mut headers = signed_headers("/api/flex", &signed);
        headers.push(("authorization", "Bearer k-3"));
        let resp = authorize(&authorizer, &headers, b"{}").await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-client-id").unwrap(), "c-3");

        // Key alone is also accepted there.
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/api/flex"),
                ("x-original-method", "POST"),
                ("authorization", "Bearer k-3"),
            ],
            b"",
        )
        .await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-client-id").unwrap(), "c-3");
    }
}
