//! Route matching and public-policy flows through the full stack.

#[cfg(test)]
mod tests {
    use crate::{authorize, body_bytes, stack_at};

    const T0: i64 = 1_700_000_000;

    const STORE: &str = r#"{
        "routes": [
            {
                "id": "r-health",
                "pattern": "/api/health",
                "domain": "*",
                "methods": {"GET": "public"},
                "service_name": "health"
            },
            {
                "id": "r-any",
                "pattern": "/x",
                "domain": "*",
                "methods": {"GET": "public"},
                "service_name": "svc-any"
            },
            {
                "id": "r-exact",
                "pattern": "/x",
                "domain": "a.example",
                "methods": {"GET": "public"},
                "service_name": "svc-exact"
            },
            {
                "id": "r-tree",
                "pattern": "/files/*",
                "domain": "*",
                "methods": {"GET": "public"},
                "service_name": "files"
            }
        ],
        "clients": [],
        "permissions": []
    }"#;

    #[tokio::test]
    async fn test_should_allow_public_get_without_credentials() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/api/health"),
                ("x-original-method", "GET"),
                ("x-original-host", "api.x"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-route-id").unwrap(), "r-health");
        assert!(!resp.headers().contains_key("x-auth-client-id"));
        assert!(!resp.headers().contains_key("x-auth-client-name"));
    }

    #[tokio::test]
    async fn test_should_deny_unconfigured_path_with_no_route_tag() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/unknown"),
                ("x-original-method", "GET"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"no_route");
    }

    #[tokio::test]
    async fn test_should_deny_unconfigured_method_on_matched_route() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/api/health"),
                ("x-original-method", "POST"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"method_not_configured");
    }

    #[tokio::test]
    async fn test_should_surface_the_exact_domain_route_over_the_catch_all() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/x"),
                ("x-original-method", "GET"),
                ("x-original-host", "a.example"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-route-id").unwrap(), "r-exact");
    }

    #[tokio::test]
    async fn test_should_fall_back_to_the_catch_all_for_other_hosts() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/x"),
                ("x-original-method", "GET"),
                ("x-original-host", "b.example"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-route-id").unwrap(), "r-any");
    }

    #[tokio::test]
    async fn test_should_strip_port_and_case_from_the_forwarded_host() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/x"),
                ("x-original-method", "GET"),
                ("x-original-host", "A.Example:8443"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-route-id").unwrap(), "r-exact");
    }

    #[tokio::test]
    async fn test_should_match_wildcard_descendants_but_not_the_bare_prefix() {
        let (authorizer, _) = stack_at(STORE, T0);

        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/files/a/b"),
                ("x-original-method", "GET"),
            ],
            b"",
        )
        .await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-route-id").unwrap(), "r-tree");

        let resp = authorize(
            &authorizer,
            &[("x-original-uri", "/files"), ("x-original-method", "GET")],
            b"",
        )
        .await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"no_route");
    }

    #[tokio::test]
    async fn test_should_reject_subrequest_missing_proxy_headers() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(&authorizer, &[("x-original-method", "GET")], b"").await;
        assert_eq!(resp.status(), http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_should_reject_unknown_method_token() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/api/health"),
                ("x-original-method", "CONNECT"),
            ],
            b"",
        )
        .await;
        assert_eq!(resp.status(), http::StatusCode::BAD_REQUEST);
    }
}
