//! API-key authentication and permission flows through the full stack.

#[cfg(test)]
mod tests {
    use crate::{authorize, body_bytes, stack_at};

    const T0: i64 = 1_700_000_000;

    const STORE: &str = r#"{
        "routes": [
            {
                "id": "r-users",
                "pattern": "/api/users/*",
                "domain": "api.example.com",
                "methods": {"POST": "key", "GET": "key"},
                "service_name": "users"
            }
        ],
        "clients": [
            {
                "id": "c-1",
                "name": "orders service",
                "api_key": "k-abc",
                "status": "active"
            },
            {
                "id": "c-frozen",
                "name": "frozen service",
                "api_key": "k-frozen",
                "status": "suspended"
            },
            {
                "id": "c-gone",
                "name": "retired service",
                "api_key": "k-gone",
                "status": "revoked"
            }
        ],
        "permissions": [
            {
                "client_id": "c-1",
                "route_id": "r-users",
                "allowed_methods": ["POST"]
            },
            {
                "client_id": "c-frozen",
                "route_id": "r-users",
                "allowed_methods": ["POST"]
            },
            {
                "client_id": "c-gone",
                "route_id": "r-users",
                "allowed_methods": ["POST"]
            }
        ]
    }"#;

    fn users_subrequest<'a>(extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut headers = vec![
            ("x-original-uri", "/api/users/42"),
            ("x-original-method", "POST"),
            ("x-original-host", "api.example.com"),
        ];
        headers.extend_from_slice(extra);
        headers
    }

    #[tokio::test]
    async fn test_should_allow_bearer_key_with_permission() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &users_subrequest(&[("authorization", "Bearer k-abc")]),
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-client-id").unwrap(), "c-1");
        assert_eq!(resp.headers().get("x-auth-client-name").unwrap(), "orders service");
        assert_eq!(resp.headers().get("x-auth-route-id").unwrap(), "r-users");
    }

    #[tokio::test]
    async fn test_should_accept_key_from_query_parameter() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/api/users/42?api_key=k-abc"),
                ("x-original-method", "POST"),
                ("x-original-host", "api.example.com"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("x-auth-client-id").unwrap(), "c-1");
    }

    #[tokio::test]
    async fn test_should_deny_method_outside_the_granted_set() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/api/users/42"),
                ("x-original-method", "GET"),
                ("x-original-host", "api.example.com"),
                ("authorization", "Bearer k-abc"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"method_not_allowed");
    }

    #[tokio::test]
    async fn test_should_deny_absent_then_unknown_credentials() {
        let (authorizer, _) = stack_at(STORE, T0);

        let resp = authorize(&authorizer, &users_subrequest(&[]), b"").await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"missing_credentials");

        let resp = authorize(
            &authorizer,
            &users_subrequest(&[("authorization", "Bearer k-nope")]),
            b"",
        )
        .await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"invalid_credentials");
    }

    #[tokio::test]
    async fn test_should_deny_suspended_and_revoked_clients_by_status() {
        let (authorizer, _) = stack_at(STORE, T0);

        let resp = authorize(
            &authorizer,
            &users_subrequest(&[("authorization", "Bearer k-frozen")]),
            b"",
        )
        .await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"client_suspended");

        let resp = authorize(
            &authorizer,
            &users_subrequest(&[("authorization", "Bearer k-gone")]),
            b"",
        )
        .await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"client_revoked");
    }

    #[tokio::test]
    async fn test_should_deny_key_on_unlisted_domain() {
        let (authorizer, _) = stack_at(STORE, T0);
        let resp = authorize(
            &authorizer,
            &[
                ("x-original-uri", "/api/users/42"),
                ("x-original-method", "POST"),
                ("x-original-host", "other.example.com"),
                ("authorization", "Bearer k-abc"),
            ],
            b"",
        )
        .await;

        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(&body_bytes(resp).await[..], b"no_route");
    }
}
