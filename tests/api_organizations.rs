//! Integration tests per gli endpoints HTTP

mod common;

#[cfg(test)]
mod api_tests {
    use super::common::{
        FakeSender, create_member, create_test_jwt, create_test_server, create_test_state,
    };
    use axum_test::TestServer;
    use axum_test::http::HeaderName;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tschwaa_server::core::AppState;
    use tschwaa_server::entities::Member;

    fn bearer(member: &Member) -> String {
        format!("Bearer {}", create_test_jwt(member))
    }

    /// Alice founds Acme over HTTP; returns the organization id.
    async fn found_acme(server: &TestServer, alice: &Member) -> i64 {
        let response = server
            .post("/organizations")
            .add_header(HeaderName::from_static("authorization"), bearer(alice))
            .json(&json!({ "name": "Acme", "description": "Tontine du quartier" }))
            .await;
        response.assert_status(axum_test::http::StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().unwrap()
    }

    async fn setup() -> (Arc<FakeSender>, Arc<AppState>, TestServer) {
        let sender = Arc::new(FakeSender::new());
        let state = create_test_state(sender.clone()).await;
        let server = create_test_server(state.clone());
        (sender, state, server)
    }

    // ============================================================
    // Autenticazione
    // ============================================================

    #[tokio::test]
    async fn test_root_is_public() {
        let (_, _, server) = setup().await;
        server.get("/").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_organizations_without_token() {
        let (_, _, server) = setup().await;
        server.get("/organizations").await.assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_organizations_with_invalid_token() {
        let (_, _, server) = setup().await;
        server
            .get("/organizations")
            .add_header(
                HeaderName::from_static("authorization"),
                "Bearer invalid_token_here",
            )
            .await
            .assert_status_unauthorized();
    }

    // ============================================================
    // Organizzazioni
    // ============================================================

    #[tokio::test]
    async fn test_create_and_read_organization() {
        let (_, state, server) = setup().await;
        let alice = create_member(&state, "Alice", "+237699000001").await;
        let org_id = found_acme(&server, &alice).await;

        let mine = server
            .get("/organizations")
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await;
        mine.assert_status_ok();
        assert_eq!(mine.json::<Vec<Value>>().len(), 1);

        let organization = server
            .get(&format!("/organizations/{}", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await;
        organization.assert_status_ok();
        let body = organization.json::<Value>();
        assert_eq!(body["name"], "Acme");
        assert!(body["current_session"].is_null());

        let members = server
            .get(&format!("/organizations/{}/members", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await;
        members.assert_status_ok();
        let members = members.json::<Vec<Value>>();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["member_id"], alice.id);
        assert_eq!(members[0]["role"], "OWNER");
        assert_eq!(members[0]["joined"], true);
    }

    #[tokio::test]
    async fn test_create_organization_with_empty_name() {
        let (_, state, server) = setup().await;
        let alice = create_member(&state, "Alice", "+237699000001").await;

        server
            .post("/organizations")
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({ "name": "" }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_non_member_cannot_read_organization() {
        let (_, state, server) = setup().await;
        let alice = create_member(&state, "Alice", "+237699000001").await;
        let eve = create_member(&state, "Eve", "+237699000009").await;
        let org_id = found_acme(&server, &alice).await;

        server
            .get(&format!("/organizations/{}", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&eve))
            .await
            .assert_status_forbidden();
    }

    // ============================================================
    // Inviti
    // ============================================================

    #[tokio::test]
    async fn test_invite_then_approve_over_http() {
        let (sender, state, server) = setup().await;
        let alice = create_member(&state, "Alice", "+237699000001").await;
        let carol = create_member(&state, "Carol", "+237699000003").await;
        let org_id = found_acme(&server, &alice).await;

        let response = server
            .post(&format!("/organizations/{}/members/invite", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({
                "members": [
                    { "phone": "+237699000002", "first_name": "Bob" },
                    { "phone": "not a phone" }
                ]
            }))
            .await;
        response.assert_status_ok();
        let outcomes = response.json::<Vec<Value>>();
        assert_eq!(outcomes.len(), 2);
        let invited = outcomes.iter().filter(|o| o["invited"] == true).count();
        assert_eq!(invited, 1);

        let bob = state
            .memberships
            .find_member("+237699000002")
            .await
            .unwrap()
            .unwrap();
        let token = sender.token_for(&bob.phone).unwrap();

        // pending members are not members yet
        server
            .get(&format!("/organizations/{}", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&bob))
            .await
            .assert_status_forbidden();

        let landing = server.get(&format!("/invitations/{}", token)).await;
        landing.assert_status_ok();
        assert_eq!(landing.json::<Value>()["organization_name"], "Acme");

        server
            .get(&format!("/invitations/{}", token))
            .add_header(HeaderName::from_static("authorization"), bearer(&carol))
            .await
            .assert_status_forbidden();

        server
            .post(&format!("/invitations/{}/approve", token))
            .add_header(HeaderName::from_static("authorization"), bearer(&bob))
            .await
            .assert_status_ok();
        server
            .post(&format!("/invitations/{}/approve", token))
            .await
            .assert_status_not_found();

        server
            .get(&format!("/organizations/{}", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&bob))
            .await
            .assert_status_ok();

        // plain members cannot invite
        server
            .post(&format!("/organizations/{}/members/invite", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&bob))
            .json(&json!({ "members": [{ "phone": "+237699000004" }] }))
            .await
            .assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_invite_with_empty_batch() {
        let (_, state, server) = setup().await;
        let alice = create_member(&state, "Alice", "+237699000001").await;
        let org_id = found_acme(&server, &alice).await;

        server
            .post(&format!("/organizations/{}/members/invite", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({ "members": [] }))
            .await
            .assert_status_bad_request();
    }

    // ============================================================
    // Sessioni e luogo
    // ============================================================

    #[tokio::test]
    async fn test_session_place_over_http() {
        let (_, state, server) = setup().await;
        let alice = create_member(&state, "Alice", "+237699000001").await;
        let org_id = found_acme(&server, &alice).await;

        let session = server
            .post(&format!("/organizations/{}/sessions", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({ "start_date": "2024-01-01", "end_date": "2024-12-31" }))
            .await;
        session.assert_status(axum_test::http::StatusCode::CREATED);
        let session_id = session.json::<Value>()["id"].as_i64().unwrap();

        let current = server
            .get(&format!("/organizations/{}/sessions/current", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await;
        current.assert_status_ok();
        assert_eq!(current.json::<Value>()["id"], session_id);

        let place_url = format!("/organizations/{}/sessions/{}/place", org_id, session_id);

        server
            .get(&place_url)
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await
            .assert_status_not_found();

        server
            .put(&place_url)
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({ "place_type": "online", "platform": "zoom", "link": "https://x" }))
            .await
            .assert_status_ok();

        server
            .put(&place_url)
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({ "place_type": "given_venue", "platform": "zoom" }))
            .await
            .assert_status_bad_request();

        let place = server
            .get(&place_url)
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await;
        place.assert_status_ok();
        let place = place.json::<Value>();
        assert_eq!(place["umbrella"]["place_type"], "online");
        assert_eq!(place["variant"]["platform"], "zoom");

        server
            .delete(&place_url)
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await
            .assert_status(axum_test::http::StatusCode::NO_CONTENT);

        // a session of another organization is not reachable through this one
        server
            .get(&format!("/organizations/{}/sessions/{}/place", org_id, session_id + 100))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_session_members_over_http() {
        let (_, state, server) = setup().await;
        let alice = create_member(&state, "Alice", "+237699000001").await;
        let org_id = found_acme(&server, &alice).await;

        let session = server
            .post(&format!("/organizations/{}/sessions", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({ "start_date": "2024-01-01", "end_date": "2024-12-31" }))
            .await;
        let session_id = session.json::<Value>()["id"].as_i64().unwrap();

        let members = server
            .get(&format!("/organizations/{}/members", org_id))
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await
            .json::<Vec<Value>>();
        let membership_id = members[0]["membership_id"].as_i64().unwrap();

        let members_url = format!("/organizations/{}/sessions/{}/members", org_id, session_id);

        let updated = server
            .patch(&members_url)
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({ "membership_ids": [membership_id] }))
            .await;
        updated.assert_status_ok();
        assert_eq!(updated.json::<Vec<Value>>()[0]["membership_id"], membership_id);

        server
            .patch(&members_url)
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .json(&json!({ "membership_ids": [membership_id + 100] }))
            .await
            .assert_status_bad_request();

        let listed = server
            .get(&members_url)
            .add_header(HeaderName::from_static("authorization"), bearer(&alice))
            .await;
        listed.assert_status_ok();
        assert_eq!(listed.json::<Vec<Value>>().len(), 1);
    }
}
