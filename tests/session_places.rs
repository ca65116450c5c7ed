//! Integration tests per il luogo delle sessioni

mod common;

#[cfg(test)]
mod session_place_tests {
    use super::common::{
        FakeSender, create_file_state, create_member, create_test_state, test_config,
    };
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tokio::task::JoinSet;
    use tschwaa_server::core::{AppState, ErrorKind};
    use tschwaa_server::dtos::{CreateOrganizationDTO, CreateSessionDTO, PlaceFieldsDTO};
    use tschwaa_server::entities::{PlaceType, PlaceVariant, Session};

    async fn setup_session(state: &AppState) -> Session {
        let alice = create_member(state, "Alice", "+237699000001").await;
        let acme = state
            .memberships
            .create_organization_with_founding_membership(
                alice.id,
                CreateOrganizationDTO {
                    name: "Acme".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();
        state
            .sessions
            .create_session(
                acme.id,
                CreateSessionDTO {
                    start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                },
            )
            .await
            .unwrap()
    }

    fn online(platform: &str, link: &str) -> PlaceFieldsDTO {
        PlaceFieldsDTO {
            platform: Some(platform.to_string()),
            link: Some(link.to_string()),
            ..PlaceFieldsDTO::default()
        }
    }

    fn venue(name: &str, location: &str) -> PlaceFieldsDTO {
        PlaceFieldsDTO {
            name: Some(name.to_string()),
            location: Some(location.to_string()),
            ..PlaceFieldsDTO::default()
        }
    }

    async fn count(state: &AppState, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(state.gateway.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_replace_swaps_umbrella_and_variant_together() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let session = setup_session(&state).await;

        assert!(state.places.current_place(session.id).await.unwrap().is_none());

        let first = state
            .places
            .replace_place(session.id, PlaceType::Online, online("zoom", "https://x"))
            .await
            .unwrap();
        assert_eq!(first.place_type(), PlaceType::Online);

        let second = state
            .places
            .replace_place(session.id, PlaceType::GivenVenue, venue("Hall A", "Downtown"))
            .await
            .unwrap();
        assert_eq!(second.umbrella.session_id, session.id);

        let current = state.places.current_place(session.id).await.unwrap().unwrap();
        assert_eq!(current, second);
        match &current.variant {
            PlaceVariant::GivenVenue(v) => {
                assert_eq!(v.name, "Hall A");
                assert_eq!(v.location, "Downtown");
            }
            other => panic!("expected a given venue, got {:?}", other),
        }

        assert_eq!(count(&state, "session_places").await, 1);
        assert_eq!(count(&state, "session_places_online").await, 0);
        assert_eq!(count(&state, "session_places_given_venue").await, 1);
    }

    #[tokio::test]
    async fn test_fields_must_match_the_place_type() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let session = setup_session(&state).await;

        let wrong = state
            .places
            .replace_place(session.id, PlaceType::Online, venue("Hall A", "Downtown"))
            .await
            .unwrap_err();
        assert_eq!(wrong.kind(), ErrorKind::Validation);
        assert_eq!(wrong.code(), Some("ERR_SES_PLC_01"));

        let incomplete = state
            .places
            .replace_place(
                session.id,
                PlaceType::GivenVenue,
                PlaceFieldsDTO {
                    name: Some("Hall A".to_string()),
                    ..PlaceFieldsDTO::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(incomplete.kind(), ErrorKind::Validation);

        assert_eq!(count(&state, "session_places").await, 0);
    }

    #[tokio::test]
    async fn test_member_home_takes_no_fields() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let session = setup_session(&state).await;

        let home = state
            .places
            .replace_place(session.id, PlaceType::MemberHome, PlaceFieldsDTO::default())
            .await
            .unwrap();
        assert!(matches!(home.variant, PlaceVariant::MemberHome(_)));

        let err = state
            .places
            .update_place(session.id, online("meet", "https://y"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_update_keeps_the_type_and_merges_fields() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let session = setup_session(&state).await;

        state
            .places
            .replace_place(session.id, PlaceType::Online, online("zoom", "https://x"))
            .await
            .unwrap();

        let updated = state
            .places
            .update_place(
                session.id,
                PlaceFieldsDTO {
                    link: Some("https://y".to_string()),
                    ..PlaceFieldsDTO::default()
                },
            )
            .await
            .unwrap();

        match updated.variant {
            PlaceVariant::Online(v) => {
                assert_eq!(v.platform, "zoom");
                assert_eq!(v.link, "https://y");
            }
            other => panic!("expected an online place, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_removes_both_halves() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let session = setup_session(&state).await;

        let missing = state.places.delete_place(session.id).await.unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        state
            .places
            .replace_place(session.id, PlaceType::Online, online("zoom", "https://x"))
            .await
            .unwrap();
        state.places.delete_place(session.id).await.unwrap();

        assert!(state.places.current_place(session.id).await.unwrap().is_none());
        assert_eq!(count(&state, "session_places").await, 0);
        assert_eq!(count(&state, "session_places_online").await, 0);

        let err = state
            .places
            .update_place(session.id, online("zoom", "https://x"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("ERR_SES_PLC_08"));
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_the_previous_place() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let session = setup_session(&state).await;

        let original = state
            .places
            .replace_place(session.id, PlaceType::Online, online("zoom", "https://x"))
            .await
            .unwrap();

        sqlx::query(
            "CREATE TRIGGER reject_venues BEFORE INSERT ON session_places_given_venue
             BEGIN SELECT RAISE(ABORT, 'venues are closed'); END",
        )
        .execute(state.gateway.pool())
        .await
        .unwrap();

        let err = state
            .places
            .replace_place(session.id, PlaceType::GivenVenue, venue("Hall A", "Downtown"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("ERR_SES_PLC_07"));

        // teardown of the online place and the new umbrella are both rolled back
        let current = state.places.current_place(session.id).await.unwrap().unwrap();
        assert_eq!(current, original);
        assert_eq!(count(&state, "session_places").await, 1);
        assert_eq!(count(&state, "session_places_online").await, 1);
        assert_eq!(count(&state, "session_places_given_venue").await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_replaces_on_a_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_file_state(Arc::new(FakeSender::new()), dir.path(), &test_config()).await;
        let session_id = setup_session(&state).await.id;

        let mut tasks = JoinSet::new();
        for n in 0..12 {
            let state = state.clone();
            tasks.spawn(async move {
                let fields = if n % 2 == 0 {
                    online("zoom", &format!("https://x/{}", n))
                } else {
                    venue(&format!("Hall {}", n), "Downtown")
                };
                let place_type = if n % 2 == 0 {
                    PlaceType::Online
                } else {
                    PlaceType::GivenVenue
                };
                state.places.replace_place(session_id, place_type, fields).await
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined.unwrap() {
                failures.push(e.to_string());
            }
        }
        assert!(failures.is_empty(), "replaces failed: {:?}", failures);

        // exactly one umbrella, with exactly one variant row of its own type
        assert_eq!(count(&state, "session_places").await, 1);
        let variants = count(&state, "session_places_online").await
            + count(&state, "session_places_given_venue").await;
        assert_eq!(variants, 1);
        assert!(state.places.current_place(session_id).await.unwrap().is_some());
    }
}
