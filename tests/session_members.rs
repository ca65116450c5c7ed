//! Integration tests per i membri di una sessione

mod common;

#[cfg(test)]
mod session_member_tests {
    use super::common::{FakeSender, create_member, create_test_state};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tschwaa_server::core::{AppState, ErrorKind};
    use tschwaa_server::dtos::{CreateOrganizationDTO, CreateSessionDTO};
    use tschwaa_server::entities::{Organization, Session, SessionMember};

    struct Acme {
        organization: Organization,
        session: Session,
        /// alice (owner), bob, carol
        memberships: [i64; 3],
    }

    async fn found(state: &AppState, founder_phone: &str, name: &str) -> Organization {
        let founder = create_member(state, "Founder", founder_phone).await;
        state
            .memberships
            .create_organization_with_founding_membership(
                founder.id,
                CreateOrganizationDTO {
                    name: name.to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap()
    }

    async fn setup(state: &AppState) -> Acme {
        let organization = found(state, "+237699000001", "Acme").await;
        let owner = state
            .memberships
            .members_of_organization(organization.id)
            .await
            .unwrap()[0]
            .membership_id;

        let mut invited = Vec::new();
        for (phone, token) in [("+237699000002", "bob-token"), ("+237699000003", "carol-token")] {
            let member = create_member(state, "Invitee", phone).await;
            let issued = state
                .memberships
                .issue_invitation(member.id, organization.id, token.to_string())
                .await
                .unwrap();
            invited.push(issued.membership.id);
        }

        let session = state
            .sessions
            .create_session(
                organization.id,
                CreateSessionDTO {
                    start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                },
            )
            .await
            .unwrap();

        Acme {
            organization,
            session,
            memberships: [owner, invited[0], invited[1]],
        }
    }

    fn ids(members: &[SessionMember]) -> Vec<i64> {
        members.iter().map(|m| m.membership_id).collect()
    }

    #[tokio::test]
    async fn test_update_replaces_the_whole_list() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let acme = setup(&state).await;
        let [alice, bob, carol] = acme.memberships;

        let first = state
            .sessions
            .update_session_members(acme.organization.id, acme.session.id, vec![bob, alice, bob])
            .await
            .unwrap();
        assert_eq!(ids(&first), vec![alice, bob]);

        state
            .sessions
            .update_session_members(acme.organization.id, acme.session.id, vec![carol])
            .await
            .unwrap();
        let listed = state
            .sessions
            .session_members(acme.organization.id, acme.session.id)
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![carol]);

        let cleared = state
            .sessions
            .update_session_members(acme.organization.id, acme.session.id, Vec::new())
            .await
            .unwrap();
        assert!(cleared.is_empty());
    }

    #[tokio::test]
    async fn test_memberships_of_another_organization_are_rejected() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let acme = setup(&state).await;
        let [alice, bob, _] = acme.memberships;
        let globex = found(&state, "+237699000009", "Globex").await;
        let outsider = state
            .memberships
            .members_of_organization(globex.id)
            .await
            .unwrap()[0]
            .membership_id;

        state
            .sessions
            .update_session_members(acme.organization.id, acme.session.id, vec![alice])
            .await
            .unwrap();

        let err = state
            .sessions
            .update_session_members(acme.organization.id, acme.session.id, vec![bob, outsider])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), Some("ERR_UPD_SESS_MBR_00"));

        let listed = state
            .sessions
            .session_members(acme.organization.id, acme.session.id)
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![alice]);
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_the_previous_members() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let acme = setup(&state).await;
        let [alice, bob, carol] = acme.memberships;

        state
            .sessions
            .update_session_members(acme.organization.id, acme.session.id, vec![alice, bob])
            .await
            .unwrap();

        sqlx::query(&format!(
            "CREATE TRIGGER reject_carol BEFORE INSERT ON members_of_session
             WHEN NEW.membership_id = {}
             BEGIN SELECT RAISE(ABORT, 'carol is busy'); END",
            carol
        ))
        .execute(state.gateway.pool())
        .await
        .unwrap();

        let err = state
            .sessions
            .update_session_members(acme.organization.id, acme.session.id, vec![alice, carol])
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("ERR_UPD_SESS_MBR_02"));

        // the removal of alice and bob is rolled back with the failed insert
        let listed = state
            .sessions
            .session_members(acme.organization.id, acme.session.id)
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![alice, bob]);
    }

    #[tokio::test]
    async fn test_session_must_belong_to_the_organization() {
        let state = create_test_state(Arc::new(FakeSender::new())).await;
        let acme = setup(&state).await;
        let globex = found(&state, "+237699000009", "Globex").await;

        let err = state
            .sessions
            .update_session_members(globex.id, acme.session.id, Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = state
            .sessions
            .session_members(globex.id, acme.session.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
