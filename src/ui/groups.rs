//! Group moderation actions shared by the board and settings views.
//!
//! Every action writes first and commits to [`ModerationState`] only after the
//! write succeeds, so a failed request leaves the local lists untouched.

use super::ViewError;
use crate::api::client::ApiClient;
use crate::moderation::{ALL_GROUPS, ModerationState, group_key};
use crate::storage::LocalStore;
use log::{error, info};

fn validate(name: &str) -> Result<&str, ViewError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ViewError::Validation("group name is required".into()));
    }
    if group_key(name) == group_key(ALL_GROUPS) {
        return Err(ViewError::Validation(format!("\"{ALL_GROUPS}\" cannot be moderated")));
    }
    Ok(name)
}

/// pending -> official. Returns `false` when the group was already official.
pub async fn approve(
    client: &ApiClient,
    state: &mut ModerationState,
    name: &str,
) -> Result<bool, ViewError> {
    let name = validate(name)?;
    if state.is_official(name) {
        return Ok(false);
    }
    let proposed = state.with_approved(name);
    if let Err(e) = client.save_official_groups(&proposed).await {
        error!("approving {name} failed: {e}");
        return Err(e.into());
    }
    state.set_official(proposed);
    info!("approved group {name}");
    Ok(true)
}

/// pending -> blocked. Only the local store is written.
pub fn reject(
    store: &LocalStore,
    state: &mut ModerationState,
    name: &str,
) -> Result<bool, ViewError> {
    let name = validate(name)?;
    if state.is_official(name) {
        return Err(ViewError::Validation(format!("{name} is official; remove it first")));
    }
    if state.is_blocked(name) {
        return Ok(false);
    }
    let proposed = state.with_blocked(name);
    if let Err(e) = store.save_blocked_groups(&proposed) {
        error!("blocking {name} failed: {e}");
        return Err(e.into());
    }
    state.set_blocked(proposed);
    info!("blocked group {name}");
    Ok(true)
}

/// official -> removed, optionally purging the group's notices afterwards.
pub async fn remove(
    client: &ApiClient,
    state: &mut ModerationState,
    name: &str,
    purge: bool,
) -> Result<bool, ViewError> {
    let name = validate(name)?;
    if !state.is_official(name) {
        return Ok(false);
    }
    let key = group_key(name);
    let spelling = state
        .official()
        .iter()
        .find(|g| group_key(g) == key)
        .cloned()
        .unwrap_or_else(|| name.to_string());
    let proposed = state.without(name);
    if let Err(e) = client.save_official_groups(&proposed).await {
        error!("removing {name} failed: {e}");
        return Err(e.into());
    }
    state.set_official(proposed);
    info!("removed group {spelling}");
    if purge {
        client.delete_group(&spelling).await.map_err(|e| {
            error!("purging notices of {spelling} failed: {e}");
            ViewError::from(e)
        })?;
        info!("purged notices of {spelling}");
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::client_for;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn approval_commits_after_remote_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notices/settings/groups"))
            .and(body_json(json!({"groups": ["Physics", "Chemistry"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut state = ModerationState::new(vec!["Physics".into()], Vec::new());
        assert!(approve(&client, &mut state, " Chemistry ").await.unwrap());
        assert_eq!(state.official(), ["Physics", "Chemistry"]);
        assert!(!approve(&client, &mut state, "chemistry").await.unwrap());
    }

    #[tokio::test]
    async fn failed_approval_leaves_state_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notices/settings/groups"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut state = ModerationState::new(vec!["Physics".into()], Vec::new());
        let err = approve(&client, &mut state, "Chemistry").await.unwrap_err();
        assert!(matches!(err, ViewError::Api(_)));
        assert_eq!(state.official(), ["Physics"]);
    }

    #[test]
    fn rejection_stays_local() {
        let store = LocalStore::in_memory().unwrap();
        let mut state = ModerationState::new(vec!["Physics".into()], Vec::new());

        assert!(reject(&store, &mut state, "Drama").unwrap());
        assert_eq!(state.blocked(), ["Drama"]);
        assert_eq!(state.official(), ["Physics"]);
        assert_eq!(store.blocked_groups().unwrap(), vec!["Drama"]);
        assert!(!reject(&store, &mut state, " DRAMA").unwrap());
        assert!(matches!(
            reject(&store, &mut state, "physics"),
            Err(ViewError::Validation(_))
        ));
    }

    #[test]
    fn sentinel_cannot_be_moderated() {
        let store = LocalStore::in_memory().unwrap();
        let mut state = ModerationState::default();
        assert!(matches!(
            reject(&store, &mut state, "all groups"),
            Err(ViewError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn removal_with_purge() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notices/settings/groups"))
            .and(body_json(json!({"groups": ["Physics"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/notices/group/Chemistry"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let official = vec!["Physics".into(), "Chemistry".into()];
        let mut state = ModerationState::new(official, Vec::new());
        assert!(remove(&client, &mut state, "chemistry", true).await.unwrap());
        assert_eq!(state.official(), ["Physics"]);
        assert!(!remove(&client, &mut state, "Drama", false).await.unwrap());
    }

    #[tokio::test]
    async fn failed_removal_leaves_official_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notices/settings/groups"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let official = vec!["Physics".into(), "Chemistry".into()];
        let mut state = ModerationState::new(official, Vec::new());
        let err = remove(&client, &mut state, "Chemistry", true).await.unwrap_err();
        assert!(matches!(err, ViewError::Api(_)));
        assert_eq!(state.official(), ["Physics", "Chemistry"]);
    }

    #[tokio::test]
    async fn failed_purge_keeps_the_removal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notices/settings/groups"))
            .and(body_json(json!({"groups": ["Physics"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/notices/group/Chemistry"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let official = vec!["Physics".into(), "Chemistry".into()];
        let mut state = ModerationState::new(official, Vec::new());
        let err = remove(&client, &mut state, "Chemistry", true).await.unwrap_err();
        assert!(matches!(err, ViewError::Api(_)));
        assert_eq!(state.official(), ["Physics"]);
    }
}
