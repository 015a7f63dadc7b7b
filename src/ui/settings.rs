use super::{ViewError, groups};
use crate::api::client::ApiClient;
use crate::api::models::Notice;
use crate::moderation::{ModerationState, group_key};
use crate::refresh::fetch_snapshot;
use crate::storage::LocalStore;
use std::sync::Arc;

/// Group settings page: official groups plus the ones waiting for a decision.
pub struct SettingsView {
    client: Arc<ApiClient>,
    store: LocalStore,
    groups: ModerationState,
    notices: Vec<Notice>,
}

impl SettingsView {
    pub fn new(client: Arc<ApiClient>, store: LocalStore) -> Result<Self, ViewError> {
        let blocked = store.blocked_groups()?;
        Ok(Self {
            client,
            store,
            groups: ModerationState::new(Vec::new(), blocked),
            notices: Vec::new(),
        })
    }

    pub fn official(&self) -> &[String] {
        self.groups.official()
    }

    pub fn blocked(&self) -> &[String] {
        self.groups.blocked()
    }

    /// Groups seen on the last loaded notices that are neither official nor blocked.
    pub fn pending(&self) -> Vec<String> {
        self.groups.pending_groups(&self.notices)
    }

    /// Reload the official list and rediscover pending groups from the notices.
    pub async fn load(&mut self) -> Result<(), ViewError> {
        let snapshot = fetch_snapshot(&self.client).await?;
        self.groups.set_official(snapshot.official_groups);
        self.notices = snapshot.notices;
        Ok(())
    }

    pub async fn approve(&mut self, name: &str) -> Result<bool, ViewError> {
        groups::approve(&self.client, &mut self.groups, name).await
    }

    pub fn reject(&mut self, name: &str) -> Result<bool, ViewError> {
        groups::reject(&self.store, &mut self.groups, name)
    }

    /// Drop an official group. With `purge` its notices are deleted too and
    /// forgotten locally; otherwise they surface as pending again.
    pub async fn remove(&mut self, name: &str, purge: bool) -> Result<bool, ViewError> {
        let changed = groups::remove(&self.client, &mut self.groups, name, purge).await?;
        if changed && purge {
            let key = group_key(name);
            self.notices
                .retain(|n| n.group_name.as_deref().is_none_or(|g| group_key(g) != key));
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::{client_for, notice_json};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_board(server: &MockServer, official: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/notices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                notice_json(1, Some("Chemistry")),
                notice_json(2, Some("Chemistry")),
                notice_json(3, Some("All Groups")),
                notice_json(4, Some("Drama")),
                notice_json(5, Some("Physics")),
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/notices/settings/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(official))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn load_discovers_pending_groups() {
        let server = MockServer::start().await;
        mount_board(&server, json!("physics")).await;
        let store = LocalStore::in_memory().unwrap();
        store.save_blocked_groups(&["Drama".to_string()]).unwrap();

        let mut view = SettingsView::new(client_for(&server), store).unwrap();
        view.load().await.unwrap();
        assert_eq!(view.official(), ["physics"]);
        assert_eq!(view.pending(), ["Chemistry"]);
        assert_eq!(view.blocked(), ["Drama"]);
    }

    #[tokio::test]
    async fn approving_clears_pending_entry() {
        let server = MockServer::start().await;
        mount_board(&server, json!([])).await;
        Mock::given(method("POST"))
            .and(path("/notices/settings/groups"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let store = LocalStore::in_memory().unwrap();
        let mut view = SettingsView::new(client_for(&server), store).unwrap();
        view.load().await.unwrap();
        assert_eq!(view.pending(), ["Chemistry", "Drama", "Physics"]);

        assert!(view.approve("Chemistry").await.unwrap());
        assert!(view.reject("Drama").unwrap());
        assert_eq!(view.official(), ["Chemistry"]);
        assert_eq!(view.pending(), ["Physics"]);
    }

    #[tokio::test]
    async fn removed_group_returns_to_pending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([notice_json(
                1,
                Some("Chemistry"),
            )])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/notices/settings/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Chemistry"])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/notices/settings/groups"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let store = LocalStore::in_memory().unwrap();
        let mut view = SettingsView::new(client_for(&server), store).unwrap();
        view.load().await.unwrap();
        assert!(view.pending().is_empty());

        assert!(view.remove("Chemistry", false).await.unwrap());
        assert!(view.official().is_empty());
        assert_eq!(view.pending(), ["Chemistry"]);
    }
}
