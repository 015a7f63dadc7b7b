use super::{ViewError, groups};
use crate::api::client::ApiClient;
use crate::api::events::RefreshEvent;
use crate::api::models::{NewNotice, Notice, Snapshot};
use crate::moderation::{ALL_GROUPS, ModerationState, group_key};
use crate::refresh::fetch_snapshot;
use crate::storage::LocalStore;
use log::{error, info};
use std::sync::Arc;

const REPLY_TITLE: &str = "Admin Reply";
const REPLY_CATEGORY: &str = "Reply";
const POST_CATEGORY: &str = "General";

/// The compose form.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeDraft {
    pub title: String,
    pub content: String,
    pub group: String,
}

impl Default for ComposeDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            group: ALL_GROUPS.to_string(),
        }
    }
}

/// Reply dock: the notice being answered and the text typed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyDock {
    pub target: Notice,
    pub text: String,
}

/// The main notice board.
pub struct BoardView {
    client: Arc<ApiClient>,
    store: LocalStore,
    notices: Vec<Notice>,
    groups: ModerationState,
    last_seq: u64,
    last_error: Option<String>,
    pub draft: ComposeDraft,
    reply: Option<ReplyDock>,
    selected: Option<Notice>,
}

impl BoardView {
    /// Activate the board. The blocked list is read from the store once, here.
    pub fn new(client: Arc<ApiClient>, store: LocalStore) -> Result<Self, ViewError> {
        let blocked = store.blocked_groups()?;
        Ok(Self {
            client,
            store,
            notices: Vec::new(),
            groups: ModerationState::new(Vec::new(), blocked),
            last_seq: 0,
            last_error: None,
            draft: ComposeDraft::default(),
            reply: None,
            selected: None,
        })
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn groups(&self) -> &ModerationState {
        &self.groups
    }

    pub fn visible_notices(&self) -> Vec<&Notice> {
        self.groups.visible_notices(&self.notices)
    }

    pub fn pending_groups(&self) -> Vec<String> {
        self.groups.pending_groups(&self.notices)
    }

    pub fn available_groups(&self) -> Vec<String> {
        self.groups.available_groups()
    }

    pub fn reply_dock(&self) -> Option<&ReplyDock> {
        self.reply.as_ref()
    }

    pub fn selected(&self) -> Option<&Notice> {
        self.selected.as_ref()
    }

    /// Why the most recent refresh failed, until a later one succeeds.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn replace(&mut self, snapshot: Snapshot) -> bool {
        let changed = self.last_error.take().is_some()
            || snapshot.notices != self.notices
            || snapshot.official_groups != self.groups.official();
        self.notices = snapshot.notices;
        self.groups.set_official(snapshot.official_groups);
        changed
    }

    /// Apply a refresh event. Returns whether the displayed data changed.
    /// Snapshots older than the last one applied are ignored.
    pub fn apply(&mut self, event: RefreshEvent) -> bool {
        if event.seq() <= self.last_seq {
            return false;
        }
        match event {
            RefreshEvent::Refreshed { seq, snapshot } => {
                self.last_seq = seq;
                self.replace(snapshot)
            }
            RefreshEvent::Failed { reason, .. } => {
                let changed = self.last_error.as_deref() != Some(reason.as_str());
                self.last_error = Some(reason);
                changed
            }
        }
    }

    /// Fetch outside the refresh loop, e.g. for one-shot commands.
    pub async fn refresh(&mut self) -> Result<bool, ViewError> {
        let snapshot = fetch_snapshot(&self.client).await?;
        Ok(self.replace(snapshot))
    }

    fn find(&self, id: i64) -> Result<&Notice, ViewError> {
        self.notices
            .iter()
            .find(|n| n.id == id)
            .ok_or(ViewError::NotFound(id))
    }

    /// Pick the compose target from the dropdown entries.
    pub fn select_group(&mut self, name: &str) -> Result<(), ViewError> {
        let key = group_key(name);
        let choice = self
            .available_groups()
            .into_iter()
            .find(|g| group_key(g) == key)
            .ok_or_else(|| {
                ViewError::Validation(format!("{} is not an official group", name.trim()))
            })?;
        self.draft.group = choice;
        Ok(())
    }

    /// Broadcast the compose draft. Title and content are cleared on success;
    /// the chosen group stays selected.
    pub async fn post(&mut self) -> Result<Option<Notice>, ViewError> {
        let title = self.draft.title.trim();
        let content = self.draft.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(ViewError::Validation("title and content are required".into()));
        }
        let body = NewNotice {
            title: title.to_string(),
            content: content.to_string(),
            category: Some(POST_CATEGORY.to_string()),
            group_name: Some(self.draft.group.clone()),
            approved_groups: None,
        };
        let created = self.client.create_notice(&body).await.map_err(|e| {
            error!("failed to post notice: {e}");
            ViewError::from(e)
        })?;
        info!("posted \"{}\" to {}", body.title, body.group_name.as_deref().unwrap_or(ALL_GROUPS));
        self.draft.title.clear();
        self.draft.content.clear();
        Ok(created)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ViewError> {
        self.client.delete_notice(id).await.map_err(|e| {
            error!("failed to delete notice {id}: {e}");
            ViewError::from(e)
        })?;
        info!("deleted notice {id}");
        Ok(())
    }

    /// Delete every notice on the backend, then empty the local list.
    pub async fn clear_all(&mut self) -> Result<(), ViewError> {
        self.client.clear_all().await.map_err(|e| {
            error!("failed to clear notices: {e}");
            ViewError::from(e)
        })?;
        self.notices.clear();
        info!("cleared all notices");
        Ok(())
    }

    pub fn open_reply(&mut self, id: i64) -> Result<(), ViewError> {
        let target = self.find(id)?.clone();
        self.reply = Some(ReplyDock { target, text: String::new() });
        Ok(())
    }

    pub fn set_reply_text(&mut self, text: &str) -> Result<(), ViewError> {
        let dock = self.reply.as_mut().ok_or(ViewError::NoReplyTarget)?;
        dock.text = text.to_string();
        Ok(())
    }

    pub fn cancel_reply(&mut self) {
        self.reply = None;
    }

    /// Send the dock's text as a new notice to the target's group.
    pub async fn send_reply(&mut self) -> Result<Option<Notice>, ViewError> {
        let dock = self.reply.as_ref().ok_or(ViewError::NoReplyTarget)?;
        let text = dock.text.trim();
        if text.is_empty() {
            return Err(ViewError::Validation("reply is empty".into()));
        }
        let body = NewNotice {
            title: REPLY_TITLE.to_string(),
            content: text.to_string(),
            category: Some(REPLY_CATEGORY.to_string()),
            group_name: dock.target.group_name.clone(),
            approved_groups: None,
        };
        let created = self.client.create_notice(&body).await.map_err(|e| {
            error!("reply to notice {} failed: {e}", dock.target.id);
            ViewError::from(e)
        })?;
        info!("replied to notice {}", dock.target.id);
        self.reply = None;
        Ok(created)
    }

    /// Open the detail modal for a notice on the board.
    pub fn select(&mut self, id: i64) -> Result<(), ViewError> {
        self.selected = Some(self.find(id)?.clone());
        Ok(())
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    /// The modal's reply button: close the modal and dock a reply to its notice.
    pub fn reply_from_detail(&mut self) -> Result<(), ViewError> {
        let target = self.selected.take().ok_or(ViewError::NoReplyTarget)?;
        self.reply = Some(ReplyDock { target, text: String::new() });
        Ok(())
    }

    pub async fn approve(&mut self, name: &str) -> Result<bool, ViewError> {
        groups::approve(&self.client, &mut self.groups, name).await
    }

    pub fn reject(&mut self, name: &str) -> Result<bool, ViewError> {
        groups::reject(&self.store, &mut self.groups, name)
    }

    pub async fn remove(&mut self, name: &str, purge: bool) -> Result<bool, ViewError> {
        groups::remove(&self.client, &mut self.groups, name, purge).await
    }
}
