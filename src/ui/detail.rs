use super::ViewError;
use crate::api::client::ApiClient;
use crate::api::models::Notice;

/// A single notice looked up by id.
pub struct DetailView {
    pub id: i64,
    notice: Option<Notice>,
}

impl DetailView {
    pub fn new(id: i64) -> Self {
        Self { id, notice: None }
    }

    pub async fn load(&mut self, client: &ApiClient) -> Result<&Notice, ViewError> {
        let notice = client.get_notice(self.id).await?;
        Ok(self.notice.insert(notice))
    }
}
