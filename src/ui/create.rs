use super::ViewError;
use crate::api::client::ApiClient;
use crate::api::models::{NewNotice, Notice};
use crate::moderation::ALL_GROUPS;
use log::info;

/// Standalone create page: posts to every group and attaches the official
/// list so the backend knows where "All Groups" fans out to.
pub async fn create_notice(
    client: &ApiClient,
    title: &str,
    content: &str,
) -> Result<Option<Notice>, ViewError> {
    let (title, content) = (title.trim(), content.trim());
    if title.is_empty() || content.is_empty() {
        return Err(ViewError::Validation("title and content are required".into()));
    }
    let official = client.official_groups().await?;
    let body = NewNotice {
        title: title.to_string(),
        content: content.to_string(),
        category: None,
        group_name: Some(ALL_GROUPS.to_string()),
        approved_groups: Some(official),
    };
    let created = client.create_notice(&body).await?;
    let fan_out = body.approved_groups.as_ref().map_or(0, Vec::len);
    info!("created \"{title}\" for {fan_out} official groups");
    Ok(created)
}
