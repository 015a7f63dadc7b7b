//! Plain-text rendering of the views.

use super::board::BoardView;
use super::settings::SettingsView;
use crate::api::models::Notice;
use std::fmt::Write;

const PREVIEW_LINES: usize = 2;
const PREVIEW_CHARS: usize = 160;

fn timestamp(notice: &Notice) -> String {
    match notice.created() {
        Some(dt) => dt.format("%d %b %Y %H:%M").to_string(),
        None => notice.created_at.clone(),
    }
}

/// First two lines of the message, cut to a readable width.
pub fn preview(message: &str) -> String {
    let mut text = message.lines().take(PREVIEW_LINES).collect::<Vec<_>>().join(" ");
    if text.chars().count() > PREVIEW_CHARS {
        text = text.chars().take(PREVIEW_CHARS - 1).collect();
        text.push('…');
    } else if message.lines().count() > PREVIEW_LINES {
        text.push('…');
    }
    text
}

pub fn notice_row(notice: &Notice) -> String {
    let mut out = format!("#{} {}", notice.id, notice.name);
    if let Some(group) = &notice.group_name {
        let _ = write!(out, " [{group}]");
    }
    let _ = write!(out, "  {}\n    \"{}\"", timestamp(notice), preview(&notice.message));
    out
}

pub fn notice_list<'a>(notices: impl IntoIterator<Item = &'a Notice>) -> String {
    let rows: Vec<String> = notices.into_iter().map(notice_row).collect();
    if rows.is_empty() {
        "No notices available.".to_string()
    } else {
        rows.join("\n")
    }
}

pub fn detail(notice: &Notice) -> String {
    format!(
        "{}\nGroup: {}\n{}\n\n{}",
        notice.name,
        notice.group_name.as_deref().unwrap_or("General"),
        timestamp(notice),
        notice.message
    )
}

pub fn board(view: &BoardView) -> String {
    let mut out = String::from("== Recent Activities ==\n");
    out.push_str(&notice_list(view.visible_notices()));

    let hidden = view.notices().len() - view.visible_notices().len();
    if hidden > 0 {
        let _ = write!(out, "\n({hidden} notices from unapproved groups hidden)");
    }

    if let Some(reason) = view.last_error() {
        let _ = write!(out, "\nLast refresh failed: {reason}");
    }

    let pending = view.pending_groups();
    if !pending.is_empty() {
        let _ = write!(out, "\n\nNew groups awaiting a decision: {}", pending.join(", "));
    }
    let _ = write!(out, "\nPost to: {}", view.available_groups().join(" | "));

    if let Some(dock) = view.reply_dock() {
        let _ = write!(
            out,
            "\n\n-- Replying to {} ({}) --",
            dock.target.group_name.as_deref().unwrap_or("General"),
            dock.target.name
        );
    }
    if let Some(notice) = view.selected() {
        let _ = write!(out, "\n\n-- Notice --\n{}", detail(notice));
    }
    out
}

pub fn settings(view: &SettingsView) -> String {
    let list = |items: &[String]| {
        if items.is_empty() {
            "(none)".to_string()
        } else {
            items.join(", ")
        }
    };
    format!(
        "Official groups: {}\nPending groups:  {}\nBlocked groups:  {}",
        list(view.official()),
        list(&view.pending()),
        list(view.blocked())
    )
}
