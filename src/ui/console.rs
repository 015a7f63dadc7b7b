//! Interactive board: the refresh loop runs in the background while commands
//! are read line by line from stdin.

use super::board::BoardView;
use super::render;
use crate::api::client::ApiClient;
use crate::refresh;
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub const HELP: &str = "\
commands:
  list                              redraw the board
  refresh                           fetch now
  post <title> | <content> [| <group>]
  show <id> / close                 open or close a notice
  reply [<id>] [<text>]             dock a reply (no id: reply to the open notice)
  send <text> / cancel              send or discard the docked reply
  delete <id> / clear-all
  approve <group> / reject <group> / remove <group> [--purge]
  help / quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    List,
    Refresh,
    Post { title: String, content: String, group: Option<String> },
    Show(i64),
    Close,
    Reply { id: Option<i64>, text: Option<String> },
    Send(String),
    Cancel,
    Delete(i64),
    ClearAll,
    Approve(String),
    Reject(String),
    Remove { name: String, purge: bool },
    Quit,
}

fn parse_id(arg: &str) -> Result<i64, String> {
    arg.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("not a notice id: {arg}"))
}

fn required(rest: &str, what: &str) -> Result<String, String> {
    let rest = rest.trim();
    if rest.is_empty() {
        Err(format!("{what} is required"))
    } else {
        Ok(rest.to_string())
    }
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match word.to_lowercase().as_str() {
        "" | "list" | "ls" => Ok(Command::List),
        "help" | "?" => Ok(Command::Help),
        "refresh" => Ok(Command::Refresh),
        "post" => {
            let mut parts = rest.splitn(3, '|').map(str::trim);
            let title = parts.next().unwrap_or_default().to_string();
            let content = parts.next().unwrap_or_default().to_string();
            let group = parts.next().filter(|g| !g.is_empty()).map(str::to_string);
            Ok(Command::Post { title, content, group })
        }
        "show" | "view" => Ok(Command::Show(parse_id(&required(rest, "notice id")?)?)),
        "close" => Ok(Command::Close),
        "reply" => {
            if rest.is_empty() {
                return Ok(Command::Reply { id: None, text: None });
            }
            let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let text = Some(text.trim()).filter(|t| !t.is_empty()).map(str::to_string);
            Ok(Command::Reply { id: Some(parse_id(id)?), text })
        }
        "send" => Ok(Command::Send(required(rest, "reply text")?)),
        "cancel" => Ok(Command::Cancel),
        "delete" | "rm" => Ok(Command::Delete(parse_id(&required(rest, "notice id")?)?)),
        "clear-all" => Ok(Command::ClearAll),
        "approve" => Ok(Command::Approve(required(rest, "group name")?)),
        "reject" => Ok(Command::Reject(required(rest, "group name")?)),
        "remove" => {
            let (name, purge) = match rest.strip_suffix("--purge") {
                Some(name) => (name, true),
                None => (rest, false),
            };
            Ok(Command::Remove { name: required(name, "group name")?, purge })
        }
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command: {other} (try help)")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Confirmation {
    Delete(i64),
    ClearAll { second: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Print this.
    Show(String),
    /// Print this; backend data changed so the board should refresh now.
    Changed(String),
    Quit,
}

/// Command interpreter over a [`BoardView`].
pub struct Console {
    board: BoardView,
    assume_yes: bool,
    awaiting: Option<Confirmation>,
}

impl Console {
    pub fn new(board: BoardView, assume_yes: bool) -> Self {
        Self { board, assume_yes, awaiting: None }
    }

    pub fn board(&self) -> &BoardView {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut BoardView {
        &mut self.board
    }

    pub async fn handle_line(&mut self, line: &str) -> Outcome {
        if let Some(pending) = self.awaiting.take() {
            let yes = matches!(line.trim().to_lowercase().as_str(), "y" | "yes");
            if !yes {
                return Outcome::Show("Cancelled.".into());
            }
            return self.confirmed(pending).await;
        }
        match parse(line) {
            Ok(cmd) => self.execute(cmd).await,
            Err(msg) => Outcome::Show(msg),
        }
    }

    fn ask(&mut self, confirmation: Confirmation) -> Outcome {
        let prompt = match confirmation {
            Confirmation::Delete(_) => "Delete this notice? (y/N)",
            Confirmation::ClearAll { second: false } => {
                "ARE YOU SURE? This will permanently delete ALL notices from the database. (y/N)"
            }
            Confirmation::ClearAll { second: true } => {
                "Final warning: This cannot be undone. Clear everything? (y/N)"
            }
        };
        self.awaiting = Some(confirmation);
        Outcome::Show(prompt.into())
    }

    async fn confirmed(&mut self, confirmation: Confirmation) -> Outcome {
        match confirmation {
            Confirmation::Delete(id) => match self.board.delete(id).await {
                Ok(()) => Outcome::Changed(format!("Deleted notice {id}.")),
                Err(e) => Outcome::Show(format!("Delete failed: {e}")),
            },
            Confirmation::ClearAll { second: false } => {
                self.ask(Confirmation::ClearAll { second: true })
            }
            Confirmation::ClearAll { second: true } => match self.board.clear_all().await {
                Ok(()) => Outcome::Changed("All notices cleared successfully.".into()),
                Err(e) => Outcome::Show(format!("Failed to clear notices: {e}")),
            },
        }
    }

    async fn execute(&mut self, cmd: Command) -> Outcome {
        match cmd {
            Command::Help => Outcome::Show(HELP.into()),
            Command::List => Outcome::Show(render::board(&self.board)),
            Command::Refresh => Outcome::Changed("Refreshing…".into()),
            Command::Quit => Outcome::Quit,
            Command::Post { title, content, group } => {
                if let Some(group) = group {
                    if let Err(e) = self.board.select_group(&group) {
                        return Outcome::Show(e.to_string());
                    }
                }
                self.board.draft.title = title;
                self.board.draft.content = content;
                match self.board.post().await {
                    Ok(_) => Outcome::Changed(format!("Broadcast to {}.", self.board.draft.group)),
                    Err(e) => Outcome::Show(format!("Failed to post notice: {e}")),
                }
            }
            Command::Show(id) => match self.board.select(id) {
                Ok(()) => {
                    let text = self.board.selected().map(render::detail);
                    Outcome::Show(text.unwrap_or_default())
                }
                Err(e) => Outcome::Show(e.to_string()),
            },
            Command::Close => {
                self.board.close_detail();
                Outcome::Show(String::new())
            }
            Command::Reply { id, text } => {
                let docked = match id {
                    Some(id) => self.board.open_reply(id),
                    None => self.board.reply_from_detail(),
                };
                if let Err(e) = docked {
                    return Outcome::Show(e.to_string());
                }
                match text {
                    Some(text) => self.send(&text).await,
                    None => {
                        let target = self.board.reply_dock().map_or("", |d| d.target.name.as_str());
                        Outcome::Show(format!("Replying to {target}. Type: send <text>"))
                    }
                }
            }
            Command::Send(text) => self.send(&text).await,
            Command::Cancel => {
                self.board.cancel_reply();
                Outcome::Show("Reply discarded.".into())
            }
            Command::Delete(id) if self.assume_yes => {
                self.confirmed(Confirmation::Delete(id)).await
            }
            Command::Delete(id) => self.ask(Confirmation::Delete(id)),
            Command::ClearAll if self.assume_yes => {
                self.confirmed(Confirmation::ClearAll { second: true }).await
            }
            Command::ClearAll => self.ask(Confirmation::ClearAll { second: false }),
            Command::Approve(name) => match self.board.approve(&name).await {
                Ok(true) => Outcome::Changed(format!("{name} is now official.")),
                Ok(false) => Outcome::Show(format!("{name} is already official.")),
                Err(e) => Outcome::Show(format!("Could not approve {name}: {e}")),
            },
            Command::Reject(name) => match self.board.reject(&name) {
                Ok(true) => Outcome::Show(format!("{name} blocked on this device.")),
                Ok(false) => Outcome::Show(format!("{name} is already blocked.")),
                Err(e) => Outcome::Show(format!("Could not block {name}: {e}")),
            },
            Command::Remove { name, purge } => match self.board.remove(&name, purge).await {
                Ok(true) => Outcome::Changed(format!("{name} removed.")),
                Ok(false) => Outcome::Show(format!("{name} is not an official group.")),
                Err(e) => Outcome::Show(format!("Could not remove {name}: {e}")),
            },
        }
    }

    async fn send(&mut self, text: &str) -> Outcome {
        if let Err(e) = self.board.set_reply_text(text) {
            return Outcome::Show(e.to_string());
        }
        match self.board.send_reply().await {
            Ok(_) => Outcome::Changed("Reply sent.".into()),
            Err(e) => Outcome::Show(format!("Reply failed: {e}")),
        }
    }
}

/// Run the interactive board until stdin closes, `quit`, or Ctrl-C.
pub async fn run(
    board: BoardView,
    client: Arc<ApiClient>,
    period: Duration,
    assume_yes: bool,
) -> std::io::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = refresh::spawn_for_client(client, period, tx);
    let mut console = Console::new(board, assume_yes);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                if console.board_mut().apply(event) {
                    println!("\n{}", render::board(console.board()));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match console.handle_line(&line).await {
                    Outcome::Quit => break,
                    Outcome::Show(text) => println!("{text}"),
                    Outcome::Changed(text) => {
                        println!("{text}");
                        poller.trigger();
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.stop();
    info!("board closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::RefreshEvent;
    use crate::api::models::Snapshot;
    use crate::storage::LocalStore;
    use crate::ui::testing::{client_for, notice};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse("post Lab closed | No lab today | Chemistry"),
            Ok(Command::Post {
                title: "Lab closed".into(),
                content: "No lab today".into(),
                group: Some("Chemistry".into())
            })
        );
        assert_eq!(
            parse("reply #4 on my way"),
            Ok(Command::Reply { id: Some(4), text: Some("on my way".into()) })
        );
        assert_eq!(parse("reply"), Ok(Command::Reply { id: None, text: None }));
        assert_eq!(
            parse("remove Drama Club --purge"),
            Ok(Command::Remove { name: "Drama Club".into(), purge: true })
        );
        assert_eq!(
            parse("approve  .Net Framework Project "),
            Ok(Command::Approve(".Net Framework Project".into()))
        );
        assert!(parse("delete abc").is_err());
        assert!(parse("approve").is_err());
        assert!(parse("dance").is_err());
    }

    fn console(server: &MockServer, assume_yes: bool) -> Console {
        let store = LocalStore::in_memory().unwrap();
        let mut board = BoardView::new(client_for(server), store).unwrap();
        let snapshot = Snapshot {
            notices: vec![notice(1, None), notice(2, Some("Drama"))],
            official_groups: Vec::new(),
        };
        board.apply(RefreshEvent::Refreshed { seq: 1, snapshot });
        Console::new(board, assume_yes)
    }

    #[tokio::test]
    async fn delete_waits_for_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/notices/1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut console = console(&server, false);
        assert!(matches!(console.handle_line("delete 1").await, Outcome::Show(_)));
        assert_eq!(console.handle_line("n").await, Outcome::Show("Cancelled.".into()));
        console.handle_line("delete 1").await;
        assert!(matches!(console.handle_line("y").await, Outcome::Changed(_)));
    }

    #[tokio::test]
    async fn clear_all_asks_twice() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/notices/clear-all"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut console = console(&server, false);
        console.handle_line("clear-all").await;
        assert!(matches!(console.handle_line("yes").await, Outcome::Show(_)));
        assert!(matches!(console.handle_line("yes").await, Outcome::Changed(_)));
        assert!(console.board().notices().is_empty());
    }

    #[tokio::test]
    async fn show_then_reply_sends_to_group() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notices"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut console = console(&server, true);
        let shown = console.handle_line("show 2").await;
        assert!(matches!(shown, Outcome::Show(ref text) if text.contains("Group: Drama")));
        console.handle_line("reply").await;
        assert!(console.board().reply_dock().is_some());
        assert_eq!(
            console.handle_line("send Rehearsal moved").await,
            Outcome::Changed("Reply sent.".into())
        );
    }

    #[tokio::test]
    async fn reject_keeps_group_off_the_prompt() {
        let server = MockServer::start().await;
        let mut console = console(&server, true);
        let listed = console.handle_line("list").await;
        let prompt = "awaiting a decision: Drama";
        assert!(matches!(listed, Outcome::Show(ref text) if text.contains(prompt)));
        console.handle_line("reject Drama").await;
        assert!(console.board().pending_groups().is_empty());
    }
}
