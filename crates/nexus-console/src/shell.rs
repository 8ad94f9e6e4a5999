//! Command parsing and dispatch for the console.

use std::fmt::Write as _;

use anyhow::{bail, Context};

use nexus_core::{Engine, RelationChange};
use nexus_shared::{Category, MessageKind};

const HELP: &str = "\
commands:
  login <email> <secret>      sign in
  guest                       browse as a guest
  logout                      sign out
  whoami                      show the signed-in user
  users                       list everyone
  feed [community|announcement]
  post <text>                 publish to the community feed
  announce <text>             publish an announcement (admins)
  like <post-id>
  comment <post-id> <text>
  comments <post-id>
  friend <user-id>            befriend or unfriend
  block <user-id>             block or unblock
  send [--kind text|image|file] <user|group|ai-natch> <text>
  chat <user|group|ai-natch>  show a conversation
  read <user-id>              mark a conversation read
  group <name> <id,id,...>    create a group
  groups                      groups you belong to
  notes                       active notifications
  dismiss <notification-id>
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { email: String, secret: String },
    Guest,
    Logout,
    WhoAmI,
    Users,
    Feed(Category),
    Post { category: Category, body: String },
    Like(String),
    Comment { post_id: String, body: String },
    Comments(String),
    Friend(String),
    Block(String),
    Send { to: String, body: String, kind: MessageKind },
    Chat(String),
    Read(String),
    Group { name: String, members: Vec<String> },
    Groups,
    Notes,
    Dismiss(String),
    Quit,
}

pub enum Outcome {
    Continue(String),
    Quit,
}

/// Split off the first whitespace-delimited word.
fn word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(i) => (&input[..i], input[i..].trim_start()),
        None => (input, ""),
    }
}

fn required<'a>(value: &'a str, what: &str) -> anyhow::Result<&'a str> {
    if value.is_empty() {
        bail!("missing {what}");
    }
    Ok(value)
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
        let (verb, rest) = word(line.trim());
        let command = match verb.to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "help" | "?" => Command::Help,
            "login" => {
                let (email, secret) = word(rest);
                Command::Login {
                    email: required(email, "email")?.to_string(),
                    secret: required(secret, "secret")?.to_string(),
                }
            }
            "guest" => Command::Guest,
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "users" => Command::Users,
            "feed" => match rest {
                "" => Command::Feed(Category::Community),
                other => Command::Feed(other.parse::<Category>().context("unknown feed")?),
            },
            "post" => Command::Post {
                category: Category::Community,
                body: required(rest, "text")?.to_string(),
            },
            "announce" => Command::Post {
                category: Category::Announcement,
                body: required(rest, "text")?.to_string(),
            },
            "like" => Command::Like(required(rest, "post id")?.to_string()),
            "comment" => {
                let (post_id, body) = word(rest);
                Command::Comment {
                    post_id: required(post_id, "post id")?.to_string(),
                    body: required(body, "text")?.to_string(),
                }
            }
            "comments" => Command::Comments(required(rest, "post id")?.to_string()),
            "friend" => Command::Friend(required(rest, "user id")?.to_string()),
            "block" => Command::Block(required(rest, "user id")?.to_string()),
            "send" => {
                let (mut to, mut rest) = word(rest);
                let mut kind = MessageKind::Text;
                if to == "--kind" {
                    let (name, tail) = word(rest);
                    kind = required(name, "message kind")?
                        .parse::<MessageKind>()
                        .context("unknown message kind")?;
                    (to, rest) = word(tail);
                }
                Command::Send {
                    to: required(to, "recipient")?.to_string(),
                    body: required(rest, "text")?.to_string(),
                    kind,
                }
            }
            "chat" => Command::Chat(required(rest, "conversation")?.to_string()),
            "read" => Command::Read(required(rest, "user id")?.to_string()),
            "group" => {
                let (name, members) = word(rest);
                Command::Group {
                    name: required(name, "group name")?.to_string(),
                    members: members
                        .split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(String::from)
                        .collect(),
                }
            }
            "groups" => Command::Groups,
            "notes" => Command::Notes,
            "dismiss" => Command::Dismiss(required(rest, "notification id")?.to_string()),
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`, try `help`"),
        };
        Ok(Some(command))
    }
}

pub async fn execute(engine: &Engine, command: Command) -> anyhow::Result<Outcome> {
    let out = match command {
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Outcome::Quit),
        Command::Login { email, secret } => {
            let user = engine.authenticate(&email, &secret).await?;
            format!("Signed in as {} ({})", user.name, user.role)
        }
        Command::Guest => {
            let user = engine.authenticate_as_guest();
            format!("Browsing as {}", user.name)
        }
        Command::Logout => {
            engine.end_session();
            "Signed out".to_string()
        }
        Command::WhoAmI => match engine.current_principal() {
            Some(u) => format!("{} <{}> [{}] {}", u.name, u.email, u.role, u.id),
            None => "Not signed in".to_string(),
        },
        Command::Users => {
            let mut out = String::new();
            for u in engine.users() {
                let presence = if u.is_online { "online" } else { "offline" };
                let _ = writeln!(out, "{:<10} {:<20} {:<8} {}", u.id, u.name, u.role, presence);
            }
            out.trim_end().to_string()
        }
        Command::Feed(category) => {
            let mut out = String::new();
            for p in engine.list_posts(category) {
                let _ = writeln!(
                    out,
                    "[{}] {} ({} likes, {} comments)\n    {}",
                    p.id, p.author.name, p.likes, p.comments_count, p.body
                );
            }
            out.trim_end().to_string()
        }
        Command::Post { category, body } => {
            let post = engine.create_post(&body, Vec::new(), category)?;
            format!("Published {}", post.id)
        }
        Command::Like(post_id) => {
            let post = engine.toggle_like(&post_id)?;
            format!("{} now has {} likes", post.id, post.likes)
        }
        Command::Comment { post_id, body } => {
            let comment = engine.add_comment(&post_id, &body)?;
            format!("Commented {}", comment.id)
        }
        Command::Comments(post_id) => {
            let mut out = String::new();
            for c in engine.list_comments(&post_id) {
                let _ = writeln!(out, "{}: {}", c.author.name, c.body);
            }
            out.trim_end().to_string()
        }
        Command::Friend(id) => match engine.toggle_friendship(&id)? {
            RelationChange::Added => format!("Now friends with {id}"),
            RelationChange::Removed => format!("No longer friends with {id}"),
        },
        Command::Block(id) => match engine.toggle_block(&id)? {
            RelationChange::Added => format!("Blocked {id}"),
            RelationChange::Removed => format!("Unblocked {id}"),
        },
        Command::Send { to, body, kind } => {
            let message = engine.send_message(&to, &body, kind)?;
            format!("Sent {}", message.id)
        }
        Command::Chat(peer) => {
            let mut out = String::new();
            for m in engine.list_conversation(&peer)? {
                let _ = writeln!(out, "{} {}: {}", m.created_at.format("%H:%M:%S"), m.sender_id, m.body);
            }
            out.trim_end().to_string()
        }
        Command::Read(peer) => {
            let n = engine.mark_conversation_read(&peer)?;
            format!("Marked {n} message(s) read")
        }
        Command::Group { name, members } => {
            let group = engine.create_group(&name, &members)?;
            format!("Created group {} ({})", group.name, group.id)
        }
        Command::Groups => {
            let mut out = String::new();
            for g in engine.my_groups()? {
                let _ = writeln!(out, "{} {} [{}]", g.id, g.name, g.member_ids.join(", "));
            }
            out.trim_end().to_string()
        }
        Command::Notes => {
            let mut out = String::new();
            for n in engine.notifications() {
                let _ = writeln!(out, "{} [{}] {}", n.id, n.severity, n.message);
            }
            out.trim_end().to_string()
        }
        Command::Dismiss(id) => {
            if engine.dismiss_notification(&id) {
                "Dismissed".to_string()
            } else {
                "Already gone".to_string()
            }
        }
    };
    Ok(Outcome::Continue(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn bodies_keep_their_spaces() {
        assert_eq!(
            Command::parse("send ai-natch  who are you?").unwrap(),
            Some(Command::Send {
                to: "ai-natch".into(),
                body: "who are you?".into(),
                kind: MessageKind::Text,
            })
        );
        assert_eq!(
            Command::parse("comment p-2 nice one").unwrap(),
            Some(Command::Comment {
                post_id: "p-2".into(),
                body: "nice one".into(),
            })
        );
    }

    #[test]
    fn send_takes_an_optional_kind() {
        assert_eq!(
            Command::parse("send --kind image user-2 https://img.example/cat.png").unwrap(),
            Some(Command::Send {
                to: "user-2".into(),
                body: "https://img.example/cat.png".into(),
                kind: MessageKind::Image,
            })
        );
        assert!(Command::parse("send --kind gif user-2 hi").is_err());
        let err = Command::parse("send --kind file user-2").unwrap_err();
        assert_eq!(err.to_string(), "missing text");
    }

    #[test]
    fn group_members_are_comma_separated() {
        assert_eq!(
            Command::parse("group Builders user-2, user-3,").unwrap(),
            Some(Command::Group {
                name: "Builders".into(),
                members: vec!["user-2".into(), "user-3".into()],
            })
        );
    }

    #[test]
    fn feed_defaults_to_community() {
        assert_eq!(
            Command::parse("FEED").unwrap(),
            Some(Command::Feed(Category::Community))
        );
        assert_eq!(
            Command::parse("feed announcement").unwrap(),
            Some(Command::Feed(Category::Announcement))
        );
        assert!(Command::parse("feed sideways").is_err());
    }

    #[test]
    fn missing_arguments_are_reported() {
        let err = Command::parse("login alex@nexus.com").unwrap_err();
        assert_eq!(err.to_string(), "missing secret");
        assert!(Command::parse("dance").is_err());
    }
}
