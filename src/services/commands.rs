use std::sync::{Arc, OnceLock};
use regex::Regex;
use crate::models::{
    errors::AppError,
    item::NewItem,
    site_config::SiteConfigPatch,
};
use super::{
    access_guard::{authorize, IdentityGuard},
    config_store::ConfigStore,
    item_store::ItemStore,
};

/// Maximum number of items shown by `/listitems`.
pub const LIST_LIMIT: usize = 20;

pub const HELP_TEXT: &str = "Site admin bot ready. Commands:\n\
/settitle Your title\n\
/setdesc Your description\n\
/setbanner https://...\n\
/additem title|summary|content\n\
/delitem item_id\n\
/listitems\n\
/settoken newtoken\n\
/setowner telegram_id";

/// A parsed admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    SetTitle(String),
    SetDescription(String),
    SetBanner(String),
    SetToken(String),
    AddItem {
        title: String,
        summary: String,
        content: String,
    },
    DeleteItem(String),
    ListItems,
    SetOwner(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a command this bot knows; the message is ignored.
    NotACommand,
    /// A known command with missing or malformed arguments.
    Usage(&'static str),
}

impl Command {
    /// Parse a chat message. Accepts an optional `@BotName` suffix on the
    /// command word.
    pub fn parse(text: &str) -> Result<Command, ParseError> {
        static COMMAND: OnceLock<Regex> = OnceLock::new();
        let re = COMMAND.get_or_init(|| {
            Regex::new(r"^/([A-Za-z]+)(?:@\w+)?(?:\s+([\s\S]*))?$").expect("static regex")
        });

        let captures = re.captures(text.trim()).ok_or(ParseError::NotACommand)?;
        let name = captures[1].to_lowercase();
        let args = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");

        match name.as_str() {
            "start" => Ok(Command::Start),
            "listitems" => Ok(Command::ListItems),
            "settitle" => non_empty(args, "Usage: /settitle Your title")
                .map(|title| Command::SetTitle(title.to_string())),
            "setdesc" => non_empty(args, "Usage: /setdesc Your description")
                .map(|desc| Command::SetDescription(desc.to_string())),
            "setbanner" => {
                let url = single_word(args, "Usage: /setbanner https://...")?;
                if url.starts_with("http://") || url.starts_with("https://") {
                    Ok(Command::SetBanner(url.to_string()))
                } else {
                    Err(ParseError::Usage("Usage: /setbanner https://..."))
                }
            }
            "settoken" => single_word(args, "Usage: /settoken newtoken")
                .map(|token| Command::SetToken(token.to_string())),
            "delitem" => single_word(args, "Usage: /delitem item_id")
                .map(|id| Command::DeleteItem(id.to_string())),
            "setowner" => {
                let raw = single_word(args, "Usage: /setowner telegram_id")?;
                if !raw.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ParseError::Usage("Usage: /setowner telegram_id"));
                }
                raw.parse::<i64>()
                    .map(Command::SetOwner)
                    .map_err(|_| ParseError::Usage("Usage: /setowner telegram_id"))
            }
            "additem" => {
                let mut parts = args.split('|').map(str::trim);
                let title = parts.next().unwrap_or("");
                if title.is_empty() {
                    return Err(ParseError::Usage("Usage: /additem title|summary|content"));
                }
                Ok(Command::AddItem {
                    title: title.to_string(),
                    summary: parts.next().unwrap_or("").to_string(),
                    content: parts.next().unwrap_or("").to_string(),
                })
            }
            _ => Err(ParseError::NotACommand),
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::Start | Command::ListItems)
    }

    pub fn is_config_change(&self) -> bool {
        matches!(
            self,
            Command::SetTitle(_)
                | Command::SetDescription(_)
                | Command::SetBanner(_)
                | Command::SetToken(_)
                | Command::SetOwner(_)
        )
    }
}

fn non_empty<'a>(args: &'a str, usage: &'static str) -> Result<&'a str, ParseError> {
    if args.is_empty() {
        Err(ParseError::Usage(usage))
    } else {
        Ok(args)
    }
}

fn single_word<'a>(args: &'a str, usage: &'static str) -> Result<&'a str, ParseError> {
    args.split_whitespace().next().ok_or(ParseError::Usage(usage))
}

/// Translates chat commands into store operations and renders plain-text
/// replies. Transport-agnostic: the Telegram poller feeds it sender ids
/// and message text.
#[derive(Clone)]
pub struct CommandProcessor {
    config: Arc<ConfigStore>,
    items: Arc<ItemStore>,
}

impl CommandProcessor {
    pub fn new(config: Arc<ConfigStore>, items: Arc<ItemStore>) -> Self {
        Self { config, items }
    }

    /// Handle one message. Returns the reply, or `None` if the message is
    /// not a command.
    pub async fn handle(&self, sender_id: i64, text: &str) -> Option<String> {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(ParseError::NotACommand) => return None,
            Err(ParseError::Usage(usage)) => return Some(usage.to_string()),
        };

        tracing::debug!("Command from {}: {:?}", sender_id, command);

        let reply = match self.execute(sender_id, command).await {
            Ok(reply) => reply,
            Err(AppError::UnauthorizedError) => "Unauthorized".to_string(),
            Err(AppError::NotFoundError { .. }) => "Item not found".to_string(),
            Err(AppError::ValidationError { message }) => message,
            Err(AppError::StorageError { message }) => {
                tracing::error!("Storage failure while handling command: {}", message);
                "Storage error, please try again later.".to_string()
            }
        };
        Some(reply)
    }

    /// Run a parsed command for `sender_id`. Config changes are checked
    /// against the owner inside the config write; item changes check the
    /// owner first.
    pub async fn execute(&self, sender_id: i64, command: Command) -> Result<String, AppError> {
        if command.is_mutating() && !command.is_config_change() {
            authorize(&IdentityGuard, &self.config, &sender_id).await?;
        }

        match command {
            Command::Start => Ok(HELP_TEXT.to_string()),
            Command::SetTitle(title) => {
                self.update_config(sender_id, SiteConfigPatch {
                    title: Some(title),
                    ..Default::default()
                })
                .await?;
                Ok("Title updated.".to_string())
            }
            Command::SetDescription(description) => {
                self.update_config(sender_id, SiteConfigPatch {
                    description: Some(description),
                    ..Default::default()
                })
                .await?;
                Ok("Description updated.".to_string())
            }
            Command::SetBanner(url) => {
                self.update_config(sender_id, SiteConfigPatch {
                    banner_url: Some(url),
                    ..Default::default()
                })
                .await?;
                Ok("Banner updated.".to_string())
            }
            Command::SetToken(token) => {
                self.update_config(sender_id, SiteConfigPatch {
                    admin_token: Some(Some(token)),
                    ..Default::default()
                })
                .await?;
                Ok("Admin token updated.".to_string())
            }
            Command::SetOwner(owner) => {
                self.update_config(sender_id, SiteConfigPatch {
                    owner_telegram_id: Some(Some(owner)),
                    ..Default::default()
                })
                .await?;
                Ok(format!("ownerTelegramId set to {}", owner))
            }
            Command::AddItem {
                title,
                summary,
                content,
            } => {
                let item = self
                    .items
                    .create(NewItem {
                        title: Some(title),
                        summary: Some(summary),
                        content: Some(content),
                        slug: None,
                    })
                    .await?;
                Ok(format!("Item added: {} — {}", item.id, item.title))
            }
            Command::DeleteItem(id) => {
                let removed = self.items.delete(&id).await?;
                Ok(format!("Removed {}", removed.id))
            }
            Command::ListItems => {
                let items = self.items.list().await;
                if items.is_empty() {
                    return Ok("Items:\nNo items".to_string());
                }
                let lines: Vec<String> = items
                    .iter()
                    .take(LIST_LIMIT)
                    .map(|item| format!("{} — {}", item.id, item.title))
                    .collect();
                Ok(format!("Items:\n{}", lines.join("\n")))
            }
        }
    }

    async fn update_config(&self, sender_id: i64, patch: SiteConfigPatch) -> Result<(), AppError> {
        self.config
            .update_if(&IdentityGuard, &sender_id, patch)
            .await
            .map(|_| ())
    }
}
