//! User-facing texts and the admin lead report.

use std::fmt;

pub const WELCOME: &str = "Сат Нам! Здесь вы можете записаться на консультацию или занятия с учителем \
Кундалини йоги - Ади Навприт.\n\
Какой формат работы вы хотели бы начать ?";

pub const CONTACT_REQUEST: &str =
    "Оставьте ссылку на ваш телеграм, чтобы Ади Навприт связалась с вами в ближайшее время.";

pub const CONTACT_FORMAT_HELP: &str = "Пожалуйста, отправьте ваш Telegram в одном из форматов:\n\
- @username\n\
- https://t.me/username\n\
- t.me/username";

pub const TEXT_REMINDER: &str = "Пожалуйста, отправьте ссылку или @username текстом 🙂";

pub fn thank_you(channel_url: &str) -> String {
    format!(
        "Благодарю! В ближайшее время Ади Навприт свяжется с вами!\n\
         А пока подписывайтесь на телеграм канал BLOOME - Кундалини йога для женщин ({channel_url})."
    )
}

pub fn id_reply(user_id: i64, chat_id: i64) -> String {
    format!("Your ID: {user_id}\nChat ID: {chat_id}")
}

/// A completed lead, rendered for the administrator via `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadReport {
    pub full_name: String,
    pub user_id: i64,
    pub username: Option<String>,
    pub selected_option: String,
    pub contact: String,
    pub start_param: String,
}

impl fmt::Display for LeadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🆕 New Kundalini Lead")?;
        writeln!(f)?;
        write!(f, "👤 User: {} (id: {})", self.full_name, self.user_id)?;
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            write!(f, " @{username}")?;
        }
        writeln!(f)?;
        writeln!(f, "📌 Format: {}", self.selected_option)?;
        writeln!(f, "🔗 Contact (TG): {}", self.contact)?;
        if !self.start_param.is_empty() {
            writeln!(f, "🏷 start param: {}", self.start_param)?;
        }
        Ok(())
    }
}
