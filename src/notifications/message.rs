//! Telegram message templates. Messages are sent with `parse_mode = MarkdownV2`, so
//! every piece of text outside deliberate markup goes through [`escape_markdown_v2`].

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::db::entities::bazar_status;
use crate::db::enums::ReachabilityStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Cameras just went offline.
    Offline,
    /// Cameras are still offline and the reminder interval has elapsed.
    Reminder,
    /// All cameras are back online.
    Recovery,
    /// Current state pushed on demand (recipient added, notifications enabled).
    Status,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Offline => "offline",
            NotificationKind::Reminder => "reminder",
            NotificationKind::Recovery => "recovery",
            NotificationKind::Status => "status",
        }
    }
}

/// Escapes text for Telegram MarkdownV2.
/// Characters to escape: _ * [ ] ( ) ~ ` > # + - = | { } . ! and the backslash itself.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
            | '|' | '{' | '}' | '.' | '!' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders a duration as e.g. `1 h 30 min`, `45 min` or `20 s`.
pub fn humanize_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    match (hours, minutes) {
        (0, 0) => format!("{seconds} s"),
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

fn display_name(bazar: &bazar_status::Model) -> String {
    let name = bazar.bazar_name.trim();
    if name.is_empty() {
        bazar.endpoint()
    } else {
        name.to_string()
    }
}

fn timestamp_line(now: DateTime<Utc>) -> String {
    format!(
        "🕐 {}",
        escape_markdown_v2(&now.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    )
}

/// Builds the camera-health notification for one bazar.
///
/// The "next reminder" line is only rendered for offline and reminder notifications.
pub fn format_camera_notification(
    bazar: &bazar_status::Model,
    offline: i32,
    total: i32,
    kind: NotificationKind,
    next_reminder: Option<Duration>,
    now: DateTime<Utc>,
) -> String {
    let (icon, title) = match kind {
        NotificationKind::Offline => ("🔴", "Cameras offline"),
        NotificationKind::Reminder => ("⚠️", "Cameras still offline"),
        NotificationKind::Recovery => ("🟢", "All cameras back online"),
        NotificationKind::Status if offline > 0 => ("🟠", "Camera status"),
        NotificationKind::Status => ("🟢", "Camera status"),
    };

    let mut lines = vec![
        format!("{icon} *{}*", escape_markdown_v2(title)),
        String::new(),
        format!("🏪 Bazar: *{}*", escape_markdown_v2(&display_name(bazar))),
    ];
    if let Some(region) = bazar.region() {
        lines.push(format!("📍 Region: {}", escape_markdown_v2(region)));
    }
    lines.push(format!(
        "📹 Cameras: {total} total, {} online, {offline} offline",
        (total - offline).max(0)
    ));
    lines.push(timestamp_line(now));

    if matches!(kind, NotificationKind::Offline | NotificationKind::Reminder) {
        if let Some(next) = next_reminder {
            lines.push(format!(
                "⏰ Next reminder in {}",
                escape_markdown_v2(&humanize_duration(next))
            ));
        }
    }

    lines.join("\n")
}

/// Summary of several bazars, used for the snapshot pushed to a new recipient and for
/// the bot's `/status` command.
pub fn format_status_summary(bazars: &[bazar_status::Model], now: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("📊 *{}*", escape_markdown_v2("Bazar monitoring status")),
        String::new(),
    ];

    if bazars.is_empty() {
        lines.push(escape_markdown_v2("No bazars with notifications enabled."));
    }
    for bazar in bazars {
        let icon = match (bazar.status, bazar.last_offline_cameras_count) {
            (ReachabilityStatus::Offline, _) => "🔴",
            (ReachabilityStatus::Online, 0) => "🟢",
            (ReachabilityStatus::Online, _) => "🟠",
        };
        let mut line = format!("{icon} *{}*", escape_markdown_v2(&display_name(bazar)));
        if let Some(region) = bazar.region() {
            line.push_str(&format!(" \\({}\\)", escape_markdown_v2(region)));
        }
        line.push_str(&format!(
            " — {}",
            escape_markdown_v2(&format!(
                "{}, {} cameras offline",
                bazar.status, bazar.last_offline_cameras_count
            ))
        ));
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(timestamp_line(now));
    lines.join("\n")
}

pub fn format_test_message(now: DateTime<Utc>) -> String {
    [
        format!("✅ *{}*", escape_markdown_v2("Test message")),
        String::new(),
        escape_markdown_v2("Bazar monitoring notifications are configured correctly."),
        timestamp_line(now),
    ]
    .join("\n")
}

/// Detailed status of one bazar for the bot's per-bazar view.
pub fn format_bazar_details(bazar: &bazar_status::Model, now: DateTime<Utc>) -> String {
    let status_icon = match bazar.status {
        ReachabilityStatus::Online => "🟢",
        ReachabilityStatus::Offline => "🔴",
    };
    let mut lines = vec![
        format!("🏪 *{}*", escape_markdown_v2(&display_name(bazar))),
        String::new(),
        format!("{status_icon} Status: {}", bazar.status),
        format!("🌐 Address: {}", escape_markdown_v2(&bazar.endpoint())),
    ];
    if let Some(region) = bazar.region() {
        lines.push(format!("📍 Region: {}", escape_markdown_v2(region)));
    }
    lines.push(format!(
        "📹 Offline cameras: {}",
        bazar.last_offline_cameras_count
    ));
    if let Some(last_online) = bazar.last_online {
        lines.push(format!(
            "✅ Last online: {}",
            escape_markdown_v2(&last_online.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        ));
    }
    if let Some(last_offline) = bazar.last_offline {
        lines.push(format!(
            "❌ Last offline: {}",
            escape_markdown_v2(&last_offline.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        ));
    }
    lines.push(format!(
        "🔔 Notifications: {}",
        if bazar.telegram_notifications_enabled { "on" } else { "off" }
    ));
    lines.push(timestamp_line(now));
    lines.join("\n")
}
