use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::{BookingRequest, CastingApplication, ContactMessage, FashionDayReservation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Casting,
    Booking,
    Message,
    FashionDay,
}

impl NotificationKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Casting => "casting",
            Self::Booking => "booking",
            Self::Message => "message",
            Self::FashionDay => "fashion-day",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Casting => "Nouvelle candidature casting",
            Self::Booking => "Nouvelle demande de booking",
            Self::Message => "Nouveau message",
            Self::FashionDay => "Nouvelle réservation Fashion Day",
        }
    }

    fn link(&self) -> &'static str {
        match self {
            Self::Casting => "/admin/casting-applications",
            Self::Booking => "/admin/bookings",
            Self::Message => "/admin/messages",
            Self::FashionDay => "/admin/fashion-day-reservations",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// `<kind>-<item id>`
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub link: String,
    pub date: String,
    pub read: bool,
}

/// Read/unread flags for the current session only. Never persisted; a new
/// session starts with everything unread.
#[derive(Debug, Default)]
pub struct ReadState {
    read: HashSet<String>,
}

impl ReadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_as_read(&mut self, id: &str) {
        self.read.insert(id.to_string());
    }

    pub fn mark_all_as_read(&mut self, notifications: &[Notification]) {
        self.read.extend(notifications.iter().map(|n| n.id.clone()));
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.read.contains(id)
    }

    pub fn unread_count(&self, notifications: &[Notification]) -> usize {
        notifications.iter().filter(|n| !self.is_read(&n.id)).count()
    }
}

/// Borrowed views over the four feeds the notification center watches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotificationSources<'a> {
    pub casting_applications: &'a [CastingApplication],
    pub booking_requests: &'a [BookingRequest],
    pub contact_messages: &'a [ContactMessage],
    pub fashion_day_reservations: &'a [FashionDayReservation],
}

fn is_awaiting_action(status: &str) -> bool {
    matches!(
        status.trim().to_lowercase().as_str(),
        "new" | "nouveau" | "nouvelle" | "pending" | "en attente"
    )
}

/// Best-effort timestamp for ordering. Unparseable dates sort last.
fn sort_key(date: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn notification(
    kind: NotificationKind,
    item_id: &str,
    description: String,
    date: &str,
    read: &ReadState,
) -> Notification {
    let id = format!("{}-{item_id}", kind.key());
    Notification {
        read: read.is_read(&id),
        id,
        kind,
        title: kind.title().to_string(),
        description,
        link: kind.link().to_string(),
        date: date.to_string(),
    }
}

/// Unified feed of everything awaiting an admin, newest first.
pub fn build_notifications(sources: &NotificationSources, read: &ReadState) -> Vec<Notification> {
    let mut feed = Vec::new();

    for app in sources
        .casting_applications
        .iter()
        .filter(|a| is_awaiting_action(&a.status))
    {
        let name = format!("{} {}", app.first_name, app.last_name);
        feed.push(notification(
            NotificationKind::Casting,
            &app.id,
            name.trim().to_string(),
            &app.submission_date,
            read,
        ));
    }

    for req in sources
        .booking_requests
        .iter()
        .filter(|r| is_awaiting_action(&r.status))
    {
        let description = if req.model_name.is_empty() {
            req.client_name.clone()
        } else {
            format!("{} pour {}", req.client_name, req.model_name)
        };
        feed.push(notification(
            NotificationKind::Booking,
            &req.id,
            description,
            &req.submitted_at,
            read,
        ));
    }

    for msg in sources
        .contact_messages
        .iter()
        .filter(|m| is_awaiting_action(&m.status))
    {
        let description = if msg.subject.is_empty() {
            msg.name.clone()
        } else {
            format!("{} : {}", msg.name, msg.subject)
        };
        feed.push(notification(
            NotificationKind::Message,
            &msg.id,
            description,
            &msg.submitted_at,
            read,
        ));
    }

    for res in sources
        .fashion_day_reservations
        .iter()
        .filter(|r| is_awaiting_action(&r.status))
    {
        let description = if res.event_name.is_empty() {
            res.name.clone()
        } else {
            format!("{} ({})", res.name, res.event_name)
        };
        feed.push(notification(
            NotificationKind::FashionDay,
            &res.id,
            description,
            &res.submitted_at,
            read,
        ));
    }

    // Newest first; `None` sorts below every parsed date.
    feed.sort_by(|a, b| sort_key(&b.date).cmp(&sort_key(&a.date)));
    feed
}
