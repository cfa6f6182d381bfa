//! Member notifications.
//!
//! # Invariants
//! - Every stored notification names a member, a known kind, a title and a
//!   message.
//! - New notifications are unread with `deliveredAt = null`.

use super::{now_rfc3339, require_text, ServiceError, ServiceResult};
use crate::auth::permission::{Action, Resource};
use crate::auth::session::Session;
use crate::model::collections::NOTIFICATIONS;
use crate::model::document::{fields_from, Document};
use crate::store::{DocumentStore, Filter};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::info;
use serde::Serialize;
use serde_json::{json, Value};

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    FeeDue,
    GymUpdate,
    General,
    GymReminder,
    MissedTraining,
    Motivation,
    StreakReminder,
}

const SUPPORTED_KINDS: &[NotificationKind] = &[
    NotificationKind::FeeDue,
    NotificationKind::GymUpdate,
    NotificationKind::General,
    NotificationKind::GymReminder,
    NotificationKind::MissedTraining,
    NotificationKind::Motivation,
    NotificationKind::StreakReminder,
];

impl NotificationKind {
    /// Stable string stored in the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeeDue => "fee_due",
            Self::GymUpdate => "gym_update",
            Self::General => "general",
            Self::GymReminder => "gym_reminder",
            Self::MissedTraining => "missed_training",
            Self::Motivation => "motivation",
            Self::StreakReminder => "streak_reminder",
        }
    }

    pub fn parse(value: &str) -> ServiceResult<Self> {
        SUPPORTED_KINDS
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ServiceError::validation("Invalid notification type"))
    }

    pub fn all() -> &'static [NotificationKind] {
        SUPPORTED_KINDS
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub member_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Shared body for bulk sends; the member id is filled per recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NotificationTemplate {
    fn new(kind: NotificationKind, title: &str, message: String) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message,
        }
    }
}

/// Recurring fee reminder computed on demand; not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    pub member_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub scheduled: bool,
    pub schedule_day: u32,
    pub next_run: DateTime<Utc>,
}

pub struct NotificationService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> NotificationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create_notification(
        &self,
        actor: &Session,
        request: NewNotification,
    ) -> ServiceResult<Document> {
        actor.require(Action::Create, Resource::Notifications)?;

        let member_id = require_text(&request.member_id, "Member ID is required")?;
        let title = require_text(&request.title, "Notification title is required")?;
        let message = require_text(&request.message, "Notification message is required")?;

        let notification = self.store.create(
            NOTIFICATIONS,
            fields_from(json!({
                "memberId": member_id,
                "type": request.kind.as_str(),
                "title": title,
                "message": message,
                "read": false,
                "deliveredAt": Value::Null,
            })),
        )?;
        info!(
            "event=notification_create module=service status=ok notification_id={} kind={}",
            notification.id,
            request.kind.as_str()
        );
        Ok(notification)
    }

    /// Sends one copy of `template` to each member, in order.
    ///
    /// Stops at the first failure; earlier copies stay stored.
    pub fn send_bulk(
        &self,
        actor: &Session,
        member_ids: &[String],
        template: &NotificationTemplate,
    ) -> ServiceResult<Vec<Document>> {
        let sent = member_ids
            .iter()
            .map(|member_id| {
                self.create_notification(
                    actor,
                    NewNotification {
                        member_id: member_id.clone(),
                        kind: template.kind,
                        title: template.title.clone(),
                        message: template.message.clone(),
                    },
                )
            })
            .collect::<ServiceResult<Vec<_>>>()?;
        info!("event=notification_bulk module=service status=ok count={}", sent.len());
        Ok(sent)
    }

    pub fn send_fee_due(
        &self,
        actor: &Session,
        member_id: &str,
        amount: f64,
        due_date: &str,
    ) -> ServiceResult<Document> {
        self.create_notification(
            actor,
            NewNotification {
                member_id: member_id.to_string(),
                kind: NotificationKind::FeeDue,
                title: "Fee Payment Due".to_string(),
                message: format!(
                    "Your gym fee of ${amount} is due on {due_date}. Please make the payment to avoid membership suspension."
                ),
            },
        )
    }

    pub fn send_gym_status(
        &self,
        actor: &Session,
        member_ids: &[String],
        message: &str,
    ) -> ServiceResult<Vec<Document>> {
        let template = NotificationTemplate::new(
            NotificationKind::GymUpdate,
            "Gym Status Update",
            message.to_string(),
        );
        self.send_bulk(actor, member_ids, &template)
    }

    pub fn send_gym_reminder(
        &self,
        actor: &Session,
        member_ids: &[String],
        message: Option<&str>,
    ) -> ServiceResult<Vec<Document>> {
        let message = message.map(str::to_string).unwrap_or_else(|| {
            "You haven't visited the gym today! Let's maintain your fitness journey. Come by the gym today!".to_string()
        });
        let template =
            NotificationTemplate::new(NotificationKind::GymReminder, "Gym Reminder", message);
        self.send_bulk(actor, member_ids, &template)
    }

    pub fn send_missed_training(
        &self,
        actor: &Session,
        member_ids: &[String],
        days: u32,
        message: Option<&str>,
    ) -> ServiceResult<Vec<Document>> {
        let message = message.map(str::to_string).unwrap_or_else(|| {
            format!("You've missed training for {days} days. Don't worry! Every moment is a fresh start. Come back stronger and continue your fitness journey!")
        });
        let template = NotificationTemplate::new(
            NotificationKind::MissedTraining,
            "Get Back on Track",
            message,
        );
        self.send_bulk(actor, member_ids, &template)
    }

    pub fn send_motivation(
        &self,
        actor: &Session,
        member_ids: &[String],
        message: Option<&str>,
    ) -> ServiceResult<Vec<Document>> {
        let message = message.map(str::to_string).unwrap_or_else(|| {
            "Amazing work today! You're crushing your fitness goals! Keep up the great momentum!"
                .to_string()
        });
        let template = NotificationTemplate::new(
            NotificationKind::Motivation,
            "You Did Great Today!",
            message,
        );
        self.send_bulk(actor, member_ids, &template)
    }

    pub fn send_streak_reminder(
        &self,
        actor: &Session,
        member_ids: &[String],
        streak_days: u32,
        message: Option<&str>,
    ) -> ServiceResult<Vec<Document>> {
        let message = message.map(str::to_string).unwrap_or_else(|| {
            format!("Amazing streak! You've been training for {streak_days} days in a row! Don't break the chain - come back tomorrow!")
        });
        let template = NotificationTemplate::new(
            NotificationKind::StreakReminder,
            "Keep Your Streak Alive!",
            message,
        );
        self.send_bulk(actor, member_ids, &template)
    }

    pub fn mark_as_read(&self, actor: &Session, notification_id: &str) -> ServiceResult<Document> {
        actor.require(Action::Update, Resource::Notifications)?;
        Ok(mark_read(&self.store, notification_id)?)
    }

    /// Notifications for one member in insertion order.
    pub fn member_notifications(
        &self,
        actor: &Session,
        member_id: &str,
        unread_only: bool,
    ) -> ServiceResult<Vec<Document>> {
        actor.require(Action::Read, Resource::Notifications)?;
        let mut filter = Filter::all().field("memberId", member_id);
        if unread_only {
            filter = filter.field("read", false);
        }
        Ok(self.store.read_all(NOTIFICATIONS, &filter)?)
    }

    pub fn unread_count(&self, actor: &Session, member_id: &str) -> ServiceResult<usize> {
        Ok(self.member_notifications(actor, member_id, true)?.len())
    }

    pub fn delete_notification(&self, actor: &Session, notification_id: &str) -> ServiceResult<()> {
        actor.require(Action::Delete, Resource::Notifications)?;
        self.store.delete(NOTIFICATIONS, notification_id)?;
        info!("event=notification_delete module=service status=ok notification_id={notification_id}");
        Ok(())
    }

    /// Describes a monthly fee reminder on `day_of_month` (1..=28).
    pub fn schedule_monthly_fee(
        &self,
        actor: &Session,
        member_id: &str,
        amount: f64,
        day_of_month: u32,
    ) -> ServiceResult<ScheduledNotification> {
        actor.require(Action::Create, Resource::Notifications)?;
        let member_id = require_text(member_id, "Member ID is required")?;
        let next_run = next_monthly_run(Utc::now(), day_of_month)?;
        info!("event=notification_schedule module=service status=ok day={day_of_month}");
        Ok(ScheduledNotification {
            member_id,
            kind: NotificationKind::FeeDue.as_str(),
            title: "Monthly Fee Due".to_string(),
            message: format!(
                "Your monthly gym fee of ${amount} is due on the {} of each month.",
                ordinal(day_of_month)
            ),
            scheduled: true,
            schedule_day: day_of_month,
            next_run,
        })
    }
}

/// Flags one notification read; shared with the member dashboard.
pub(crate) fn mark_read<S: DocumentStore>(
    store: &S,
    notification_id: &str,
) -> crate::store::StoreResult<Document> {
    store.update(
        NOTIFICATIONS,
        notification_id,
        fields_from(json!({"read": true, "readAt": now_rfc3339()})),
    )
}

/// `1st`, `2nd`, `3rd`, `11th`, `22nd` ...
fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Midnight UTC of `day` this month if still ahead of `now`, else next month.
pub fn next_monthly_run(now: DateTime<Utc>, day: u32) -> ServiceResult<DateTime<Utc>> {
    if !(1..=28).contains(&day) {
        return Err(ServiceError::validation("Day of month must be between 1 and 28"));
    }
    let at_midnight = |year: i32, month: u32| {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| ServiceError::validation("Invalid schedule date"))
    };

    let this_month = at_midnight(now.year(), now.month())?;
    if this_month > now {
        return Ok(this_month);
    }
    if now.month() == 12 {
        at_midnight(now.year() + 1, 1)
    } else {
        at_midnight(now.year(), now.month() + 1)
    }
}
