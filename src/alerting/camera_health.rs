//! Two-state camera-health machine per bazar.
//!
//! The state is derived from the persisted offline-camera count; transitions are decided
//! by [`evaluate_transition`], which has no I/O.

use chrono::{DateTime, Duration, Utc};

use crate::monitoring::prober::CameraStatistics;
use crate::notifications::message::NotificationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraHealthState {
    AllOnline,
    HasOffline,
}

impl CameraHealthState {
    pub fn from_offline_count(offline: i32) -> Self {
        if offline > 0 {
            CameraHealthState::HasOffline
        } else {
            CameraHealthState::AllOnline
        }
    }
}

/// Camera counts from a single statistics probe. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraHealthSnapshot {
    pub total: i32,
    pub online: i32,
    pub offline: i32,
}

impl CameraHealthSnapshot {
    pub fn state(&self) -> CameraHealthState {
        CameraHealthState::from_offline_count(self.offline)
    }

    /// A snapshot without cameras carries no information about their health.
    pub fn has_data(&self) -> bool {
        self.total > 0
    }
}

impl From<CameraStatistics> for CameraHealthSnapshot {
    fn from(stats: CameraStatistics) -> Self {
        Self {
            total: stats.total_cameras,
            online: stats.online_cameras,
            offline: stats.offline_cameras.max(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    None,
    Offline,
    Reminder,
    Recovery,
}

impl NotificationAction {
    pub fn kind(&self) -> Option<NotificationKind> {
        match self {
            NotificationAction::None => None,
            NotificationAction::Offline => Some(NotificationKind::Offline),
            NotificationAction::Reminder => Some(NotificationKind::Reminder),
            NotificationAction::Recovery => Some(NotificationKind::Recovery),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: CameraHealthState,
    pub action: NotificationAction,
}

/// Decides what to send for a new snapshot.
///
/// `AllOnline -> HasOffline` fires an offline notification and `HasOffline -> AllOnline` a
/// recovery. While cameras stay offline a reminder fires once `reminder_interval` has
/// passed since the last successful notification, or immediately if there was none.
pub fn evaluate_transition(
    previous: CameraHealthState,
    snapshot: &CameraHealthSnapshot,
    last_notification: Option<DateTime<Utc>>,
    reminder_interval: Duration,
    now: DateTime<Utc>,
) -> Transition {
    let state = snapshot.state();
    let action = match (previous, state) {
        (CameraHealthState::AllOnline, CameraHealthState::HasOffline) => {
            NotificationAction::Offline
        }
        (CameraHealthState::HasOffline, CameraHealthState::AllOnline) => {
            NotificationAction::Recovery
        }
        (CameraHealthState::HasOffline, CameraHealthState::HasOffline) => {
            let due = match last_notification {
                Some(sent_at) => now - sent_at >= reminder_interval,
                None => true,
            };
            if due {
                NotificationAction::Reminder
            } else {
                NotificationAction::None
            }
        }
        (CameraHealthState::AllOnline, CameraHealthState::AllOnline) => NotificationAction::None,
    };
    Transition { state, action }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(offline: i32) -> CameraHealthSnapshot {
        CameraHealthSnapshot {
            total: 10,
            online: 10 - offline,
            offline,
        }
    }

    fn hour() -> Duration {
        Duration::seconds(3600)
    }

    #[test]
    fn transitions_fire_offline_and_recovery() {
        let now = Utc::now();
        let went_offline =
            evaluate_transition(CameraHealthState::AllOnline, &snapshot(3), None, hour(), now);
        assert_eq!(went_offline.action, NotificationAction::Offline);
        assert_eq!(went_offline.state, CameraHealthState::HasOffline);

        let recovered = evaluate_transition(
            CameraHealthState::HasOffline,
            &snapshot(0),
            Some(now),
            hour(),
            now,
        );
        assert_eq!(recovered.action, NotificationAction::Recovery);
        assert_eq!(recovered.state, CameraHealthState::AllOnline);

        let quiet =
            evaluate_transition(CameraHealthState::AllOnline, &snapshot(0), None, hour(), now);
        assert_eq!(quiet.action, NotificationAction::None);
    }

    #[test]
    fn reminder_waits_for_the_interval() {
        let now = Utc::now();
        let too_soon = evaluate_transition(
            CameraHealthState::HasOffline,
            &snapshot(3),
            Some(now - Duration::seconds(3599)),
            hour(),
            now,
        );
        assert_eq!(too_soon.action, NotificationAction::None);

        let due = evaluate_transition(
            CameraHealthState::HasOffline,
            &snapshot(5),
            Some(now - Duration::seconds(3601)),
            hour(),
            now,
        );
        assert_eq!(due.action, NotificationAction::Reminder);

        let exactly = evaluate_transition(
            CameraHealthState::HasOffline,
            &snapshot(5),
            Some(now - hour()),
            hour(),
            now,
        );
        assert_eq!(exactly.action, NotificationAction::Reminder);
    }

    #[test]
    fn reminder_is_due_without_a_previous_notification() {
        let now = Utc::now();
        let transition =
            evaluate_transition(CameraHealthState::HasOffline, &snapshot(2), None, hour(), now);
        assert_eq!(transition.action, NotificationAction::Reminder);
    }

    #[test]
    fn snapshot_from_statistics() {
        let snapshot = CameraHealthSnapshot::from(CameraStatistics {
            total_cameras: 0,
            online_cameras: 0,
            offline_cameras: 0,
        });
        assert!(!snapshot.has_data());
        assert_eq!(snapshot.state(), CameraHealthState::AllOnline);
        assert_eq!(NotificationAction::Reminder.kind(), Some(NotificationKind::Reminder));
        assert_eq!(NotificationAction::None.kind(), None);
    }
}
