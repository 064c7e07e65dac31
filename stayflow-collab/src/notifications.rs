use std::sync::Arc;

use crate::{Database, DatabaseError, NewNotification, NotificationData, PrimaryKey};

/// Well-known notification kinds emitted by the system
pub mod kinds {
    pub const BOOKING_CONFIRMED: &str = "BOOKING_CONFIRMED";
    pub const NEW_BOOKING: &str = "NEW_BOOKING";
}

/// Writes and reads notification records. There is no delivery guarantee
/// beyond the database write, clients poll for unread notifications.
pub struct NotificationManager<Db> {
    db: Arc<Db>,
}

impl<Db> NotificationManager<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn notify(
        &self,
        user_id: PrimaryKey,
        kind: &str,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Result<NotificationData, DatabaseError> {
        self.db
            .create_notification(NewNotification {
                user_id,
                kind: kind.to_string(),
                title: title.into(),
                message: message.into(),
                link,
            })
            .await
    }

    /// All notifications for a user, newest first
    pub async fn notifications_for(
        &self,
        user_id: PrimaryKey,
    ) -> Result<Vec<NotificationData>, DatabaseError> {
        self.db.notifications_by_user(user_id).await
    }

    pub async fn mark_read(
        &self,
        notification_id: PrimaryKey,
    ) -> Result<NotificationData, DatabaseError> {
        self.db.mark_notification_read(notification_id).await
    }

    pub async fn mark_all_read(&self, user_id: PrimaryKey) -> Result<(), DatabaseError> {
        self.db.mark_all_notifications_read(user_id).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MemoryDatabase;

    #[tokio::test]
    async fn read_state_flips_once_and_stays() {
        let db = Arc::new(MemoryDatabase::default());
        let notifications = NotificationManager::new(&db);

        let first = notifications
            .notify(1, kinds::BOOKING_CONFIRMED, "Booking confirmed!", "Enjoy.", None)
            .await
            .expect("notification is created");
        notifications
            .notify(1, kinds::NEW_BOOKING, "New booking received!", "Nice.", None)
            .await
            .expect("notification is created");

        assert!(!first.read);

        let marked = notifications.mark_read(first.id).await.expect("marked");
        assert!(marked.read);

        notifications.mark_all_read(1).await.expect("all marked");

        let all = notifications.notifications_for(1).await.expect("listed");
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|n| n.read));
    }
}
