use std::sync::Arc;

use thiserror::Error;

use crate::{
    Database, DatabaseError, FriendshipData, FriendshipStatus, NewFriendship, PrimaryKey, UserData,
};

/// Manages friendships. The relation is undirected but stored as one
/// directed row, so every lookup considers both directions.
pub struct FriendManager<Db> {
    db: Arc<Db>,
}

#[derive(Debug, Error)]
pub enum FriendError {
    #[error("You can't send a friend request to yourself")]
    SelfRequest,
    #[error("Only the addressee can act on a friend request")]
    NotAddressee,
    #[error("Friendship doesn't exist")]
    NotFriends,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

impl<Db> FriendManager<Db>
where
    Db: Database,
{
    /// Minimum query length for user search
    const SEARCH_MIN_CHARS: usize = 2;
    const SEARCH_LIMIT: i64 = 10;

    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    /// Sends a friend request. A duplicate request returns the existing
    /// row, and a pending request in the opposite direction is accepted
    /// instead of creating a mirrored one.
    pub async fn send_request(
        &self,
        requester_id: PrimaryKey,
        addressee_id: PrimaryKey,
    ) -> Result<FriendshipData, FriendError> {
        if requester_id == addressee_id {
            return Err(FriendError::SelfRequest);
        }

        match self.db.friendship_between(requester_id, addressee_id).await {
            Ok(existing) => return Ok(existing),
            Err(DatabaseError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        match self.db.friendship_between(addressee_id, requester_id).await {
            Ok(inverse) if inverse.status == FriendshipStatus::Pending => {
                return self
                    .db
                    .set_friendship_status(inverse.id, FriendshipStatus::Accepted)
                    .await
                    .map_err(Into::into)
            }
            Ok(inverse) => return Ok(inverse),
            Err(DatabaseError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        self.db
            .create_friendship(NewFriendship {
                requester_id,
                addressee_id,
                status: FriendshipStatus::Pending,
            })
            .await
            .map_err(Into::into)
    }

    pub async fn accept(
        &self,
        request_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<FriendshipData, FriendError> {
        let request = self.db.friendship_by_id(request_id).await?;

        if request.addressee.id != user_id {
            return Err(FriendError::NotAddressee);
        }

        self.db
            .set_friendship_status(request_id, FriendshipStatus::Accepted)
            .await
            .map_err(Into::into)
    }

    pub async fn reject(
        &self,
        request_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<(), FriendError> {
        let request = self.db.friendship_by_id(request_id).await?;

        if request.addressee.id != user_id {
            return Err(FriendError::NotAddressee);
        }

        self.db
            .delete_friendship(request_id)
            .await
            .map_err(Into::into)
    }

    /// Removes a friendship in whichever direction it was stored
    pub async fn remove(
        &self,
        friend_id: PrimaryKey,
        user_id: PrimaryKey,
    ) -> Result<(), FriendError> {
        for (requester, addressee) in [(user_id, friend_id), (friend_id, user_id)] {
            match self.db.friendship_between(requester, addressee).await {
                Ok(friendship) => {
                    return self
                        .db
                        .delete_friendship(friendship.id)
                        .await
                        .map_err(Into::into)
                }
                Err(DatabaseError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(FriendError::NotFriends)
    }

    /// The user's accepted friends, regardless of who sent the request
    pub async fn friends_of(&self, user_id: PrimaryKey) -> Result<Vec<UserData>, FriendError> {
        let friendships = self.db.friendships_of(user_id).await?;

        let friends = friendships
            .into_iter()
            .map(|f| {
                if f.requester.id == user_id {
                    f.addressee
                } else {
                    f.requester
                }
            })
            .collect();

        Ok(friends)
    }

    pub async fn pending_for(
        &self,
        user_id: PrimaryKey,
    ) -> Result<Vec<FriendshipData>, DatabaseError> {
        self.db.pending_friendships_for(user_id).await
    }

    /// Searches users by name, excluding the searcher. Queries shorter
    /// than two characters return nothing.
    pub async fn search_users(
        &self,
        query: &str,
        current_user: PrimaryKey,
    ) -> Result<Vec<UserData>, DatabaseError> {
        if query.chars().count() < Self::SEARCH_MIN_CHARS {
            return Ok(vec![]);
        }

        self.db
            .search_users_by_name(query, current_user, Self::SEARCH_LIMIT)
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{MemoryDatabase, NewUser, UserRole};

    async fn user(db: &Arc<MemoryDatabase>, name: &str) -> UserData {
        db.create_user(NewUser {
            email: format!("{name}@example.com"),
            name: name.to_string(),
            password: "hash".to_string(),
            role: UserRole::Guest,
        })
        .await
        .expect("user is created")
    }

    #[tokio::test]
    async fn request_accept_round_trip_is_symmetric() {
        let db = Arc::new(MemoryDatabase::default());
        let friends = FriendManager::new(&db);

        let ada = user(&db, "ada").await;
        let brendan = user(&db, "brendan").await;

        let request = friends
            .send_request(ada.id, brendan.id)
            .await
            .expect("request is sent");
        assert_eq!(request.status, FriendshipStatus::Pending);

        let pending = friends.pending_for(brendan.id).await.expect("pending listed");
        assert_eq!(pending.len(), 1);

        friends
            .accept(request.id, brendan.id)
            .await
            .expect("request is accepted");

        let adas_friends = friends.friends_of(ada.id).await.expect("friends listed");
        let brendans_friends = friends.friends_of(brendan.id).await.expect("friends listed");

        assert_eq!(adas_friends.len(), 1);
        assert_eq!(adas_friends[0].id, brendan.id);
        assert_eq!(brendans_friends.len(), 1);
        assert_eq!(brendans_friends[0].id, ada.id);
    }

    #[tokio::test]
    async fn self_requests_are_rejected() {
        let db = Arc::new(MemoryDatabase::default());
        let friends = FriendManager::new(&db);

        let ada = user(&db, "ada").await;

        let result = friends.send_request(ada.id, ada.id).await;
        assert!(matches!(result, Err(FriendError::SelfRequest)));
    }

    #[tokio::test]
    async fn crossing_requests_accept_instead_of_duplicating() {
        let db = Arc::new(MemoryDatabase::default());
        let friends = FriendManager::new(&db);

        let ada = user(&db, "ada").await;
        let brendan = user(&db, "brendan").await;

        friends
            .send_request(ada.id, brendan.id)
            .await
            .expect("request is sent");

        // The inverse request resolves the pending one
        let crossed = friends
            .send_request(brendan.id, ada.id)
            .await
            .expect("crossing request resolves");

        assert_eq!(crossed.status, FriendshipStatus::Accepted);
        assert_eq!(friends.friends_of(ada.id).await.expect("friends").len(), 1);
    }

    #[tokio::test]
    async fn only_the_addressee_can_accept() {
        let db = Arc::new(MemoryDatabase::default());
        let friends = FriendManager::new(&db);

        let ada = user(&db, "ada").await;
        let brendan = user(&db, "brendan").await;

        let request = friends
            .send_request(ada.id, brendan.id)
            .await
            .expect("request is sent");

        let result = friends.accept(request.id, ada.id).await;
        assert!(matches!(result, Err(FriendError::NotAddressee)));
    }

    #[tokio::test]
    async fn removal_works_in_either_direction() {
        let db = Arc::new(MemoryDatabase::default());
        let friends = FriendManager::new(&db);

        let ada = user(&db, "ada").await;
        let brendan = user(&db, "brendan").await;

        let request = friends
            .send_request(ada.id, brendan.id)
            .await
            .expect("request is sent");
        friends
            .accept(request.id, brendan.id)
            .await
            .expect("request is accepted");

        // Brendan removes ada even though ada sent the request
        friends.remove(ada.id, brendan.id).await.expect("removed");

        assert!(friends.friends_of(ada.id).await.expect("friends").is_empty());
        assert!(matches!(
            friends.remove(ada.id, brendan.id).await,
            Err(FriendError::NotFriends)
        ));
    }

    #[tokio::test]
    async fn user_search_excludes_self_and_short_queries() {
        let db = Arc::new(MemoryDatabase::default());
        let friends = FriendManager::new(&db);

        let ada = user(&db, "ada").await;
        user(&db, "adalbert").await;
        user(&db, "brendan").await;

        let found = friends.search_users("ada", ada.id).await.expect("searched");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "adalbert");

        let found = friends.search_users("a", ada.id).await.expect("searched");
        assert!(found.is_empty());
    }
}
