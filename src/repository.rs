// Social Repository - unified query/mutation layer over the Entity Store
// Single entry point for all user/post/message/friendship/notification operations

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{
    Conversation, EntityId, FriendRequest, Friendship, FriendshipStatus, FriendshipWithFriend,
    Message, MessageWithSender, NewFriendship, NewMessage, NewNotification, NewPost, NewUser,
    Notification, NotificationWithUser, Post, PostWithUser, User, UserUpdate,
};
use crate::store::EntityStore;

/// All read/write operations consumed by the request layer.
///
/// Reads that join across entity kinds denormalize by single-hop foreign-key
/// lookups, recomputed per call. A record whose foreign key no longer
/// resolves is filtered out of the result instead of erroring; this is
/// intentional leniency so partial seed data never crashes a query.
#[derive(Debug, Clone)]
pub struct SocialRepository {
    store: Arc<EntityStore>,
}

impl SocialRepository {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    // User operations

    pub async fn get_user(&self, id: EntityId) -> Option<User> {
        self.store.users.get(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.store
            .users
            .all()
            .await
            .into_iter()
            .find(|user| user.username == username)
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        self.store.users.all().await
    }

    /// Create a user with registration defaults: unverified, offline.
    ///
    /// Username uniqueness is the caller's pre-check; the store itself does
    /// not enforce it.
    pub async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        if new_user.username.trim().is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }
        if new_user.password.is_empty() {
            return Err(AppError::Validation("password is required".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: self.store.users.next_id(),
            username: new_user.username,
            password: new_user.password,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            bio: new_user.bio,
            profile_picture: new_user.profile_picture,
            cover_photo: new_user.cover_photo,
            is_verified: false,
            is_online: false,
            last_seen: now,
            created_at: now,
        };
        self.store.users.put(user.id, user.clone()).await;
        info!("create_user: Created user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Merge the provided fields over the existing record.
    pub async fn update_user(&self, id: EntityId, updates: UserUpdate) -> Option<User> {
        self.store
            .users
            .update(id, |user| {
                if let Some(first_name) = updates.first_name {
                    user.first_name = Some(first_name);
                }
                if let Some(last_name) = updates.last_name {
                    user.last_name = Some(last_name);
                }
                if let Some(email) = updates.email {
                    user.email = Some(email);
                }
                if let Some(bio) = updates.bio {
                    user.bio = Some(bio);
                }
                if let Some(profile_picture) = updates.profile_picture {
                    user.profile_picture = Some(profile_picture);
                }
                if let Some(cover_photo) = updates.cover_photo {
                    user.cover_photo = Some(cover_photo);
                }
                if let Some(is_online) = updates.is_online {
                    user.is_online = is_online;
                }
                if let Some(last_seen) = updates.last_seen {
                    user.last_seen = last_seen;
                }
            })
            .await
    }

    // Post operations

    pub async fn create_post(&self, new_post: NewPost) -> AppResult<Post> {
        if new_post.content.trim().is_empty() {
            return Err(AppError::Validation("post content is required".to_string()));
        }
        if self.store.users.get(new_post.user_id).await.is_none() {
            return Err(AppError::Validation(format!(
                "unknown post owner {}",
                new_post.user_id
            )));
        }

        let post = Post {
            id: self.store.posts.next_id(),
            user_id: new_post.user_id,
            content: new_post.content,
            image_url: new_post.image_url,
            video_url: new_post.video_url,
            likes: 0,
            comments: 0,
            shares: 0,
            created_at: Utc::now(),
        };
        self.store.posts.put(post.id, post.clone()).await;
        info!("create_post: Created post {} by user {}", post.id, post.user_id);
        Ok(post)
    }

    pub async fn get_post(&self, id: EntityId) -> Option<Post> {
        self.store.posts.get(id).await
    }

    /// All posts, newest first, each joined with its owning user. Posts whose
    /// owner no longer resolves are dropped.
    pub async fn get_feed_posts(&self) -> Vec<PostWithUser> {
        let mut posts = self.store.posts.all().await;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut feed = Vec::with_capacity(posts.len());
        for post in posts {
            if let Some(user) = self.store.users.get(post.user_id).await {
                feed.push(PostWithUser { post, user });
            }
        }
        feed
    }

    /// The feed filtered to one owner, newest first.
    pub async fn get_user_posts(&self, user_id: EntityId) -> Vec<PostWithUser> {
        let mut feed = self.get_feed_posts().await;
        feed.retain(|entry| entry.post.user_id == user_id);
        feed
    }

    /// Increment the likes counter by exactly 1, unconditionally. There is no
    /// per-user dedup: liking twice counts twice.
    pub async fn like_post(&self, post_id: EntityId) -> Option<Post> {
        let post = self.store.posts.update(post_id, |post| post.likes += 1).await;
        if let Some(ref post) = post {
            info!("like_post: Post {} now has {} likes", post.id, post.likes);
        }
        post
    }

    // Message operations

    pub async fn create_message(&self, new_message: NewMessage) -> AppResult<Message> {
        if new_message.content.is_empty() {
            return Err(AppError::Validation("message content is required".to_string()));
        }
        if self.store.users.get(new_message.sender_id).await.is_none() {
            return Err(AppError::Validation(format!(
                "unknown sender {}",
                new_message.sender_id
            )));
        }

        let message = Message {
            id: self.store.messages.next_id(),
            sender_id: new_message.sender_id,
            receiver_id: new_message.receiver_id,
            content: new_message.content,
            is_ai: new_message.is_ai,
            created_at: Utc::now(),
        };
        self.store.messages.put(message.id, message.clone()).await;
        info!(
            "create_message: Message {} from {} to {:?}",
            message.id, message.sender_id, message.receiver_id
        );
        Ok(message)
    }

    /// Messages involving `user_id`, ascending by creation time, each joined
    /// with its sender. With `other_id` set, only the two-party thread.
    pub async fn get_messages(
        &self,
        user_id: EntityId,
        other_id: Option<EntityId>,
    ) -> Vec<MessageWithSender> {
        let mut messages = self.store.messages.all().await;

        match other_id {
            Some(other_id) => messages.retain(|message| {
                (message.sender_id == user_id && message.receiver_id == Some(other_id))
                    || (message.sender_id == other_id && message.receiver_id == Some(user_id))
            }),
            None => messages.retain(|message| {
                message.sender_id == user_id || message.receiver_id == Some(user_id)
            }),
        }

        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut joined = Vec::with_capacity(messages.len());
        for message in messages {
            if let Some(sender) = self.store.users.get(message.sender_id).await {
                joined.push(MessageWithSender { message, sender });
            }
        }
        joined
    }

    /// Derive one conversation entry per distinct correspondent: the latest
    /// non-AI message exchanged with each, sorted newest-first by that
    /// message's timestamp. Machine-generated messages never form
    /// conversations.
    pub async fn get_user_conversations(&self, user_id: EntityId) -> Vec<Conversation> {
        let messages = self.get_messages(user_id, None).await;
        let mut conversations: HashMap<EntityId, Conversation> = HashMap::new();

        for entry in messages {
            if entry.message.is_ai {
                continue;
            }
            let other_id = if entry.message.sender_id == user_id {
                match entry.message.receiver_id {
                    Some(receiver_id) => receiver_id,
                    None => continue,
                }
            } else {
                entry.message.sender_id
            };
            let Some(other_user) = self.store.users.get(other_id).await else {
                continue;
            };

            let newer = conversations
                .get(&other_id)
                .map(|existing| {
                    (entry.message.created_at, entry.message.id)
                        > (existing.last_message.message.created_at, existing.last_message.message.id)
                })
                .unwrap_or(true);
            if newer {
                conversations.insert(
                    other_id,
                    Conversation {
                        user: other_user,
                        last_message: entry,
                    },
                );
            }
        }

        let mut conversations: Vec<Conversation> = conversations.into_values().collect();
        conversations.sort_by(|a, b| {
            (b.last_message.message.created_at, b.last_message.message.id)
                .cmp(&(a.last_message.message.created_at, a.last_message.message.id))
        });
        conversations
    }

    // Friendship operations

    /// Append a directional friendship edge. Nothing prevents duplicate
    /// pending requests between the same pair.
    pub async fn create_friendship(&self, new_friendship: NewFriendship) -> AppResult<Friendship> {
        if new_friendship.user_id == new_friendship.friend_id {
            return Err(AppError::Validation(
                "cannot create a friendship with yourself".to_string(),
            ));
        }

        let friendship = Friendship {
            id: self.store.friendships.next_id(),
            user_id: new_friendship.user_id,
            friend_id: new_friendship.friend_id,
            status: new_friendship.status,
            created_at: Utc::now(),
        };
        self.store
            .friendships
            .put(friendship.id, friendship.clone())
            .await;
        info!(
            "create_friendship: Edge {} {}->{} ({})",
            friendship.id, friendship.user_id, friendship.friend_id, friendship.status
        );
        Ok(friendship)
    }

    /// Accepted edges touching `user_id`, joined with the party on the other
    /// side regardless of which side initiated.
    pub async fn get_friendships(&self, user_id: EntityId) -> Vec<FriendshipWithFriend> {
        let friendships = self.store.friendships.all().await;
        let mut joined = Vec::new();

        for friendship in friendships {
            if friendship.status != FriendshipStatus::Accepted {
                continue;
            }
            if friendship.user_id != user_id && friendship.friend_id != user_id {
                continue;
            }
            let other_id = if friendship.user_id == user_id {
                friendship.friend_id
            } else {
                friendship.user_id
            };
            if let Some(friend) = self.store.users.get(other_id).await {
                joined.push(FriendshipWithFriend { friendship, friend });
            }
        }
        joined
    }

    /// Pending edges targeting `user_id`, joined with the initiator.
    pub async fn get_friend_requests(&self, user_id: EntityId) -> Vec<FriendRequest> {
        let friendships = self.store.friendships.all().await;
        let mut requests = Vec::new();

        for friendship in friendships {
            if friendship.friend_id != user_id || friendship.status != FriendshipStatus::Pending {
                continue;
            }
            if let Some(user) = self.store.users.get(friendship.user_id).await {
                requests.push(FriendRequest { friendship, user });
            }
        }
        requests
    }

    pub async fn update_friendship_status(
        &self,
        id: EntityId,
        status: FriendshipStatus,
    ) -> Option<Friendship> {
        let friendship = self
            .store
            .friendships
            .update(id, |friendship| friendship.status = status)
            .await;
        if let Some(ref friendship) = friendship {
            info!(
                "update_friendship_status: Edge {} is now {}",
                friendship.id, friendship.status
            );
        }
        friendship
    }

    // Notification operations

    pub async fn create_notification(&self, new_notification: NewNotification) -> Notification {
        let notification = Notification {
            id: self.store.notifications.next_id(),
            user_id: new_notification.user_id,
            kind: new_notification.kind,
            content: new_notification.content,
            from_user_id: new_notification.from_user_id,
            is_read: false,
            created_at: Utc::now(),
        };
        self.store
            .notifications
            .put(notification.id, notification.clone())
            .await;
        notification
    }

    /// All notifications for `user_id`, newest first, joined with the
    /// originating user when one is recorded.
    pub async fn get_user_notifications(&self, user_id: EntityId) -> Vec<NotificationWithUser> {
        let mut notifications = self.store.notifications.all().await;
        notifications.retain(|notification| notification.user_id == user_id);
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut joined = Vec::with_capacity(notifications.len());
        for notification in notifications {
            let from_user = match notification.from_user_id {
                Some(from_user_id) => self.store.users.get(from_user_id).await,
                None => None,
            };
            joined.push(NotificationWithUser {
                notification,
                from_user,
            });
        }
        joined
    }

    pub async fn mark_notification_read(&self, id: EntityId) -> Option<Notification> {
        self.store
            .notifications
            .update(id, |notification| notification.is_read = true)
            .await
    }
}
