// Data seeder - fixed sample data applied at process start
// State is volatile, so every boot re-seeds the same accounts and posts

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::info;

use crate::models::{Post, User};
use crate::store::EntityStore;

struct SampleUser {
    username: &'static str,
    password: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    bio: &'static str,
    profile_picture: &'static str,
    cover_photo: &'static str,
    is_verified: bool,
    is_online: bool,
}

struct SamplePost {
    user_index: usize,
    content: &'static str,
    image_url: Option<&'static str>,
    likes: i64,
    comments: i64,
    shares: i64,
}

const SAMPLE_USERS: &[SampleUser] = &[
    // Platform owner account
    SampleUser {
        username: "Daniel Mojar",
        password: "danielot",
        first_name: "Daniel",
        last_name: "Mojar",
        email: "daniel@whatsup.com",
        bio: "Founder & CEO at WhatsUp • Platform Owner",
        profile_picture: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=200&h=200",
        cover_photo: "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=1200&h=400",
        is_verified: true,
        is_online: true,
    },
    SampleUser {
        username: "Sarah Johnson",
        password: "password123",
        first_name: "Sarah",
        last_name: "Johnson",
        email: "sarah@example.com",
        bio: "",
        profile_picture: "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=100&h=100",
        cover_photo: "",
        is_verified: false,
        is_online: true,
    },
    SampleUser {
        username: "Mike Chen",
        password: "password123",
        first_name: "Mike",
        last_name: "Chen",
        email: "mike@example.com",
        bio: "",
        profile_picture: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=100&h=100",
        cover_photo: "",
        is_verified: false,
        is_online: true,
    },
    SampleUser {
        username: "Alex Rivera",
        password: "password123",
        first_name: "Alex",
        last_name: "Rivera",
        email: "alex@example.com",
        bio: "",
        profile_picture: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=200&h=200",
        cover_photo: "",
        is_verified: false,
        is_online: false,
    },
];

const SAMPLE_POSTS: &[SamplePost] = &[
    SamplePost {
        user_index: 1, // Sarah
        content: "Just had an amazing weekend at the mountains! Nature therapy is real 🏔️ #mountains #nature #weekend",
        image_url: Some("https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=800&h=600"),
        likes: 47,
        comments: 12,
        shares: 3,
    },
    SamplePost {
        user_index: 2, // Mike
        content: "Working on some exciting new projects! Can't wait to share what we've been building 🚀 #coding #startup #innovation",
        image_url: None,
        likes: 23,
        comments: 8,
        shares: 2,
    },
    SamplePost {
        user_index: 0, // Daniel
        content: "Excited to announce the launch of WhatsUp! 🚀 A new social platform built for genuine connections and meaningful conversations. Thank you to everyone who has supported this journey! #WhatsUp #SocialMedia #Innovation",
        image_url: Some("https://images.unsplash.com/photo-1522202176988-66273c2fd55f?w=800&h=600"),
        likes: 128,
        comments: 45,
        shares: 23,
    },
];

fn optional(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Populate the store with the fixed sample accounts and posts.
pub async fn seed_store(store: &EntityStore) {
    let now = Utc::now();
    let mut user_ids = Vec::with_capacity(SAMPLE_USERS.len());

    for sample in SAMPLE_USERS {
        let user = User {
            id: store.users.next_id(),
            username: sample.username.to_string(),
            password: sample.password.to_string(),
            first_name: Some(sample.first_name.to_string()),
            last_name: Some(sample.last_name.to_string()),
            email: Some(sample.email.to_string()),
            bio: optional(sample.bio),
            profile_picture: optional(sample.profile_picture),
            cover_photo: optional(sample.cover_photo),
            is_verified: sample.is_verified,
            is_online: sample.is_online,
            last_seen: now,
            created_at: now,
        };
        user_ids.push(user.id);
        store.users.put(user.id, user).await;
    }

    let mut rng = rand::rng();
    for sample in SAMPLE_POSTS {
        // Spread posts over the last week so the seeded feed has an order
        let age_hours = rng.random_range(1..(24 * 7));
        let post = Post {
            id: store.posts.next_id(),
            user_id: user_ids[sample.user_index],
            content: sample.content.to_string(),
            image_url: sample.image_url.map(|url| url.to_string()),
            video_url: None,
            likes: sample.likes,
            comments: sample.comments,
            shares: sample.shares,
            created_at: now - Duration::hours(age_hours),
        };
        store.posts.put(post.id, post).await;
    }

    info!(
        "seed_store: Seeded {} users and {} posts",
        SAMPLE_USERS.len(),
        SAMPLE_POSTS.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_is_idempotent_per_boot() {
        let store = EntityStore::new();
        seed_store(&store).await;

        assert_eq!(store.users.len().await, SAMPLE_USERS.len());
        assert_eq!(store.posts.len().await, SAMPLE_POSTS.len());

        // Owner account is seeded first and verified
        let owner = store.users.get(1).await.unwrap();
        assert_eq!(owner.username, "Daniel Mojar");
        assert!(owner.is_verified);
    }
}
