//! Shared meme listing kept by the backend

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{check, json, BackendClient};
use crate::error::BackendError;
use crate::export::ExportedMeme;
use crate::session::{Identity, SessionContext};
use crate::task::Task;

pub const BUCKET: &str = "memes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeRecord {
    pub id: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

pub trait MemeListing: Send + Sync {
    /// Every meme, most recent first.
    fn recent(&self, access_token: Option<&str>) -> Result<Vec<MemeRecord>, BackendError>;
    /// Store an exported PNG and list it under `user`.
    fn publish(&self, user: &Identity, access_token: &str, png: &[u8]) -> Result<MemeRecord, BackendError>;
}

pub struct SupabaseListing {
    client: BackendClient,
}

impl SupabaseListing {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn public_url(&self, object: &str) -> String {
        self.client
            .endpoint(&format!("storage/v1/object/public/{BUCKET}/{object}"))
    }
}

#[derive(Serialize)]
struct NewMeme<'a> {
    image_url: &'a str,
    user_id: &'a str,
}

impl MemeListing for SupabaseListing {
    fn recent(&self, access_token: Option<&str>) -> Result<Vec<MemeRecord>, BackendError> {
        let resp = self
            .client
            .request(reqwest::Method::GET, "rest/v1/memes?select=*&order=created_at.desc", access_token)
            .send()?;
        let mut memes: Vec<MemeRecord> = json(resp)?;
        // Don't trust the server's ordering blindly
        sort_recent_first(&mut memes);
        Ok(memes)
    }

    fn publish(&self, user: &Identity, access_token: &str, png: &[u8]) -> Result<MemeRecord, BackendError> {
        let object = object_path(user);
        let resp = self
            .client
            .request(reqwest::Method::POST, &format!("storage/v1/object/{BUCKET}/{object}"), Some(access_token))
            .header("Content-Type", "image/png")
            .body(png.to_vec())
            .send()?;
        check(resp)?;

        let image_url = self.public_url(&object);
        let resp = self
            .client
            .request(reqwest::Method::POST, "rest/v1/memes", Some(access_token))
            .header("Prefer", "return=representation")
            .json(&NewMeme { image_url: &image_url, user_id: &user.id })
            .send()?;
        let mut rows: Vec<MemeRecord> = json(resp)?;
        let record = rows.pop().ok_or_else(|| BackendError::Status {
            status: 200,
            body: "insert returned no row".into(),
        })?;
        log::info!("published meme {} for {}", record.id, user.id);
        Ok(record)
    }
}

pub type PublishTask = Task<Result<MemeRecord, BackendError>>;

/// Upload a finished export to the listing in the background.
///
/// Nothing runs unless publishing is `enabled`, a listing is configured
/// and someone is signed in. The exported file on disk is never touched,
/// so a failed upload only fails the task.
pub fn begin_publish(
    enabled: bool,
    listing: Option<&Arc<dyn MemeListing>>,
    session: &SessionContext,
    meme: &ExportedMeme,
) -> Option<PublishTask> {
    if !enabled {
        return None;
    }
    let listing = listing?.clone();
    let user = session.current_user()?.clone();
    let token = session.access_token()?.to_string();
    let png = meme.png.clone();
    log::debug!("publishing {} for {}", meme.path.display(), user.id);
    Some(Task::spawn(move || listing.publish(&user, &token, &png)))
}

/// `<user id>/<random>.png`
pub fn object_path(user: &Identity) -> String {
    format!("{}/{}.png", user.id, uuid::Uuid::new_v4())
}

pub fn sort_recent_first(memes: &mut [MemeRecord]) {
    memes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_parse_and_sort() {
        let body = r#"[
            {"id":"1","image_url":"https://x/1.png","created_at":"2024-03-01T10:00:00+00:00","user_id":"u"},
            {"id":"2","image_url":"https://x/2.png","created_at":"2024-05-01T10:00:00.123456+00:00","user_id":"u"},
            {"id":"3","image_url":"https://x/3.png","created_at":"2023-12-31T23:59:59Z","user_id":"v"}
        ]"#;
        let mut memes: Vec<MemeRecord> = serde_json::from_str(body).unwrap();
        sort_recent_first(&mut memes);
        let ids: Vec<&str> = memes.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["2", "1", "3"]);
    }

    #[test]
    fn test_object_path_scoped_to_user() {
        let user = Identity { id: "abc".into(), email: None };
        let a = object_path(&user);
        let b = object_path(&user);
        assert!(a.starts_with("abc/") && a.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_public_url() {
        let listing = SupabaseListing::new(BackendClient::new("https://p.supabase.co", "k").unwrap());
        assert_eq!(
            listing.public_url("abc/1.png"),
            "https://p.supabase.co/storage/v1/object/public/memes/abc/1.png"
        );
    }
}
