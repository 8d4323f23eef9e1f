use anyhow::Context;
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::state::AppState;

/// Upload the new avatar, persist its public URL, then drop the old object.
///
/// The delete is best-effort: the row already points at the new URL, so a
/// leaked orphan object is preferable to a failed request.
pub async fn store_avatar(
    st: &AppState,
    user: &User,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<User> {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("avatars/{}/{}.{}", user.id, Uuid::new_v4(), ext);

    st.storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let url = st.storage.object_url(&key);
    let updated = User::set_avatar_url(&st.db, user.id, &url).await?;

    if let Some(old_url) = &user.avatar_url {
        if let Some(old_key) = key_from_url(st, old_url) {
            if let Err(e) = st.storage.delete_object(&old_key).await {
                warn!(error = %e, key = %old_key, "failed to delete replaced avatar");
            }
        }
    }

    Ok(updated)
}

/// Invert `object_url`: a URL inside our bucket maps back to its key.
fn key_from_url(st: &AppState, url: &str) -> Option<String> {
    let base = st.storage.object_url("");
    url.strip_prefix(&base)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }

    #[tokio::test]
    async fn key_from_url_strips_the_bucket_base() {
        let state = AppState::fake();
        let url = state.storage.object_url("avatars/u/a.jpg");
        assert_eq!(
            key_from_url(&state, &url),
            Some("avatars/u/a.jpg".to_string())
        );
    }

    #[tokio::test]
    async fn key_from_url_rejects_foreign_urls() {
        let state = AppState::fake();
        assert_eq!(
            key_from_url(&state, "https://res.cloudinary.com/demo/avatar.jpg"),
            None
        );
        let base = state.storage.object_url("");
        assert_eq!(key_from_url(&state, &base), None);
    }
}
