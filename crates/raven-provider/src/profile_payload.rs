use raven_profile::{FreshProfileFields, ProfileId};
use serde::Deserialize;

/// Identity plus fresh field values returned by one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedProfile {
    pub id: ProfileId,
    pub fields: FreshProfileFields,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EdgeCount {
    #[serde(default)]
    count: Option<u64>,
}

fn edge_count(edge: Option<EdgeCount>) -> Option<u64> {
    edge.and_then(|edge| edge.count)
}

/// `GET users/web_profile_info/?username=...` body.
#[derive(Debug, Deserialize)]
pub(crate) struct WebProfileInfoResponse {
    #[serde(default)]
    data: Option<WebProfileInfoData>,
}

#[derive(Debug, Deserialize)]
struct WebProfileInfoData {
    #[serde(default)]
    user: Option<WebProfileUser>,
}

#[derive(Debug, Deserialize)]
struct WebProfileUser {
    id: ProfileId,
    username: Option<String>,
    full_name: Option<String>,
    biography: Option<String>,
    edge_followed_by: Option<EdgeCount>,
    edge_follow: Option<EdgeCount>,
    edge_owner_to_timeline_media: Option<EdgeCount>,
    is_private: Option<bool>,
    is_verified: Option<bool>,
    profile_pic_url_hd: Option<String>,
    profile_pic_url: Option<String>,
}

impl WebProfileInfoResponse {
    pub(crate) fn into_profile(self) -> Option<FetchedProfile> {
        let user = self.data?.user?;
        Some(FetchedProfile {
            id: user.id,
            fields: FreshProfileFields {
                username: user.username,
                full_name: user.full_name,
                biography: user.biography,
                followers: edge_count(user.edge_followed_by),
                following: edge_count(user.edge_follow),
                posts_count: edge_count(user.edge_owner_to_timeline_media),
                is_private: user.is_private,
                is_verified: user.is_verified,
                profile_pic_url: user.profile_pic_url_hd.or(user.profile_pic_url),
            },
        })
    }
}

/// `GET users/<id>/info/` body.
#[derive(Debug, Deserialize)]
pub(crate) struct UserInfoResponse {
    #[serde(default)]
    user: Option<UserInfo>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    pk: ProfileId,
    username: Option<String>,
    full_name: Option<String>,
    biography: Option<String>,
    follower_count: Option<u64>,
    following_count: Option<u64>,
    media_count: Option<u64>,
    is_private: Option<bool>,
    is_verified: Option<bool>,
    hd_profile_pic_url_info: Option<PictureInfo>,
    profile_pic_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PictureInfo {
    url: Option<String>,
}

impl UserInfoResponse {
    pub(crate) fn into_profile(self) -> Option<FetchedProfile> {
        let user = self.user?;
        let hd_picture = user.hd_profile_pic_url_info.and_then(|info| info.url);
        Some(FetchedProfile {
            id: user.pk,
            fields: FreshProfileFields {
                username: user.username,
                full_name: user.full_name,
                biography: user.biography,
                followers: user.follower_count,
                following: user.following_count,
                posts_count: user.media_count,
                is_private: user.is_private,
                is_verified: user.is_verified,
                profile_pic_url: hd_picture.or(user.profile_pic_url),
            },
        })
    }
}
