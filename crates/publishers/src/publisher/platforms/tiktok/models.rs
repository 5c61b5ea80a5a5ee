use serde::Deserialize;

/// Direct-post submission response. The platform acknowledges with a flag,
/// not an identifier.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListResponse {
    pub data: VideoListData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListData {
    #[serde(default)]
    pub videos: Vec<VideoSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoSummary {
    pub id: String,
    pub share_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfoResponse {
    pub data: UserInfoData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfoData {
    pub user: UserInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfo {
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_flag() {
        let accepted: SubmitResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(accepted.success);

        let rejected: SubmitResponse =
            serde_json::from_str(r#"{"success": false, "message": "spam_risk"}"#).unwrap();
        assert!(!rejected.success);
        assert_eq!(rejected.message.as_deref(), Some("spam_risk"));
    }

    #[test]
    fn parses_video_listing() {
        let body = r#"{
            "data": {
                "videos": [{
                    "id": "7301",
                    "create_time": 1700000000,
                    "title": "clip",
                    "share_url": "https://www.tiktok.com/@user/video/7301"
                }]
            }
        }"#;
        let parsed: VideoListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.videos[0].id, "7301");
        assert_eq!(
            parsed.data.videos[0].share_url.as_deref(),
            Some("https://www.tiktok.com/@user/video/7301")
        );
    }

    #[test]
    fn empty_listing_parses() {
        let parsed: VideoListResponse =
            serde_json::from_str(r#"{"data": {"videos": []}}"#).unwrap();
        assert!(parsed.data.videos.is_empty());
    }
}
