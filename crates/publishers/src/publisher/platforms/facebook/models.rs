use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct PageListResponse {
    #[serde(default)]
    pub data: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageEntry {
    pub id: String,
    pub name: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub name: String,
    pub picture: Option<Picture>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Picture {
    pub data: PictureData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PictureData {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedVideo {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_listing() {
        let body = r#"{
            "data": [
                {"id": "111", "name": "First Page", "access_token": "page-token-1"},
                {"id": "222", "name": "Second Page", "access_token": "page-token-2"}
            ]
        }"#;
        let parsed: PageListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[1].name, "Second Page");
    }

    #[test]
    fn parses_me_with_picture() {
        let body = r#"{
            "name": "Ada",
            "picture": {"data": {"url": "https://fb.example/ada.png"}}
        }"#;
        let parsed: MeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.name, "Ada");
        assert_eq!(parsed.picture.unwrap().data.url, "https://fb.example/ada.png");
    }
}
