use serde::{Deserialize, Serialize};

/// Issueの担当者・報告者や作業ログの作成者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "accountId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "displayName")]
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "emailAddress")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(rename = "self")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    // Server/Data Center のみ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "avatarUrls")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_urls: Option<AvatarUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "timeZone")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(rename = "accountType")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarUrls {
    #[serde(rename = "48x48")]
    pub size_48: String,
    #[serde(rename = "24x24")]
    pub size_24: String,
    #[serde(rename = "16x16")]
    pub size_16: String,
    #[serde(rename = "32x32")]
    pub size_32: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_deserialization() {
        let json_data = json!({
            "accountId": "5b10ac8d82e05b22cc7d4ef5",
            "displayName": "Mia Krystof",
            "emailAddress": "mia@example.com",
            "self": "https://your-domain.atlassian.net/rest/api/3/user?accountId=5b10ac8d82e05b22cc7d4ef5",
            "avatarUrls": {
                "48x48": "https://avatar.example.com/48.png",
                "24x24": "https://avatar.example.com/24.png",
                "16x16": "https://avatar.example.com/16.png",
                "32x32": "https://avatar.example.com/32.png"
            },
            "active": true,
            "timeZone": "Australia/Sydney",
            "accountType": "atlassian"
        });

        let user: User = serde_json::from_value(json_data).unwrap();

        assert_eq!(user.account_id.as_deref(), Some("5b10ac8d82e05b22cc7d4ef5"));
        assert_eq!(user.display_name, "Mia Krystof");
        assert_eq!(user.email_address, Some("mia@example.com".to_string()));
        assert_eq!(user.active, Some(true));
    }

    #[test]
    fn test_server_user_without_account_id() {
        let user: User = serde_json::from_value(json!({
            "name": "mia",
            "key": "mia",
            "displayName": "Mia Krystof"
        }))
        .unwrap();

        assert!(user.account_id.is_none());
        assert_eq!(user.name.as_deref(), Some("mia"));
    }
}
