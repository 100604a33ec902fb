use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    /// Address contact submissions are delivered to.
    pub recipient: String,
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(flatten)]
    pub provider: MailProviderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum MailProviderConfig {
    Ses(SesConfig),
    Null,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SesConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl MailConfig {
    pub fn format_from(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_address),
            None => self.from_address.clone(),
        }
    }
}
