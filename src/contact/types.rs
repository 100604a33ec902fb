use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Honeypot field; humans leave it empty.
    #[serde(default)]
    pub hp: Option<String>,
    /// Millisecond timestamp of when the form was opened, reported by the
    /// client. Submissions faster than a human could type are dropped.
    #[serde(default)]
    pub started_at: Option<i64>,
}
