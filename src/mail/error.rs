use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail configuration error: {0}")]
    Config(String),

    #[error("mail provider error: {0}")]
    Provider(String),
}
