use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth strategy `{0}`, please use `basic`, `oauth` or `imp`")]
    InvalidStrategy(String),

    #[error("Please supply `{0}` to authenticate")]
    MissingCredentials(&'static str),
}
