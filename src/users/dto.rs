use serde::Deserialize;

/// Request body for sign-in. `identifier` is a username, email or phone number.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    #[serde(alias = "username", alias = "email", alias = "phone")]
    pub identifier: String,
    pub password: String,
}

/// Fields accepted when registering a user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub phone: String,
    pub sex: String,
    pub password: String,
    #[serde(skip_deserializing)]
    pub salt: String,
    pub score: i64,
    pub status: String,
    pub avatar: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<String>,
    pub score: Option<i64>,
    pub status: Option<String>,
    pub avatar: Option<String>,
}
