use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::{
    error::{ServiceError, ServiceResult, StoreError},
    users::{
        dto::{NewUser, UserPatch},
        repo::UserStore,
        repo_types::{User, UserFilter, UserLookup},
    },
    util::{
        crypto::{hash_password, random_string, verify_password, SALT_LEN},
        page::{Page, PageRequest},
        param_str,
        validator::{
            is_cellphone, is_email, is_password, CELLPHONE_RULE, EMAIL_RULE, PASSWORD_RULE,
        },
        Params,
    },
};

/// CRUD and credential operations on users.
///
/// Every public operation holds `lock` for its whole body, so calls on one
/// instance never interleave inside this process.
pub struct UserService {
    store: Arc<dyn UserStore>,
    lock: Mutex<()>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Sign in with a username, email or phone number.
    #[instrument(skip(self, password))]
    pub async fn signin(&self, identifier: &str, password: &str) -> ServiceResult<User> {
        let _guard = self.lock.lock().await;

        if identifier.is_empty() && password.is_empty() {
            return Err(ServiceError::MissingArgument("username and password"));
        }
        if identifier.is_empty() {
            return Err(ServiceError::MissingArgument("username"));
        }
        if !is_password(password) {
            return Err(ServiceError::InvalidFormat(PASSWORD_RULE));
        }

        let lookup = if is_email(identifier) {
            UserLookup {
                email: identifier,
                ..Default::default()
            }
        } else if is_cellphone(identifier) {
            UserLookup {
                phone: identifier,
                ..Default::default()
            }
        } else {
            UserLookup {
                username: identifier,
                ..Default::default()
            }
        };

        let user = self
            .store
            .find_one(&lookup)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;

        let ok = verify_password(password, &user.salt, &user.password).map_err(|e| {
            error!(error = %e, "verify_password failed");
            ServiceError::OperationFailed("password hashing")
        })?;
        if !ok {
            warn!(user_id = user.id, "signin wrong password");
            return Err(ServiceError::WrongPassword);
        }

        info!(user_id = user.id, "user signed in");
        Ok(user)
    }

    pub async fn one(&self, id: i64) -> ServiceResult<User> {
        let _guard = self.lock.lock().await;
        if id == 0 {
            return Err(ServiceError::MissingArgument("id"));
        }
        self.store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    /// Filters: `username`, `phone` (substring); pagination: `page`, `limit`.
    pub async fn query(&self, params: &Params) -> ServiceResult<(Vec<User>, Page)> {
        let _guard = self.lock.lock().await;

        let filter = UserFilter {
            username: param_str(params, "username"),
            phone: param_str(params, "phone"),
        };
        let req = PageRequest::from_params(params);
        let (users, total) = self.store.find_and_count(&filter, &req).await?;
        Ok((users, Page::new(req.page, req.limit, total)))
    }

    /// Register a user. The password is replaced by its salted hash before storage.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn add(&self, mut user: NewUser) -> ServiceResult<User> {
        let _guard = self.lock.lock().await;

        let lookup = UserLookup {
            username: &user.username,
            email: &user.email,
            phone: &user.phone,
        };
        if lookup.is_empty() {
            return Err(ServiceError::MissingArgument("username, email or phone"));
        }
        if !user.email.is_empty() && !is_email(&user.email) {
            return Err(ServiceError::InvalidFormat(EMAIL_RULE));
        }
        if !user.phone.is_empty() && !is_cellphone(&user.phone) {
            return Err(ServiceError::InvalidFormat(CELLPHONE_RULE));
        }
        if !is_password(&user.password) {
            return Err(ServiceError::InvalidFormat(PASSWORD_RULE));
        }

        if let Some(existing) = self.store.find_one(&lookup).await? {
            warn!(user_id = existing.id, "user already exists");
            return Err(ServiceError::AlreadyExists(Box::new(existing)));
        }

        let salt = random_string(SALT_LEN, true);
        user.password = hash_password(&user.password, &salt).map_err(|e| {
            error!(error = %e, "hash_password failed");
            ServiceError::OperationFailed("password hashing")
        })?;
        user.salt = salt;

        let id = match self.store.insert(&user).await {
            Ok(id) => id,
            Err(StoreError::Conflict) => {
                // another process inserted the same key after our lookup
                let lookup = UserLookup {
                    username: &user.username,
                    email: &user.email,
                    phone: &user.phone,
                };
                let existing = self
                    .store
                    .find_one(&lookup)
                    .await?
                    .ok_or(ServiceError::OperationFailed("insert"))?;
                warn!(user_id = existing.id, "user already exists (unique index)");
                return Err(ServiceError::AlreadyExists(Box::new(existing)));
            }
            Err(e) => {
                error!(error = %e, "insert user failed");
                return Err(ServiceError::OperationFailed("insert"));
            }
        };

        let stored = self
            .store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;
        info!(user_id = stored.id, "user added");
        Ok(stored)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<u64> {
        let _guard = self.lock.lock().await;
        if id == 0 {
            return Err(ServiceError::MissingArgument("id"));
        }
        let affected = self.store.delete(id).await?;
        info!(user_id = id, affected, "user deleted");
        Ok(affected)
    }

    /// Apply `patch` to user `id`; returns the number of rows written.
    pub async fn update(&self, id: i64, patch: UserPatch) -> ServiceResult<u64> {
        let _guard = self.lock.lock().await;
        if id == 0 {
            return Err(ServiceError::MissingArgument("id"));
        }
        if let Some(email) = patch.email.as_deref().filter(|e| !e.is_empty()) {
            if !is_email(email) {
                return Err(ServiceError::InvalidFormat(EMAIL_RULE));
            }
        }
        if let Some(phone) = patch.phone.as_deref().filter(|p| !p.is_empty()) {
            if !is_cellphone(phone) {
                return Err(ServiceError::InvalidFormat(CELLPHONE_RULE));
            }
        }

        if let Some(current) = self.store.get(id).await? {
            let keys = UserLookup {
                username: patch.username.as_deref().unwrap_or(&current.username),
                email: patch.email.as_deref().unwrap_or(&current.email),
                phone: patch.phone.as_deref().unwrap_or(&current.phone),
            };
            if keys.is_empty() {
                return Err(ServiceError::MissingArgument("username, email or phone"));
            }
        }
        if let Some(existing) = self.find_clash(id, &patch).await? {
            warn!(
                user_id = id,
                existing_id = existing.id,
                "update clashes with existing user"
            );
            return Err(ServiceError::AlreadyExists(Box::new(existing)));
        }

        match self.store.update(id, &patch).await {
            Ok(affected) => Ok(affected),
            Err(StoreError::Conflict) => {
                let existing = self
                    .find_clash(id, &patch)
                    .await?
                    .ok_or(ServiceError::OperationFailed("update"))?;
                warn!(
                    user_id = id,
                    existing_id = existing.id,
                    "update clashes with existing user (unique index)"
                );
                Err(ServiceError::AlreadyExists(Box::new(existing)))
            }
            Err(e) => {
                error!(error = %e, user_id = id, "update user failed");
                Err(ServiceError::OperationFailed("update"))
            }
        }
    }

    /// Another user already holding one of the identifiers `patch` sets.
    async fn find_clash(&self, id: i64, patch: &UserPatch) -> ServiceResult<Option<User>> {
        let keys = [
            UserLookup {
                username: patch.username.as_deref().unwrap_or_default(),
                ..Default::default()
            },
            UserLookup {
                email: patch.email.as_deref().unwrap_or_default(),
                ..Default::default()
            },
            UserLookup {
                phone: patch.phone.as_deref().unwrap_or_default(),
                ..Default::default()
            },
        ];
        for lookup in keys.iter().filter(|l| !l.is_empty()) {
            if let Some(user) = self.store.find_one(lookup).await? {
                if user.id != id {
                    return Ok(Some(user));
                }
            }
        }
        Ok(None)
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        let _guard = self.lock.lock().await;
        Ok(self.store.count().await?)
    }
}
