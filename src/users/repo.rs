use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::{
    db::like_pattern,
    error::StoreError,
    users::{
        dto::{NewUser, UserPatch},
        repo_types::{User, UserFilter, UserLookup},
    },
    util::page::PageRequest,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<User>, StoreError>;
    /// First user (lowest id) matching any non-empty key of `lookup`.
    async fn find_one(&self, lookup: &UserLookup<'_>) -> Result<Option<User>, StoreError>;
    /// One page ordered by id descending, plus the number of rows matching `filter`.
    async fn find_and_count(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<(Vec<User>, i64), StoreError>;
    /// Inserts in its own transaction and returns the new id.
    async fn insert(&self, user: &NewUser) -> Result<i64, StoreError>;
    async fn update(&self, id: i64, patch: &UserPatch) -> Result<u64, StoreError>;
    async fn delete(&self, id: i64) -> Result<u64, StoreError>;
    async fn count(&self) -> Result<i64, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, nickname, email, phone, sex, password, salt,
                   score, status, avatar, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_one(&self, lookup: &UserLookup<'_>) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, nickname, email, phone, sex, password, salt,
                   score, status, avatar, created_at, updated_at
            FROM users
            WHERE ($1::text <> '' AND username = $1)
               OR ($2::text <> '' AND email = $2)
               OR ($3::text <> '' AND phone = $3)
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(lookup.username)
        .bind(lookup.email)
        .bind(lookup.phone)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_and_count(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<(Vec<User>, i64), StoreError> {
        let username = filter.username.as_deref().map(like_pattern);
        let phone = filter.phone.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, nickname, email, phone, sex, password, salt,
                   score, status, avatar, created_at, updated_at
            FROM users
            WHERE ($1::text IS NULL OR username LIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR phone LIKE $2 ESCAPE '\')
            ORDER BY id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&username)
        .bind(&phone)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::text IS NULL OR username LIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR phone LIKE $2 ESCAPE '\')
            "#,
        )
        .bind(&username)
        .bind(&phone)
        .fetch_one(&self.db)
        .await?;

        Ok((rows, total))
    }

    async fn insert(&self, user: &NewUser) -> Result<i64, StoreError> {
        let mut tx = self.db.begin().await?;
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, nickname, email, phone, sex, password, salt,
                               score, status, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.sex)
        .bind(&user.password)
        .bind(&user.salt)
        .bind(user.score)
        .bind(&user.status)
        .bind(&user.avatar)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(id) => {
                tx.commit().await?;
                Ok(id)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "rollback after failed user insert");
                }
                Err(e.into())
            }
        }
    }

    async fn update(&self, id: i64, patch: &UserPatch) -> Result<u64, StoreError> {
        let mut tx = self.db.begin().await?;
        let updated = sqlx::query(
            r#"
            UPDATE users
               SET username = COALESCE($2, username),
                   nickname = COALESCE($3, nickname),
                   email = COALESCE($4, email),
                   phone = COALESCE($5, phone),
                   sex = COALESCE($6, sex),
                   score = COALESCE($7, score),
                   status = COALESCE($8, status),
                   avatar = COALESCE($9, avatar),
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.username)
        .bind(&patch.nickname)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(&patch.sex)
        .bind(patch.score)
        .bind(&patch.status)
        .bind(&patch.avatar)
        .execute(&mut *tx)
        .await;

        match updated {
            Ok(res) => {
                tx.commit().await?;
                Ok(res.rows_affected())
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, user_id = id, "rollback after failed user update");
                }
                Err(e.into())
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }
}


#[cfg(all(test, feature = "pg-tests"))]
mod pg_tests {
    use super::*;

    fn new_user(username: &str, email: &str, phone: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            phone: phone.into(),
            password: "hash".into(),
            salt: "abcdef".into(),
            ..Default::default()
        }
    }

    fn first_page() -> PageRequest {
        PageRequest { page: 1, limit: 10 }
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    async fn insert_get_and_find_one(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let id = store
            .insert(&new_user("alice", "alice@example.com", ""))
            .await
            .expect("insert");

        let user = store.get(id).await.expect("get").expect("row");
        assert_eq!(user.username, "alice");
        assert_eq!(user.salt, "abcdef");

        let by_email = UserLookup {
            email: "alice@example.com",
            ..Default::default()
        };
        let found = store.find_one(&by_email).await.expect("find").expect("row");
        assert_eq!(found.id, id);

        // the empty email/phone keys here must not match alice's empty phone
        let nothing = UserLookup {
            username: "nobody",
            ..Default::default()
        };
        assert!(store.find_one(&nothing).await.expect("find").is_none());
        assert!(store.get(id + 1000).await.expect("get").is_none());
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    async fn duplicate_key_insert_is_conflict_and_rolled_back(pool: PgPool) {
        let store = PgUserStore::new(pool);
        store
            .insert(&new_user("alice", "", "13812345678"))
            .await
            .expect("insert");
        store.insert(&new_user("bob", "", "")).await.expect("empty keys repeat");

        let err = store
            .insert(&new_user("carol", "", "13812345678"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict), "got {err:?}");
        assert_eq!(store.count().await.expect("count"), 2);
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    async fn failed_insert_leaves_no_row(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let too_long = "x".repeat(61);
        let err = store
            .insert(&new_user(&too_long, "", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Database(_)), "got {err:?}");
        assert_eq!(store.count().await.expect("count"), 0);
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    async fn update_patches_only_given_columns(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let id = store
            .insert(&new_user("alice", "alice@example.com", ""))
            .await
            .expect("insert");
        let before = store.get(id).await.expect("get").expect("row");

        let patch = UserPatch {
            nickname: Some("Al".into()),
            score: Some(9),
            ..Default::default()
        };
        assert_eq!(store.update(id, &patch).await.expect("update"), 1);

        let after = store.get(id).await.expect("get").expect("row");
        assert_eq!(after.nickname, "Al");
        assert_eq!(after.score, 9);
        assert_eq!(after.username, "alice");
        assert_eq!(after.email, "alice@example.com");
        assert_eq!(after.password, before.password);
        assert!(after.updated_at >= before.updated_at);

        assert_eq!(store.update(id + 1000, &patch).await.expect("update"), 0);
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    async fn update_onto_taken_key_is_conflict_and_rolled_back(pool: PgPool) {
        let store = PgUserStore::new(pool);
        store
            .insert(&new_user("alice", "", ""))
            .await
            .expect("insert");
        let bob = store.insert(&new_user("bob", "", "")).await.expect("insert");

        let patch = UserPatch {
            username: Some("alice".into()),
            nickname: Some("Bobby".into()),
            ..Default::default()
        };
        let err = store.update(bob, &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict), "got {err:?}");

        let unchanged = store.get(bob).await.expect("get").expect("row");
        assert_eq!(unchanged.username, "bob");
        assert_eq!(unchanged.nickname, "");
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    async fn like_filters_treat_wildcards_literally(pool: PgPool) {
        let store = PgUserStore::new(pool);
        for name in ["a_b", "axb", "50%off", "500ff"] {
            store.insert(&new_user(name, "", "")).await.expect("insert");
        }

        let filter = UserFilter {
            username: Some("a_b".into()),
            ..Default::default()
        };
        let (rows, total) = store
            .find_and_count(&filter, &first_page())
            .await
            .expect("query");
        assert_eq!(total, 1);
        assert_eq!(rows[0].username, "a_b");

        let filter = UserFilter {
            username: Some("0%".into()),
            ..Default::default()
        };
        let (rows, total) = store
            .find_and_count(&filter, &first_page())
            .await
            .expect("query");
        assert_eq!(total, 1);
        assert_eq!(rows[0].username, "50%off");
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    async fn find_and_count_pages_newest_first(pool: PgPool) {
        let store = PgUserStore::new(pool);
        for i in 0..5 {
            store
                .insert(&new_user(&format!("user{i}"), "", ""))
                .await
                .expect("insert");
        }

        let page = PageRequest { page: 2, limit: 2 };
        let (rows, total) = store
            .find_and_count(&UserFilter::default(), &page)
            .await
            .expect("query");
        assert_eq!(total, 5);
        let names: Vec<_> = rows.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["user2", "user1"]);

        let far = PageRequest {
            page: i64::MAX,
            limit: 100,
        };
        let (rows, total) = store
            .find_and_count(&UserFilter::default(), &far)
            .await
            .expect("query");
        assert!(rows.is_empty());
        assert_eq!(total, 5);

        assert_eq!(store.delete(1).await.expect("delete"), 1);
        assert_eq!(store.delete(1).await.expect("delete"), 0);
        assert_eq!(store.count().await.expect("count"), 4);
    }
}
