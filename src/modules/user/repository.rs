use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// Identity record. Created on first successful OAuth login for an email and
/// never mutated or deleted afterwards.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

impl User {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            picture: self.picture.clone(),
        }
    }
}

pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

pub async fn create<'e, E>(e: E, payload: CreateUserPayload) -> Result<User>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "
        INSERT INTO users (name, email, picture)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(payload.name)
    .bind(payload.email)
    .bind(payload.picture)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while creating a user account: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching user with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn find_by_email<'e, E: PgExecutor<'e>>(e: E, email: String) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred in find_by_email: {}", err);
            Error::UnexpectedError
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user() -> User {
        User {
            id: 7,
            name: String::from("Ada"),
            email: String::from("ada@example.com"),
            picture: None,
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn view_projects_public_fields_only() {
        let value = serde_json::to_value(user().view()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        for key in ["id", "name", "email", "picture"] {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(value["id"], 7);
        assert_eq!(value["picture"], serde_json::Value::Null);
    }
}
