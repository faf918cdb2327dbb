use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct MenuItem {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MenuItemView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: i32,
}

impl MenuItem {
    pub fn view(&self) -> MenuItemView {
        MenuItemView {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            category_id: self.category_id,
        }
    }
}

/// A menu item joined with the parent category columns needed for ownership
/// checks and for rendering links back to the category.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct MenuItemWithCategory {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub category_name: String,
    pub category_slug: String,
    pub category_user_id: i32,
}

impl MenuItemWithCategory {
    pub fn view(&self) -> MenuItemView {
        MenuItemView {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            category_id: self.category_id,
        }
    }
}

pub struct CreateMenuItemPayload {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: i32,
}

pub async fn create<'e, E>(e: E, payload: CreateMenuItemPayload) -> Result<MenuItem>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, MenuItem>(
        "
        INSERT INTO menu_items (name, slug, description, category_id)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        ",
    )
    .bind(payload.name)
    .bind(payload.slug)
    .bind(payload.description)
    .bind(payload.category_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to create a menu item: {}", err);
        Error::UnexpectedError
    })
}

pub struct UpdateMenuItemPayload {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Edits never touch the id or the parent category; the description is
/// replaced with whatever was submitted, including nothing.
pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: i32,
    payload: UpdateMenuItemPayload,
) -> Result<()> {
    sqlx::query(
        "
        UPDATE menu_items SET
            name = $1,
            slug = $2,
            description = $3,
            updated_at = NOW()
        WHERE
            id = $4
        ",
    )
    .bind(payload.name)
    .bind(payload.slug)
    .bind(payload.description)
    .bind(id)
    .execute(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to update menu item {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
    .map(|_| ())
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<()> {
    sqlx::query("DELETE FROM menu_items WHERE id = $1")
        .bind(id)
        .execute(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to delete menu item {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
        .map(|_| ())
}

/// Lookup by item slug, normalized so that an unknown slug and a slug whose
/// parent category differs from the requested one both come back as `None`.
pub async fn find_by_slug_in_category<'e, E: PgExecutor<'e>>(
    e: E,
    category_slug: String,
    menu_slug: String,
) -> Result<Option<MenuItemWithCategory>> {
    sqlx::query_as::<_, MenuItemWithCategory>(
        "
        SELECT
            m.id,
            m.category_id,
            m.name,
            m.slug,
            m.description,
            m.created_at,
            m.updated_at,
            c.name AS category_name,
            c.slug AS category_slug,
            c.user_id AS category_user_id
        FROM menu_items m
        JOIN categories c ON c.id = m.category_id
        WHERE m.slug = $1
        ",
    )
    .bind(menu_slug.clone())
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching menu item with slug {}: {}",
            menu_slug,
            err
        );
        Error::UnexpectedError
    })
    .map(|maybe_item| maybe_item.filter(|item| item.category_slug == category_slug))
}

/// The most recently created items across all categories, for the home page.
pub async fn find_recent<'e, E: PgExecutor<'e>>(
    e: E,
    limit: i64,
) -> Result<Vec<MenuItemWithCategory>> {
    sqlx::query_as::<_, MenuItemWithCategory>(
        "
        SELECT
            m.id,
            m.category_id,
            m.name,
            m.slug,
            m.description,
            m.created_at,
            m.updated_at,
            c.name AS category_name,
            c.slug AS category_slug,
            c.user_id AS category_user_id
        FROM menu_items m
        JOIN categories c ON c.id = m.category_id
        ORDER BY m.created_at DESC
        LIMIT $1
        ",
    )
    .bind(limit)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching recent menu items: {}", err);
        Error::UnexpectedError
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn view_projects_the_public_fields() {
        let item = MenuItem {
            id: 11,
            category_id: 3,
            name: String::from("Cleats"),
            slug: String::from("soccer_cleats"),
            description: None,
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            updated_at: None,
        };

        let value = serde_json::to_value(item.view()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 5);
        for key in ["id", "name", "slug", "description", "category_id"] {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(value["category_id"], 3);
        assert_eq!(value["description"], serde_json::Value::Null);
    }
}
