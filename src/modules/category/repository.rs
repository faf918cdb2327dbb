use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::modules::menu_item::repository::{MenuItem, MenuItemView};
use crate::modules::user::repository::User;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// A named grouping of menu items, owned by exactly one user. Categories are
/// seeded ahead of time; no HTTP route creates or deletes them.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Category {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub slug: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

/// The nested projection served by the JSON catalogue endpoints.
#[derive(Serialize, Clone, Debug)]
pub struct CategoryWithItems {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub menu_items: Vec<MenuItemView>,
}

impl Category {
    pub fn view(&self) -> CategoryView {
        CategoryView {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }
}

pub async fn find_by_slug<'e, E: PgExecutor<'e>>(e: E, slug: String) -> Result<Option<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1")
        .bind(slug.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching category with slug {}: {}",
                slug,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_all_ordered_by_name<'e, E: PgExecutor<'e>>(e: E) -> Result<Vec<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching all categories: {}", err);
            Error::UnexpectedError
        })
}

/// All categories, newest first, each carrying its items newest first.
pub async fn find_all_with_items<'e, E>(e: E) -> Result<Vec<CategoryWithItems>>
where
    E: PgExecutor<'e> + Copy,
{
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY created_at DESC")
            .fetch_all(e)
            .await
            .map_err(|err| {
                tracing::error!("Error occurred while fetching all categories: {}", err);
                Error::UnexpectedError
            })?;

    let ids: Vec<i32> = categories.iter().map(|category| category.id).collect();
    let items = sqlx::query_as::<_, MenuItem>(
        "SELECT * FROM menu_items WHERE category_id = ANY($1) ORDER BY created_at DESC",
    )
    .bind(&ids)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching catalogue items: {}", err);
        Error::UnexpectedError
    })?;

    Ok(categories
        .into_iter()
        .map(|category| {
            let menu_items = items
                .iter()
                .filter(|item| item.category_id == category.id)
                .map(|item| item.view())
                .collect();
            CategoryWithItems {
                id: category.id,
                name: category.name,
                slug: category.slug,
                menu_items,
            }
        })
        .collect())
}

pub async fn find_by_slug_with_items<'e, E>(
    e: E,
    slug: String,
) -> Result<Option<CategoryWithItems>>
where
    E: PgExecutor<'e> + Copy,
{
    let category = match find_by_slug(e, slug).await? {
        Some(category) => category,
        None => return Ok(None),
    };

    let items = sqlx::query_as::<_, MenuItem>(
        "SELECT * FROM menu_items WHERE category_id = $1 ORDER BY created_at DESC",
    )
    .bind(category.id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching items for category {}: {}",
            category.slug,
            err
        );
        Error::UnexpectedError
    })?;

    Ok(Some(CategoryWithItems {
        id: category.id,
        name: category.name,
        slug: category.slug,
        menu_items: items.iter().map(|item| item.view()).collect(),
    }))
}

pub fn is_owner(user: &User, category: &Category) -> bool {
    category.user_id == user.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn category(user_id: i32) -> Category {
        Category {
            id: 3,
            user_id,
            name: String::from("Soccer"),
            slug: String::from("soccer"),
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            updated_at: None,
        }
    }

    fn user(id: i32) -> User {
        User {
            id,
            name: String::from("Ada"),
            email: String::from("ada@example.com"),
            picture: None,
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn only_the_owning_user_passes_the_ownership_check() {
        assert!(is_owner(&user(1), &category(1)));
        assert!(!is_owner(&user(2), &category(1)));
    }

    #[test]
    fn view_projects_id_name_and_slug() {
        let value = serde_json::to_value(category(1).view()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(value["name"], "Soccer");
        assert_eq!(value["slug"], "soccer");
    }

    #[test]
    fn nested_projection_carries_menu_items_key() {
        let nested = CategoryWithItems {
            id: 3,
            name: String::from("Soccer"),
            slug: String::from("soccer"),
            menu_items: vec![],
        };
        let value = serde_json::to_value(nested).unwrap();
        assert!(value["menu_items"].as_array().unwrap().is_empty());
    }
}
