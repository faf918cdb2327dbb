use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::{
    modules::{
        auth::{middleware::Auth, session},
        category::{
            self,
            repository::{Category, CategoryView, CategoryWithItems},
        },
        menu_item::{self, repository::MenuItemWithCategory},
    },
    types::Context,
    utils::html,
};

#[derive(Deserialize, Validate)]
struct MenuItemFormPayload {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validation::validate_not_blank"))]
    name: String,
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validation::validate_not_blank"))]
    slug: String,
    description: Option<String>,
    #[serde(default, rename = "_method")]
    method: Option<String>,
}

fn render_home(
    categories: &[CategoryView],
    recent: &[MenuItemWithCategory],
    flash: Vec<String>,
    authenticated: bool,
) -> String {
    let mut body = String::from("<h1>Item Catalogue</h1>");

    if authenticated {
        body.push_str(
            "<form action=\"/logout\" method=\"post\"><button type=\"submit\">Logout</button></form>",
        );
    } else {
        body.push_str("<p><a href=\"/login\">Login</a></p>");
    }

    body.push_str("<h2>Categories</h2><ul>");
    for category in categories {
        body.push_str(&format!(
            "<li><a href=\"/catalogue/{slug}/items\">{name}</a></li>",
            slug = html::escape(&category.slug),
            name = html::escape(&category.name),
        ));
    }
    body.push_str("</ul>");

    body.push_str("<h2>Latest Items</h2><ul>");
    for item in recent {
        body.push_str(&format!(
            "<li><a href=\"/catalogue/{category_slug}/{slug}\">{name}</a> ({category_name})</li>",
            category_slug = html::escape(&item.category_slug),
            slug = html::escape(&item.slug),
            name = html::escape(&item.name),
            category_name = html::escape(&item.category_name),
        ));
    }
    body.push_str("</ul>");

    html::layout("Item Catalogue", &flash, &body)
}

fn render_category(category: &CategoryWithItems, flash: Vec<String>) -> String {
    let mut body = format!(
        "<h1>{name}</h1><p>{count} items</p><p><a href=\"/catalogue/{slug}\">Add Menu Item</a></p><ul>",
        name = html::escape(&category.name),
        count = category.menu_items.len(),
        slug = html::escape(&category.slug),
    );
    for item in &category.menu_items {
        body.push_str(&format!(
            "<li><a href=\"/catalogue/{category_slug}/{slug}\">{name}</a></li>",
            category_slug = html::escape(&category.slug),
            slug = html::escape(&item.slug),
            name = html::escape(&item.name),
        ));
    }
    body.push_str("</ul><p><a href=\"/\">Home</a></p>");

    html::layout(&category.name, &flash, &body)
}

fn render_menu_item(item: &MenuItemWithCategory, flash: Vec<String>) -> String {
    let description = item
        .description
        .as_deref()
        .map(html::escape)
        .unwrap_or_default();

    let body = format!(
        "<h1>{name}</h1><p>{description}</p>\
<p><a href=\"/catalogue/{category_slug}/{slug}/edit\">Edit</a> \
<a href=\"/catalogue/{category_slug}/{slug}/delete\">Delete</a></p>\
<p><a href=\"/catalogue/{category_slug}/items\">Back to {category_name}</a></p>",
        name = html::escape(&item.name),
        description = description,
        category_slug = html::escape(&item.category_slug),
        slug = html::escape(&item.slug),
        category_name = html::escape(&item.category_name),
    );

    html::layout(&item.name, &flash, &body)
}

fn render_add_form(category: &Category) -> String {
    let body = format!(
        "<h1>Add Menu Item to {name}</h1>\
<form action=\"/catalogue/{slug}\" method=\"post\">\
<label>Name <input type=\"text\" name=\"name\"></label>\
<label>Slug <input type=\"text\" name=\"slug\"></label>\
<label>Description <textarea name=\"description\"></textarea></label>\
<button type=\"submit\">Add</button>\
</form>",
        name = html::escape(&category.name),
        slug = html::escape(&category.slug),
    );

    html::layout("Add Menu Item", &[], &body)
}

fn render_edit_form(item: &MenuItemWithCategory) -> String {
    let description = item
        .description
        .as_deref()
        .map(html::escape)
        .unwrap_or_default();

    let body = format!(
        "<h1>Edit {name}</h1>\
<form action=\"/catalogue/{category_slug}/{slug}/edit\" method=\"post\">\
<input type=\"hidden\" name=\"_method\" value=\"PUT\">\
<label>Name <input type=\"text\" name=\"name\" value=\"{name}\"></label>\
<label>Slug <input type=\"text\" name=\"slug\" value=\"{slug}\"></label>\
<label>Description <textarea name=\"description\">{description}</textarea></label>\
<button type=\"submit\">Save</button>\
</form>",
        name = html::escape(&item.name),
        category_slug = html::escape(&item.category_slug),
        slug = html::escape(&item.slug),
        description = description,
    );

    html::layout("Edit Menu Item", &[], &body)
}

fn render_delete_form(item: &MenuItemWithCategory) -> String {
    let body = format!(
        "<h1>Delete {name}?</h1>\
<form action=\"/catalogue/{category_slug}/{slug}/delete\" method=\"post\">\
<input type=\"hidden\" name=\"_method\" value=\"DELETE\">\
<button type=\"submit\">Delete</button>\
</form>\
<p><a href=\"/catalogue/{category_slug}/{slug}\">Cancel</a></p>",
        name = html::escape(&item.name),
        category_slug = html::escape(&item.category_slug),
        slug = html::escape(&item.slug),
    );

    html::layout("Delete Menu Item", &[], &body)
}

/// Landing page: the ten most recently added items, plus the session's
/// category snapshot (built on first visit).
pub async fn home(State(ctx): State<Arc<Context>>, jar: CookieJar) -> Response {
    let (token, mut session) = session::load_or_create(&ctx.sessions, &jar).await;

    if session.categories.is_none() {
        match category::repository::find_all_ordered_by_name(&ctx.db_conn.pool).await {
            Ok(categories) => {
                session.categories =
                    Some(categories.iter().map(|category| category.view()).collect())
            }
            Err(_) => {
                return html::error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load categories",
                )
            }
        }
    }

    let recent = match menu_item::repository::find_recent(&ctx.db_conn.pool, 10).await {
        Ok(recent) => recent,
        Err(_) => {
            return html::error_page(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load items")
        }
    };

    let categories = session.categories.clone().unwrap_or_default();
    let authenticated = session.is_authenticated();
    let flash = session.take_flash();

    ctx.sessions.put(&token, session).await;
    let jar = jar.add(session::session_cookie(&ctx.app, token));

    (jar, Html(render_home(&categories, &recent, flash, authenticated))).into_response()
}

/// Pulls any pending flash notices without creating a session for anonymous
/// browsers that never had one.
async fn take_pending_flash(ctx: &Context, jar: &CookieJar) -> Vec<String> {
    match session::load(&ctx.sessions, jar).await {
        Some((token, mut session)) => {
            let flash = session.take_flash();
            ctx.sessions.put(&token, session).await;
            flash
        }
        None => vec![],
    }
}

async fn show_menu_items_in_category(
    State(ctx): State<Arc<Context>>,
    Path(category_slug): Path<String>,
    jar: CookieJar,
) -> Response {
    match category::repository::find_by_slug_with_items(&ctx.db_conn.pool, category_slug).await {
        Ok(Some(category)) => {
            let flash = take_pending_flash(&ctx, &jar).await;
            Html(render_category(&category, flash)).into_response()
        }
        Ok(None) => html::error_page(StatusCode::NOT_FOUND, "Not Found"),
        Err(_) => html::error_page(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch category"),
    }
}

async fn show_menu_item(
    State(ctx): State<Arc<Context>>,
    Path((category_slug, menu_slug)): Path<(String, String)>,
    jar: CookieJar,
) -> Response {
    match menu_item::repository::find_by_slug_in_category(
        &ctx.db_conn.pool,
        category_slug,
        menu_slug,
    )
    .await
    {
        Ok(Some(item)) => {
            let flash = take_pending_flash(&ctx, &jar).await;
            Html(render_menu_item(&item, flash)).into_response()
        }
        Ok(None) => html::error_page(StatusCode::NOT_FOUND, "Not Found"),
        Err(_) => html::error_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch menu item",
        ),
    }
}

/// Lookup-then-ownership gate shared by the add handlers. Runs after the
/// auth redirect, before any verb or validation handling.
async fn load_owned_category(
    ctx: &Context,
    auth: &Auth,
    category_slug: String,
) -> Result<Category, Response> {
    let category = match category::repository::find_by_slug(&ctx.db_conn.pool, category_slug).await
    {
        Ok(Some(category)) => category,
        Ok(None) => return Err(html::error_page(StatusCode::NOT_FOUND, "Not Found")),
        Err(_) => {
            return Err(html::error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch category",
            ))
        }
    };

    if !category::repository::is_owner(&auth.user, &category) {
        return Err(html::error_page(StatusCode::FORBIDDEN, "Forbidden"));
    }

    Ok(category)
}

/// Same gate for the item routes, via the item's parent category.
async fn load_owned_item(
    ctx: &Context,
    auth: &Auth,
    category_slug: String,
    menu_slug: String,
) -> Result<MenuItemWithCategory, Response> {
    let item = match menu_item::repository::find_by_slug_in_category(
        &ctx.db_conn.pool,
        category_slug,
        menu_slug,
    )
    .await
    {
        Ok(Some(item)) => item,
        Ok(None) => return Err(html::error_page(StatusCode::NOT_FOUND, "Not Found")),
        Err(_) => {
            return Err(html::error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch menu item",
            ))
        }
    };

    if item.category_user_id != auth.user.id {
        return Err(html::error_page(StatusCode::FORBIDDEN, "Forbidden"));
    }

    Ok(item)
}

async fn add_menu_item_form(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(category_slug): Path<String>,
) -> Response {
    match load_owned_category(&ctx, &auth, category_slug).await {
        Ok(category) => Html(render_add_form(&category)).into_response(),
        Err(response) => response,
    }
}

async fn create_menu_item(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(category_slug): Path<String>,
    Form(payload): Form<MenuItemFormPayload>,
) -> Response {
    let category = match load_owned_category(&ctx, &auth, category_slug).await {
        Ok(category) => category,
        Err(response) => return response,
    };

    if payload.validate().is_err() {
        return html::error_page(StatusCode::BAD_REQUEST, "Name and slug are required");
    }

    let item = match menu_item::repository::create(
        &ctx.db_conn.pool,
        menu_item::repository::CreateMenuItemPayload {
            name: payload.name.trim().to_string(),
            slug: payload.slug.trim().to_string(),
            description: payload.description.map(|value| value.trim().to_string()),
            category_id: category.id,
        },
    )
    .await
    {
        Ok(item) => item,
        Err(_) => {
            return html::error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Menu item creation failed",
            )
        }
    };

    let mut session = auth.session;
    session.push_flash(format!("Menu Item: {} was added", item.name));
    ctx.sessions.put(&auth.token, session).await;

    Redirect::to(&format!("/catalogue/{}/items", category.slug)).into_response()
}

async fn edit_menu_item_form(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path((category_slug, menu_slug)): Path<(String, String)>,
) -> Response {
    match load_owned_item(&ctx, &auth, category_slug, menu_slug).await {
        Ok(item) => Html(render_edit_form(&item)).into_response(),
        Err(response) => response,
    }
}

async fn apply_menu_item_update(
    ctx: Arc<Context>,
    auth: Auth,
    category_slug: String,
    menu_slug: String,
    payload: MenuItemFormPayload,
) -> Response {
    let item = match load_owned_item(&ctx, &auth, category_slug.clone(), menu_slug.clone()).await {
        Ok(item) => item,
        Err(response) => return response,
    };

    if payload.validate().is_err() {
        return html::error_page(StatusCode::BAD_REQUEST, "Name and slug are required");
    }

    if menu_item::repository::update_by_id(
        &ctx.db_conn.pool,
        item.id,
        menu_item::repository::UpdateMenuItemPayload {
            name: payload.name.trim().to_string(),
            slug: payload.slug.trim().to_string(),
            description: payload.description.map(|value| value.trim().to_string()),
        },
    )
    .await
    .is_err()
    {
        return html::error_page(StatusCode::INTERNAL_SERVER_ERROR, "Menu item update failed");
    }

    let mut session = auth.session;
    session.push_flash(format!("Menu Item: {} was edited", payload.name.trim()));
    ctx.sessions.put(&auth.token, session).await;

    Redirect::to(&format!("/catalogue/{}/{}", category_slug, menu_slug)).into_response()
}

async fn update_menu_item(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path((category_slug, menu_slug)): Path<(String, String)>,
    Form(payload): Form<MenuItemFormPayload>,
) -> Response {
    apply_menu_item_update(ctx, auth, category_slug, menu_slug, payload).await
}

/// POST that simulates PUT through the `_method` form field. The verb check
/// runs after the lookup and ownership gates, matching the route's GET/PUT
/// behavior.
async fn update_menu_item_post(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path((category_slug, menu_slug)): Path<(String, String)>,
    Form(payload): Form<MenuItemFormPayload>,
) -> Response {
    if let Err(response) =
        load_owned_item(&ctx, &auth, category_slug.clone(), menu_slug.clone()).await
    {
        return response;
    }

    if payload.method.as_deref() != Some("PUT") {
        return html::error_page(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    apply_menu_item_update(ctx, auth, category_slug, menu_slug, payload).await
}

async fn delete_menu_item_form(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path((category_slug, menu_slug)): Path<(String, String)>,
) -> Response {
    match load_owned_item(&ctx, &auth, category_slug, menu_slug).await {
        Ok(item) => Html(render_delete_form(&item)).into_response(),
        Err(response) => response,
    }
}

async fn apply_menu_item_delete(
    ctx: Arc<Context>,
    auth: Auth,
    category_slug: String,
    menu_slug: String,
) -> Response {
    let item = match load_owned_item(&ctx, &auth, category_slug.clone(), menu_slug).await {
        Ok(item) => item,
        Err(response) => return response,
    };

    if menu_item::repository::delete_by_id(&ctx.db_conn.pool, item.id)
        .await
        .is_err()
    {
        return html::error_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Menu item deletion failed",
        );
    }

    let mut session = auth.session;
    session.push_flash(format!("Menu Item: {} was deleted", item.name));
    ctx.sessions.put(&auth.token, session).await;

    Redirect::to(&format!("/catalogue/{}/items", category_slug)).into_response()
}

async fn delete_menu_item(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path((category_slug, menu_slug)): Path<(String, String)>,
) -> Response {
    apply_menu_item_delete(ctx, auth, category_slug, menu_slug).await
}

#[derive(Deserialize)]
struct MethodOverridePayload {
    #[serde(default, rename = "_method")]
    method: Option<String>,
}

async fn delete_menu_item_post(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path((category_slug, menu_slug)): Path<(String, String)>,
    Form(payload): Form<MethodOverridePayload>,
) -> Response {
    if let Err(response) =
        load_owned_item(&ctx, &auth, category_slug.clone(), menu_slug.clone()).await
    {
        return response;
    }

    if payload.method.as_deref() != Some("DELETE") {
        return html::error_page(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    apply_menu_item_delete(ctx, auth, category_slug, menu_slug).await
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route(
            "/:category_slug",
            get(add_menu_item_form).post(create_menu_item),
        )
        .route("/:category_slug/items", get(show_menu_items_in_category))
        .route("/:category_slug/:menu_slug", get(show_menu_item))
        .route(
            "/:category_slug/:menu_slug/edit",
            get(edit_menu_item_form)
                .put(update_menu_item)
                .post(update_menu_item_post),
        )
        .route(
            "/:category_slug/:menu_slug/delete",
            get(delete_menu_item_form)
                .delete(delete_menu_item)
                .post(delete_menu_item_post),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, slug: &str) -> MenuItemFormPayload {
        MenuItemFormPayload {
            name: String::from(name),
            slug: String::from(slug),
            description: None,
            method: None,
        }
    }

    #[test]
    fn form_requires_both_name_and_slug() {
        assert!(payload("Cleats", "soccer_cleats").validate().is_ok());
        assert!(payload("", "soccer_cleats").validate().is_err());
        assert!(payload("Cleats", "").validate().is_err());
        assert!(payload(" \t\n\r", "soccer_cleats").validate().is_err());
    }

    #[test]
    fn surrounding_whitespace_does_not_satisfy_validation_but_survives_trimming() {
        let form = payload("  Cleats  ", "  soccer_cleats  ");
        assert!(form.validate().is_ok());
        assert_eq!(form.name.trim(), "Cleats");
        assert_eq!(form.slug.trim(), "soccer_cleats");
    }
}
