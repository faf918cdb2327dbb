pub use crate::utils::database;
use crate::modules::auth::session::SessionStore;
use async_trait::async_trait;
use std::env;

#[derive(Clone)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct GoogleContext {
    pub client_id: String,
    pub client_secret: String,
    pub oauth_api_endpoint: String,
    pub api_endpoint: String,
    pub accounts_api_endpoint: String,
}

#[derive(Clone)]
pub struct FacebookContext {
    pub app_id: String,
    pub app_secret: String,
    pub graph_api_version: String,
    pub graph_api_endpoint: String,
}

#[derive(Clone)]
pub struct Context {
    pub app: AppContext,
    pub db_conn: database::DatabaseConnection,
    pub sessions: SessionStore,
    pub google: GoogleContext,
    pub facebook: FacebookContext,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub oauth_api_endpoint: String,
    pub api_endpoint: String,
    pub accounts_api_endpoint: String,
}

#[derive(Clone)]
pub struct FacebookConfig {
    pub app_id: String,
    pub app_secret: String,
    pub graph_api_version: String,
    pub graph_api_endpoint: String,
}

#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub google: GoogleConfig,
    pub facebook: FacebookConfig,
}

impl Default for Config {
    fn default() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let environment = env::var("APP_ENV").expect("APP_ENV not set");
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u32>()
            .expect("Invalid PORT number");
        let url = env::var("URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let google_client_id = env::var("GOOGLE_CLIENT_ID").expect("GOOGLE_CLIENT_ID not set");
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").expect("GOOGLE_CLIENT_SECRET not set");
        let google_oauth_api_endpoint = env::var("GOOGLE_OAUTH_API_ENDPOINT")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com".to_string());
        let google_api_endpoint = env::var("GOOGLE_API_ENDPOINT")
            .unwrap_or_else(|_| "https://www.googleapis.com".to_string());
        let google_accounts_api_endpoint = env::var("GOOGLE_ACCOUNTS_API_ENDPOINT")
            .unwrap_or_else(|_| "https://accounts.google.com".to_string());
        let facebook_app_id = env::var("FB_APP_ID").expect("FB_APP_ID not set");
        let facebook_app_secret = env::var("FB_APP_SECRET").expect("FB_APP_SECRET not set");
        let facebook_graph_api_version =
            env::var("FB_VERSION").unwrap_or_else(|_| "v2.10".to_string());
        let facebook_graph_api_endpoint = env::var("FB_GRAPH_API_ENDPOINT")
            .unwrap_or_else(|_| "https://graph.facebook.com".to_string());

        return Self {
            database: DatabaseConfig { url: database_url },
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
            },
            google: GoogleConfig {
                client_id: google_client_id,
                client_secret: google_client_secret,
                oauth_api_endpoint: google_oauth_api_endpoint,
                api_endpoint: google_api_endpoint,
                accounts_api_endpoint: google_accounts_api_endpoint,
            },
            facebook: FacebookConfig {
                app_id: facebook_app_id,
                app_secret: facebook_app_secret,
                graph_api_version: facebook_graph_api_version,
                graph_api_endpoint: facebook_graph_api_endpoint,
            },
        };
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Context;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Context {
        let db_conn = database::connect(self.database.url.as_str()).await;
        database::migrate(&db_conn).await;

        Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
            },
            db_conn,
            sessions: SessionStore::new(chrono::Duration::hours(24)),
            google: GoogleContext {
                client_id: self.google.client_id,
                client_secret: self.google.client_secret,
                oauth_api_endpoint: self.google.oauth_api_endpoint,
                api_endpoint: self.google.api_endpoint,
                accounts_api_endpoint: self.google.accounts_api_endpoint,
            },
            facebook: FacebookContext {
                app_id: self.facebook.app_id,
                app_secret: self.facebook.app_secret,
                graph_api_version: self.facebook.graph_api_version,
                graph_api_endpoint: self.facebook.graph_api_endpoint,
            },
        }
    }
}
