use crate::{
    modules,
    types::{Config, Context, ToContext},
};
use axum::{
    http::{header, Method},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors, trace};

pub struct App {
    ctx: Arc<Context>,
    router: Router,
}

impl App {
    pub async fn new() -> Self {
        let ctx: Arc<Context> = Arc::new(Config::default().to_context().await);

        let router = modules::get_router()
            .with_state(ctx.clone())
            .layer(Extension(ctx.clone()))
            .layer(trace::TraceLayer::new_for_http())
            .layer(
                cors::CorsLayer::new()
                    .allow_methods([
                        Method::OPTIONS,
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                    ])
                    .allow_headers([header::CONTENT_TYPE])
                    .allow_origin(cors::Any),
            );

        Self { ctx, router }
    }

    pub async fn serve(self) {
        let listener = TcpListener::bind(format!("{}:{}", self.ctx.app.host, self.ctx.app.port))
            .await
            .unwrap();

        tracing::debug!(
            "App is running on {}:{}",
            self.ctx.app.host,
            self.ctx.app.port
        );

        axum::serve(listener, self.router).await.unwrap();
    }
}
