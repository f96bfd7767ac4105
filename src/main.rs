mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::articles::{routes as articles_routes, ArticleService};
use crate::features::categories::{routes as categories_routes, CategoryService};
use crate::features::images::{
    routes as images_routes, CleanupWorker, ImageCleanupService, ImageReconciler, ImageService,
    PgImageRecordStore, UrlExtractor,
};
use crate::features::images::store::ImageRecordStore;
use crate::features::tags::{routes as tags_routes, TagService};
use crate::modules::storage::{CdnClient, CdnGateway};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations at startup; after this the schema is assumed to exist
    // and any later storage failure surfaces as an error, never a re-setup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize CDN client for image storage
    let cdn_base_url = config.cdn.public_base_url();
    let upload_folder = config.cdn.upload_folder.clone();
    let cdn_client: Arc<dyn CdnGateway> = Arc::new(
        CdnClient::new(config.cdn.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize CDN client: {}", e))?,
    );
    tracing::info!("CDN client initialized (public base: {})", cdn_base_url);

    // Initialize image lifecycle services
    let image_store: Arc<dyn ImageRecordStore> = Arc::new(PgImageRecordStore::new(pool.clone()));
    let extractor = UrlExtractor::new(&[cdn_base_url])
        .map_err(|e| anyhow::anyhow!("Failed to build URL extractor: {}", e))?;
    let reconciler = Arc::new(ImageReconciler::new(
        Arc::clone(&image_store),
        extractor,
        config.cleanup.grace_period(),
    ));
    let image_service = Arc::new(ImageService::new(
        Arc::clone(&image_store),
        Arc::clone(&cdn_client),
        upload_folder,
        config.cleanup.grace_period(),
    ));
    let cleanup_service = Arc::new(ImageCleanupService::new(
        Arc::clone(&image_store),
        Arc::clone(&cdn_client),
        config.cleanup.delete_concurrency,
        config.cleanup.cdn_timeout(),
        config.cleanup.sweep_batch_size,
    ));
    tracing::info!(
        "Image lifecycle services initialized (grace period: {} days)",
        config.cleanup.grace_period_days
    );

    // Spawn the background cleanup worker unless disabled
    if config.cleanup.sweep_interval_secs > 0 {
        let worker = CleanupWorker::new(
            Arc::clone(&cleanup_service),
            config.cleanup.sweep_interval_secs,
        );
        tokio::spawn(async move {
            worker.run().await;
        });
        tracing::info!("Image cleanup worker spawned");
    } else {
        tracing::info!("Image cleanup worker disabled (manual sweeps only)");
    }

    // Initialize Article Service
    let article_service = Arc::new(ArticleService::new(pool.clone(), Arc::clone(&reconciler)));
    tracing::info!("Article service initialized");

    // Initialize Category Service
    let category_service = Arc::new(CategoryService::new(pool.clone()));
    tracing::info!("Category service initialized");

    // Initialize Tag Service
    let tag_service = Arc::new(TagService::new(pool.clone()));
    tracing::info!("Tag service initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(
                Arc::new(credentials),
                "Swagger UI",
            )))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Admin routes (require the shared admin credential)
    let admin_routes = Router::new()
        .merge(articles_routes::admin_routes(Arc::clone(&article_service)))
        .merge(categories_routes::admin_routes(Arc::clone(
            &category_service,
        )))
        .merge(tags_routes::admin_routes(Arc::clone(&tag_service)))
        .merge(images_routes::admin_routes(
            image_service,
            cleanup_service,
            Arc::clone(&article_service),
        ))
        .route_layer(from_fn(middleware::basic_auth_middleware(
            Arc::new(config.admin.credentials()),
            "Admin",
        )));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(articles_routes::public_routes(article_service))
        .merge(categories_routes::public_routes(category_service))
        .merge(tags_routes::public_routes(tag_service));

    let app = Router::new()
        .merge(swagger)
        .merge(admin_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
