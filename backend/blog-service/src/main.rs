use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use blog_service::cache::{IndexPageCache, InMemoryPageCache, PageCache, RedisPageCache};
use blog_service::config::{CacheBackend, Config, StorageBackend};
use blog_service::db::{self, BlogRepository, InMemoryBlogRepository, PgBlogRepository};
use blog_service::handlers;
use blog_service::middleware::{JwtKeys, MetricsMiddleware, SessionAuth};
use blog_service::models::NewGroup;
use blog_service::render::JsonRenderer;
use blog_service::AppState;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    repo: Arc<dyn BlogRepository>,
    cache: Arc<dyn PageCache>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

async fn health_summary() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "blog-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let repo_result = state.repo.health_check().await;
    let repo_latency = Some(start.elapsed().as_millis() as u64);
    let ready = repo_result.is_ok();
    let storage_check = match repo_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Storage reachable".to_string(),
            latency_ms: repo_latency,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("Storage check failed: {}", e),
            latency_ms: repo_latency,
        },
    };
    checks.insert("storage".to_string(), storage_check);

    // Pages are rendered fresh without the cache, so a failing cache only degrades
    let start = Instant::now();
    let cache_result = state.cache.health_check().await;
    let cache_latency = Some(start.elapsed().as_millis() as u64);
    let cache_check = match cache_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Page cache reachable".to_string(),
            latency_ms: cache_latency,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Degraded,
            message: format!("Page cache check failed: {}", e),
            latency_ms: cache_latency,
        },
    };
    checks.insert("page_cache".to_string(), cache_check);

    let status = if ready {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// What the binary was asked to do.
enum Command {
    Serve,
    Healthcheck,
    CreateGroup {
        slug: String,
        title: String,
        description: String,
    },
    CreateUser {
        username: String,
    },
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    match args.first().map(String::as_str) {
        None | Some("serve") => Ok(Command::Serve),
        Some("healthcheck") | Some("healthcheck-http") => Ok(Command::Healthcheck),
        Some("create-group") => match &args[1..] {
            [slug, title, rest @ ..] => Ok(Command::CreateGroup {
                slug: slug.clone(),
                title: title.clone(),
                description: rest.join(" "),
            }),
            _ => Err("usage: blog-service create-group <slug> <title> [description]".to_string()),
        },
        Some("create-user") => match &args[1..] {
            [username] => Ok(Command::CreateUser {
                username: username.clone(),
            }),
            _ => Err("usage: blog-service create-user <username>".to_string()),
        },
        Some(other) => Err(format!("unknown command '{}'", other)),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn BlogRepository>> {
    match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(InMemoryBlogRepository::new()))
        }
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Connected to PostgreSQL, migrations applied");
            Ok(Arc::new(PgBlogRepository::new(pool)))
        }
    }
}

async fn build_page_cache(config: &Config) -> Arc<dyn PageCache> {
    match config.cache.backend {
        CacheBackend::Memory => Arc::new(InMemoryPageCache::new()),
        CacheBackend::Redis => match RedisPageCache::connect(&config.cache.url).await {
            Ok(cache) => {
                tracing::info!("Page cache connected to Redis");
                Arc::new(cache)
            }
            Err(e) => {
                tracing::warn!(
                    "Redis unavailable ({}); falling back to in-process page cache",
                    e
                );
                Arc::new(InMemoryPageCache::new())
            }
        },
    }
}

async fn run_healthcheck(config: &Config) -> io::Result<()> {
    let host = if config.app.host == "0.0.0.0" {
        "127.0.0.1"
    } else {
        config.app.host.as_str()
    };
    let url = format!("http://{}:{}/health", host, config.app.port);

    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

fn startup_error(e: anyhow::Error) -> io::Error {
    tracing::error!("Startup failed: {:#}", e);
    io::Error::new(io::ErrorKind::Other, format!("{:#}", e))
}

/// Blog Service
///
/// Serves the Yatube blog over HTTP.
///
/// # Routes
///
/// - `/`, `/group/{slug}/`, `/profile/{username}/`, `/follow/` - feeds
/// - `/posts/{id}/`, `/posts/{id}/edit/`, `/create/` - posts
/// - `/posts/{id}/comment/` - comments
/// - `/profile/{username}/follow/`, `/profile/{username}/unfollow/` - follow edges
/// - `/health`, `/health/ready`, `/metrics` - operations
///
/// # Commands
///
/// - `blog-service [serve]`
/// - `blog-service healthcheck`
/// - `blog-service create-group <slug> <title> [description]`
/// - `blog-service create-user <username>`
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(2);
        }
    };

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Command::Healthcheck = command {
        return run_healthcheck(&config).await;
    }

    init_tracing();

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let repo = build_repository(&config).await.map_err(startup_error)?;
    let jwt_keys = Arc::new(JwtKeys::from_secret(&config.auth.jwt_secret));

    match command {
        Command::CreateGroup {
            slug,
            title,
            description,
        } => {
            let group = repo
                .create_group(NewGroup {
                    title,
                    slug,
                    description,
                })
                .await
                .map_err(|e| startup_error(e.into()))?;
            println!("Created group {} ({}) with id {}", group.title, group.slug, group.id);
            return Ok(());
        }
        Command::CreateUser { username } => {
            let user = repo
                .create_user(&username)
                .await
                .map_err(|e| startup_error(e.into()))?;
            let token = jwt_keys
                .issue_token(user.id, &user.username)
                .map_err(startup_error)?;
            println!("Created user {} with id {}", user.username, user.id);
            println!("Session token: {}", token);
            return Ok(());
        }
        Command::Serve | Command::Healthcheck => {}
    }

    let page_cache = build_page_cache(&config).await;
    let pages = Arc::new(IndexPageCache::new(
        page_cache.clone(),
        Duration::from_secs(config.cache.index_ttl_secs),
    ));
    if let Err(e) = pages.clear().await {
        tracing::warn!("Failed to clear page cache at startup: {}", e);
    }

    let app_state = web::Data::new(AppState::new(
        repo.clone(),
        pages,
        Arc::new(JsonRenderer),
        config.auth.login_url.clone(),
    ));
    let health_state = web::Data::new(HealthState {
        repo,
        cache: page_cache,
    });

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let session_cookie = config.auth.session_cookie.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(health_state.clone())
            .wrap(SessionAuth::new(jwt_keys.clone(), &session_cookie))
            .wrap(MetricsMiddleware)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(blog_service::metrics::serve_metrics),
            )
            .route("/health", web::get().to(health_summary))
            .route("/health/ready", web::get().to(readiness_summary))
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&http_bind_address)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = tokio::select! {
        joined = server_task => match joined {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        },
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            Ok(())
        }
    };

    tracing::info!("Blog-service shutting down");
    result
}
