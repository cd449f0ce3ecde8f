// File: src/main.rs
// Purpose: Demo server wiring a freesia app from freesia.toml

use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Json;
use clap::Parser;
use freesia::{
    App, Config, DecodeError, FilterSpec, Group, MethodView, RequestContext, Value,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Parser)]
#[command(name = "freesia-server")]
#[command(version, about = "Freesia demo server", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "freesia.toml")]
    config: PathBuf,

    /// Override [server] host
    #[arg(long)]
    host: Option<String>,

    /// Override [server] port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    freesia::logging::init(&config.logging)?;
    info!(config = ?cli.config, "Starting freesia-server");

    let app = build_app(&config).context("Failed to register routes")?;
    let service = app.into_router().layer(TraceLayer::new_for_http());

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Serving on http://{}/", addr);

    axum::serve(listener, service).await.context("Server error")?;
    Ok(())
}

fn build_app(config: &Config) -> Result<App> {
    let mut app = App::with_config(&config.routing);

    app.set_filter(
        "slug",
        FilterSpec::new(
            "[a-z0-9]+(?:-[a-z0-9]+)*",
            |raw| Ok(Value::from(raw)),
            |value| value.to_string().to_lowercase(),
        ),
    );
    app.set_filter(
        "bool",
        FilterSpec::new(
            "true|false",
            |raw| {
                raw.parse::<bool>()
                    .map(Value::Bool)
                    .map_err(|_| DecodeError::invalid(raw, "bool"))
            },
            |value| value.to_string(),
        ),
    );

    app.get("/", index)?
        .get("/hello/<name>", hello)?
        .get("/age/<int:age>", age)?
        .get("/posts/<slug:slug>", post)?
        .get("/flags/<bool:on>", flag)?;

    app.add_view(
        "/person/<name>",
        MethodView::new("Person")
            .get(show_person)
            .put(update_person)
            .delete(delete_person),
    )?;

    let mut api = Group::new("api", "/api");
    api.get("/status", status)
        .get("/items/<int:id>", item)
        .get("/prices/<float:amount>", price);
    app.register_group(api)?;

    for route in app.rules() {
        info!(rule = %route.rule(), endpoint = %route.endpoint(), methods = ?route.methods(), "route");
    }

    Ok(app)
}

// ============================================================================
// Handlers
// ============================================================================

async fn index(_ctx: RequestContext) -> &'static str {
    "Welcome to freesia"
}

async fn hello(ctx: RequestContext, name: String) -> String {
    match ctx.query.get("greeting") {
        Some(greeting) => format!("{}, {}!", greeting, name),
        None => format!("Hello, {}!", name),
    }
}

async fn age(_ctx: RequestContext, age: i64) -> String {
    format!("You are {} years old", age)
}

async fn post(_ctx: RequestContext, slug: String) -> String {
    format!("Post: {}", slug)
}

async fn flag(_ctx: RequestContext, on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}

async fn show_person(_ctx: RequestContext, name: String) -> Json<serde_json::Value> {
    Json(json!({ "name": name }))
}

async fn update_person(ctx: RequestContext, name: String) -> Json<serde_json::Value> {
    let body: serde_json::Value = ctx.json().unwrap_or(serde_json::Value::Null);
    Json(json!({ "name": name, "updated": body }))
}

async fn delete_person(_ctx: RequestContext, name: String) -> String {
    format!("Deleted {}", name)
}

async fn status(_ctx: RequestContext) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn item(_ctx: RequestContext, id: i64) -> Json<serde_json::Value> {
    Json(json!({ "id": id }))
}

async fn price(_ctx: RequestContext, amount: f64) -> Json<serde_json::Value> {
    Json(json!({ "amount": amount }))
}
