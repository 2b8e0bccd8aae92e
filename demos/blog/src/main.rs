//! Blog Demo
//!
//! Builds a small blog routing table and dispatches requests given on the command
//! line, or a built-in list when none are given.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package blog-demo
//! cargo run --package blog-demo -- "GET /blog/7" "POST /blog {\"title\":\"Hi\"}"
//! ROUTERIFIC_ROUTING__LOG_REJECTIONS=false cargo run --package blog-demo
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use routerific::prelude::*;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Views
// ============================================================================

#[route("GET", "/")]
fn index() -> String {
    "welcome to the blog".to_string()
}

/// A post by numeric id. `/p/<id>` is the short link.
#[route("GET", "/blog/<int:id>")]
#[route("GET", "/p/<int:id>")]
fn detail(#[constraint(Expr::gt(0))] id: i64) -> String {
    format!("post #{id}")
}

#[route("GET", "/blog/<slug:slug>")]
fn by_slug(slug: String) -> String {
    format!("post '{slug}'")
}

#[route("GET", "/drafts/<uuid:id>")]
fn draft(id: Uuid, session: Session) -> String {
    format!("draft {id} for {}", session.user)
}

#[route("GET", "/blog")]
fn list(
    #[constraint(Expr::ge(1))] page: Option<i64>,
    #[constraint(Expr::one_of(["asc", "desc"]))] order: Option<String>,
) -> String {
    format!(
        "page {} ({})",
        page.unwrap_or(1),
        order.as_deref().unwrap_or("desc")
    )
}

#[derive(Debug, Deserialize, Schema)]
#[schema(validate = NewPost::check)]
struct NewPost {
    title: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl NewPost {
    fn check(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        Ok(())
    }
}

#[route("POST", "/blog")]
fn create(post: NewPost, session: Session, #[rename("X-Request-Id")] request_id: Header<String>) -> String {
    format!(
        "{} created '{}' [{}] ({})",
        session.user,
        post.title,
        post.tags.join(", "),
        request_id.into_inner()
    )
}

// ============================================================================
// Session resolver
// ============================================================================

/// The caller, read from a `session=<user>` cookie.
struct Session {
    user: String,
}

impl Parameter for Session {
    fn declared() -> DeclaredType {
        DeclaredType::extension::<Self>()
    }
}

fn blog_router(runtime: &Runtime) -> Result<Router<String>> {
    let mut builder = runtime.router_builder();
    builder.resolver_for::<Session, _>(|_, request, _| {
        Ok(request
            .header("Cookie")
            .into_iter()
            .flat_map(|cookie| cookie.split(';'))
            .find_map(|pair| pair.trim().strip_prefix("session="))
            .map(|user| Session {
                user: user.to_owned(),
            }))
    });
    builder.include([
        index.into_view(),
        detail.into_view(),
        by_slug.into_view(),
        draft.into_view(),
        list.into_view(),
        create.into_view(),
    ])?;
    Ok(builder.build())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[derive(Debug, Parser)]
#[command(about = "Dispatch requests against the blog routing table")]
struct Args {
    /// Configuration file, instead of searching for routerific.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(long)]
    profile: Option<String>,

    /// Requests as "METHOD /path[?query] [body]".
    requests: Vec<String>,
}

const DEFAULT_REQUESTS: &[&str] = &[
    "GET /",
    "GET /blog/7",
    "GET /p/7",
    "GET /blog/0",
    "GET /blog/hello-world",
    "GET /blog?page=2&order=asc",
    "GET /blog?order=random",
    "GET /drafts/67e55044-10b1-426f-9247-bb680e5fe0c8",
    r#"POST /blog {"title": "Routing", "tags": ["rust"]}"#,
    r#"POST /blog {"title": ""}"#,
    "DELETE /blog/7",
];

fn parse_request(line: &str) -> Result<http::Request<Vec<u8>>> {
    let mut parts = line.splitn(3, ' ');
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        bail!("expected \"METHOD /path\", got {line:?}");
    };
    let body = parts.next().unwrap_or_default().as_bytes().to_vec();

    http::Request::builder()
        .method(method)
        .uri(target)
        .header("Cookie", "theme=dark; session=alice")
        .header("X-Request-Id", "req-1")
        .body(body)
        .with_context(|| format!("invalid request {line:?}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut runtime = Runtime::builder().search_path(env!("CARGO_MANIFEST_DIR"));
    if let Some(path) = &args.config {
        runtime = runtime.config_file(path);
    }
    if let Some(profile) = &args.profile {
        runtime = runtime.profile(profile);
    }
    let runtime = runtime.build()?;

    let router = blog_router(&runtime)?;
    for route in router.routes() {
        info!("{:<7} {:<24} -> {}", route.method, route.template, route.view);
    }

    let requests: Vec<String> = if args.requests.is_empty() {
        DEFAULT_REQUESTS.iter().map(ToString::to_string).collect()
    } else {
        args.requests
    };

    for line in &requests {
        let request = parse_request(line)?;
        let response = router.dispatch(&request)?;
        info!("{line} => {response}");
    }

    Ok(())
}
