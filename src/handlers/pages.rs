use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use crate::AppState;
use crate::models::{item::Item, site_config::SiteConfig};
use crate::utils::html::escape_html;

/// Public landing page: site header plus a card per item
pub async fn index(State(app_state): State<AppState>) -> Html<String> {
    let config = app_state.site_config.get().await;
    let items = app_state.items.list().await;

    Html(render_index(&config, &items))
}

/// Item detail page, looked up by slug
pub async fn item_page(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    match app_state.items.get_by_slug(&slug).await {
        Ok(item) => Html(render_item(&item)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Html("Not found")).into_response(),
    }
}

pub fn render_index(config: &SiteConfig, items: &[Item]) -> String {
    let cards: String = items
        .iter()
        .map(|item| {
            format!(
                r#"
        <article class="card">
          <a class="item" href="/item/{slug}">
            <h3>{title}</h3>
            <p class="summary">{summary}</p>
          </a>
        </article>"#,
                slug = escape_html(&item.slug),
                title = escape_html(&item.title),
                summary = escape_html(&item.summary),
            )
        })
        .collect();

    let banner = config
        .banner_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| format!(r#"<img src="{}" alt="banner" />"#, escape_html(url)))
        .unwrap_or_default();

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>{page_title}</title>
  <style>
    :root{{--muted:#9ca3af;color-scheme:dark}}
    body{{margin:0;font-family:system-ui,Segoe UI,Roboto,Arial;background:linear-gradient(180deg,#020617,#071133);color:#e6eef8}}
    .wrap{{max-width:1000px;margin:32px auto;padding:18px}}
    header{{display:flex;gap:16px;align-items:center}}
    header img{{height:72px;border-radius:8px}}
    h1{{margin:0;font-size:26px}}
    .desc,.summary{{color:var(--muted)}}
    .desc{{margin-top:6px}}
    .grid{{display:grid;grid-template-columns:repeat(auto-fit,minmax(240px,1fr));gap:12px;margin-top:18px}}
    .card{{background:rgba(255,255,255,0.03);padding:12px;border-radius:10px;box-shadow:0 6px 18px rgba(2,6,23,0.6)}}
    a.item{{color:inherit;text-decoration:none}}
    footer{{margin-top:24px;color:var(--muted);font-size:13px}}
  </style>
</head>
<body>
  <div class="wrap">
    <header>
      {banner}
      <div>
        <h1>{title}</h1>
        <div class="desc">{description}</div>
      </div>
    </header>
    <section class="grid">{cards}
    </section>
    <footer>
      <div>API endpoint: <code>/api/items</code>. Admin token required for write operations.</div>
    </footer>
  </div>
</body>
</html>"#,
        page_title = escape_html(config.display_title()),
        banner = banner,
        title = escape_html(config.title.as_deref().unwrap_or_default()),
        description = escape_html(config.description.as_deref().unwrap_or_default()),
        cards = cards,
    )
}

/// `content` is admin-authored HTML and goes out verbatim.
pub fn render_item(item: &Item) -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width" />
  <title>{title}</title>
</head>
<body style="background:#0b1220;color:#fff;font-family:system-ui;padding:20px">
  <a href="/">&larr; Back</a>
  <h1>{title}</h1>
  <small>{created}</small>
  <div style="margin-top:18px">{content}</div>
</body>
</html>"#,
        title = escape_html(&item.title),
        created = item.created_at.format("%Y-%m-%d %H:%M UTC"),
        content = item.content,
    )
}
