use axum::{response::Html, routing::get, Router};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/privacy", get(privacy))
        .route("/terms", get(terms))
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} · MealLens</title></head>
<body>
<main>
<h1>{title}</h1>
{body}
</main>
<footer><a href="/">Home</a> · <a href="/privacy">Privacy</a> · <a href="/terms">Terms</a> · <a href="/api/docs">API</a></footer>
</body>
</html>"#
    ))
}

pub async fn index() -> Html<String> {
    page(
        "MealLens",
        r#"<p>Describe or photograph a meal and get an estimate of its calories, carbohydrates and protein.</p>
<p>The API is documented at <a href="/api/docs">/api/docs</a>.</p>"#,
    )
}

pub async fn privacy() -> Html<String> {
    page(
        "Privacy policy",
        r#"<p>Sign-in uses Google. We read your Google account id, e-mail, name and picture from the identity token you present.</p>
<p>Meal descriptions and photos you submit are sent to an external language-model provider to produce the estimate. Photos are not stored by this service.</p>
<p>When history is enabled, each estimate is stored with your account id so that it can be listed back to you and summarised for recommendations.</p>"#,
    )
}

pub async fn terms() -> Html<String> {
    page(
        "Terms of use",
        r#"<p>Nutrition figures are estimates produced by a language model and may be wrong.</p>
<p>This service does not provide medical advice. Consult a qualified professional for dietary or health decisions.</p>"#,
    )
}
