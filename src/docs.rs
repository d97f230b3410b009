use axum::{response::Html, routing::get, Json, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{health, meals, recommendations, state::AppState};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MealLens API",
        description = "Meal nutrition estimates and coaching backed by a language model."
    ),
    paths(
        health::health,
        health::health_db,
        meals::handlers::analyze_meal,
        meals::handlers::list_meals,
        recommendations::handlers::recommendations,
    ),
    components(schemas(
        health::HealthResponse,
        health::DbHealthResponse,
        meals::dto::AnalyzeMealRequest,
        meals::dto::AnalyzeMealResponse,
        meals::dto::MealRecordResponse,
        recommendations::dto::RecommendationRequest,
    )),
    modifiers(&GoogleIdToken),
    tags(
        (name = "health", description = "Liveness and database checks"),
        (name = "meals", description = "Meal analysis and history"),
        (name = "recommendations", description = "Nutrition coaching")
    )
)]
pub struct ApiDoc;

struct GoogleIdToken;

impl Modify for GoogleIdToken {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "google_id_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Google ID token from Google Sign-In"))
                        .build(),
                ),
            );
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

const SWAGGER_UI: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>MealLens API docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/api/openapi.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>"##;

pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn swagger_page_loads_the_document() {
        let Html(page) = swagger_ui().await;
        assert!(page.contains(r##"dom_id: "#swagger-ui""##));
        assert!(page.contains(r#"url: "/api/openapi.json""#));
        assert!(page.trim_end().ends_with("</html>"));
    }

    #[test]
    fn document_lists_every_api_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/api/health",
            "/api/health/db",
            "/api/analyze-meal",
            "/api/meals",
            "/api/recommendations",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert_eq!(
            doc["components"]["securitySchemes"]["google_id_token"]["scheme"],
            "bearer"
        );
    }
}
