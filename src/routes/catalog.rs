use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::CatalogPage,
    services::CatalogProxies,
};

type ForwardedQuery = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// Upstream ids are forwarded as a path segment, so only plain tokens pass
fn entry_path(prefix: &str, id: &str, kind: &str) -> AppResult<String> {
    let plain = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if plain {
        Ok(format!("{}/{}", prefix, id))
    } else {
        Err(AppError::NotFound(format!("{} not found", kind)))
    }
}

pub async fn movies(
    State(catalog): State<CatalogProxies>,
    query: ForwardedQuery,
) -> AppResult<Json<CatalogPage>> {
    let Query(query) = query?;
    let page = catalog.movies()?.list("/movies", &query).await?;
    Ok(Json(page))
}

pub async fn movie(
    State(catalog): State<CatalogProxies>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let path = entry_path("/movies", &id, "Movie")?;
    let movie = catalog.movies()?.get(&path, &[]).await?;
    Ok(Json(movie))
}

pub async fn tv_shows(
    State(catalog): State<CatalogProxies>,
    query: ForwardedQuery,
) -> AppResult<Json<CatalogPage>> {
    let Query(query) = query?;
    let page = catalog.tv_shows()?.list("/shows", &query).await?;
    Ok(Json(page))
}

pub async fn tv_show(
    State(catalog): State<CatalogProxies>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let path = entry_path("/shows", &id, "TV show")?;
    let show = catalog.tv_shows()?.get(&path, &[]).await?;
    Ok(Json(show))
}

/// Status vocabulary of the TV catalog, passed through verbatim
pub async fn tv_show_statuses(
    State(catalog): State<CatalogProxies>,
    query: ForwardedQuery,
) -> AppResult<Json<Value>> {
    let Query(query) = query?;
    let statuses = catalog.tv_shows()?.get("/statuses", &query).await?;
    Ok(Json(statuses))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_path_accepts_plain_ids() {
        assert_eq!(entry_path("/movies", "42", "Movie").unwrap(), "/movies/42");
        assert_eq!(
            entry_path("/shows", "tt0903747", "TV show").unwrap(),
            "/shows/tt0903747"
        );
    }

    #[test]
    fn test_entry_path_rejects_traversal() {
        for id in ["", "../admin", "42?x=1", "a/b"] {
            assert!(matches!(
                entry_path("/movies", id, "Movie"),
                Err(AppError::NotFound(_))
            ));
        }
    }
}
