//! Request payloads of the list endpoints.
//!
//! Every field is optional on the wire so that missing values surface as the
//! field-specific 400 messages below rather than as generic decode failures.

use serde::Deserialize;

use super::{ContentType, ListMetadata, ListType, NewList, PlaceItem, Rank};
use crate::error::{AppError, AppResult};

fn invalid(message: &str) -> AppError {
    AppError::InvalidInput(message.to_string())
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of `POST /lists`
#[derive(Debug, Default, Deserialize)]
pub struct CreateListRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub list_type: Option<String>,
    pub description: Option<String>,
}

impl CreateListRequest {
    pub fn validate(self) -> AppResult<NewList> {
        let (Some(title), Some(list_type)) = (present(self.title), present(self.list_type)) else {
            return Err(invalid("Title and type are required"));
        };
        let list_type: ListType = list_type.parse()?;
        NewList::new(title, list_type, self.description)
    }
}

/// Body of `PUT /lists/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateListRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl UpdateListRequest {
    pub fn validate(self) -> AppResult<ListMetadata> {
        let title = present(self.title).ok_or_else(|| invalid("Title is required"))?;
        ListMetadata::new(title, self.description)
    }
}

/// Body of `POST /lists/{id}/items`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceItemRequest {
    pub rank: Option<i64>,
    pub content_id: Option<i64>,
    pub content_type: Option<String>,
    pub title: Option<String>,
    pub poster_url: Option<String>,
}

impl PlaceItemRequest {
    pub fn validate(self) -> AppResult<PlaceItem> {
        let (Some(rank), Some(content_id), Some(content_type), Some(title)) = (
            self.rank,
            self.content_id,
            present(self.content_type),
            present(self.title),
        ) else {
            return Err(invalid(
                "Missing required fields: rank, contentId, contentType, title",
            ));
        };

        let rank = Rank::new(rank)?;
        let content_type: ContentType = content_type.parse()?;
        if content_id <= 0 {
            return Err(invalid("contentId must be a positive integer"));
        }

        Ok(PlaceItem {
            rank,
            content_id,
            content_type,
            title: title.trim().to_string(),
            poster_url: super::normalize_optional(self.poster_url),
        })
    }
}

/// Query of `DELETE /lists/{id}/items`
#[derive(Debug, Default, Deserialize)]
pub struct RemoveItemQuery {
    pub rank: Option<String>,
}

impl RemoveItemQuery {
    pub fn validate(self) -> AppResult<Rank> {
        let rank = present(self.rank).ok_or_else(|| invalid("Rank parameter is required"))?;
        rank.trim()
            .parse::<i64>()
            .ok()
            .and_then(|value| Rank::new(value).ok())
            .ok_or_else(|| invalid("Rank must be a number between 1 and 10"))
    }
}

/// Body of `POST /lists/{id}/items/move`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveItemRequest {
    pub from_rank: Option<i64>,
    pub to_rank: Option<i64>,
}

impl MoveItemRequest {
    pub fn validate(self) -> AppResult<(Rank, Rank)> {
        let (Some(from), Some(to)) = (self.from_rank, self.to_rank) else {
            return Err(invalid("fromRank and toRank are required"));
        };
        let (from, to) = (Rank::new(from)?, Rank::new(to)?);
        if from == to {
            return Err(invalid("fromRank and toRank must differ"));
        }
        Ok((from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: AppError) -> String {
        match err {
            AppError::InvalidInput(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_requires_title_and_type() {
        let err = CreateListRequest {
            title: Some("Favs".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(message(err), "Title and type are required");

        let err = CreateListRequest {
            title: Some("".into()),
            list_type: Some("movies".into()),
            description: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(message(err), "Title and type are required");
    }

    #[test]
    fn test_create_rejects_unknown_type() {
        let err = CreateListRequest {
            title: Some("Favs".into()),
            list_type: Some("podcasts".into()),
            description: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(message(err), "Invalid list type");
    }

    #[test]
    fn test_create_valid() {
        let list = CreateListRequest {
            title: Some("Favs".into()),
            list_type: Some("tv-shows".into()),
            description: Some("best ever".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(list.list_type, ListType::TvShows);
        assert_eq!(list.description.as_deref(), Some("best ever"));
    }

    #[test]
    fn test_update_requires_title() {
        let err = UpdateListRequest::default().validate().unwrap_err();
        assert_eq!(message(err), "Title is required");
    }

    #[test]
    fn test_place_item_missing_fields() {
        let err = PlaceItemRequest {
            rank: Some(1),
            content_id: Some(42),
            content_type: Some("movie".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            message(err),
            "Missing required fields: rank, contentId, contentType, title"
        );
    }

    #[test]
    fn test_place_item_rank_and_type_checks() {
        let base = || PlaceItemRequest {
            rank: Some(3),
            content_id: Some(42),
            content_type: Some("movie".into()),
            title: Some("Dune".into()),
            poster_url: None,
        };

        let err = PlaceItemRequest { rank: Some(11), ..base() }.validate().unwrap_err();
        assert_eq!(message(err), "Rank must be between 1 and 10");

        let err = PlaceItemRequest { rank: Some(0), ..base() }.validate().unwrap_err();
        assert_eq!(message(err), "Rank must be between 1 and 10");

        let err = PlaceItemRequest {
            content_type: Some("podcast".into()),
            ..base()
        }
        .validate()
        .unwrap_err();
        assert_eq!(message(err), "Content type must be \"movie\" or \"tv-show\"");

        let item = base().validate().unwrap();
        assert_eq!(item.rank.get(), 3);
        assert_eq!(item.content_type, ContentType::Movie);
    }

    #[test]
    fn test_remove_query_parsing() {
        let query = |rank: Option<&str>| RemoveItemQuery {
            rank: rank.map(str::to_string),
        };

        assert_eq!(message(query(None).validate().unwrap_err()), "Rank parameter is required");
        for bad in ["0", "11", "abc", "2.5"] {
            assert_eq!(
                message(query(Some(bad)).validate().unwrap_err()),
                "Rank must be a number between 1 and 10"
            );
        }
        assert_eq!(query(Some("7")).validate().unwrap().get(), 7);
    }

    #[test]
    fn test_move_request() {
        let err = MoveItemRequest { from_rank: Some(2), to_rank: Some(2) }
            .validate()
            .unwrap_err();
        assert_eq!(message(err), "fromRank and toRank must differ");

        let (from, to) = MoveItemRequest { from_rank: Some(1), to_rank: Some(10) }
            .validate()
            .unwrap();
        assert_eq!((from.get(), to.get()), (1, 10));
    }
}
