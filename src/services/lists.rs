use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        CreateListRequest, ListDetail, ListId, ListSummary, MoveItemRequest, OwnerId,
        PlaceItemRequest, Placement, RemoveItemQuery, Top10List, UpdateListRequest,
    },
    repository::ListRepository,
};

/// List operations on behalf of an authenticated owner
///
/// Payloads are validated before the repository is touched, so a malformed
/// request never costs a store round trip. Path ids are resolved after the
/// payload; an id that cannot exist is reported as a missing list.
#[derive(Clone)]
pub struct ListService {
    repository: Arc<dyn ListRepository>,
}

impl ListService {
    pub fn new(repository: Arc<dyn ListRepository>) -> Self {
        Self { repository }
    }

    pub fn backend(&self) -> &'static str {
        self.repository.name()
    }

    pub async fn lists(&self, owner: &OwnerId) -> AppResult<Vec<ListSummary>> {
        self.repository.list_by_owner(owner).await
    }

    pub async fn list(&self, owner: &OwnerId, list_id: &str) -> AppResult<ListDetail> {
        let list_id: ListId = list_id.parse()?;
        self.repository.get_list(list_id, owner).await
    }

    pub async fn create(
        &self,
        owner: &OwnerId,
        request: CreateListRequest,
    ) -> AppResult<ListSummary> {
        let list = request.validate()?;
        let created = self.repository.create_list(owner, list).await?;

        tracing::debug!(
            list_id = %created.list.id,
            list_type = %created.list.list_type,
            "List created"
        );

        Ok(created)
    }

    pub async fn update(
        &self,
        owner: &OwnerId,
        list_id: &str,
        request: UpdateListRequest,
    ) -> AppResult<Top10List> {
        let metadata = request.validate()?;
        let list_id: ListId = list_id.parse()?;
        self.repository
            .update_list_metadata(list_id, owner, metadata)
            .await
    }

    pub async fn delete(&self, owner: &OwnerId, list_id: &str) -> AppResult<()> {
        let list_id: ListId = list_id.parse()?;
        self.repository.delete_list(list_id, owner).await
    }

    pub async fn place_item(
        &self,
        owner: &OwnerId,
        list_id: &str,
        request: PlaceItemRequest,
    ) -> AppResult<Placement> {
        let item = request.validate()?;
        let list_id: ListId = list_id.parse()?;
        let placement = self.repository.place_item(list_id, owner, item).await?;

        tracing::debug!(
            list_id = %list_id,
            rank = %placement.item.rank,
            created = placement.created,
            "Slot filled"
        );

        Ok(placement)
    }

    pub async fn remove_item(
        &self,
        owner: &OwnerId,
        list_id: &str,
        query: RemoveItemQuery,
    ) -> AppResult<()> {
        let rank = query.validate()?;
        let list_id: ListId = list_id.parse()?;
        self.repository.remove_item(list_id, owner, rank).await
    }

    /// Moves an item and returns the list as it looks afterwards
    pub async fn move_item(
        &self,
        owner: &OwnerId,
        list_id: &str,
        request: MoveItemRequest,
    ) -> AppResult<ListDetail> {
        let (from, to) = request.validate()?;
        let list_id: ListId = list_id.parse()?;
        self.repository.move_item(list_id, owner, from, to).await?;
        self.repository.get_list(list_id, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{ContentType, ListItem, ListType, Rank},
        repository::MockListRepository,
    };
    use chrono::Utc;

    fn service(mock: MockListRepository) -> ListService {
        ListService::new(Arc::new(mock))
    }

    fn owner() -> OwnerId {
        OwnerId::new("alice")
    }

    #[tokio::test]
    async fn test_invalid_create_never_reaches_store() {
        // No expectations: any repository call would panic.
        let service = service(MockListRepository::new());

        let err = service
            .create(
                &owner(),
                CreateListRequest {
                    title: Some("Favs".into()),
                    list_type: Some("books".into()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_remove_never_reaches_store() {
        let service = service(MockListRepository::new());

        for rank in ["0", "11"] {
            let err = service
                .remove_item(
                    &owner(),
                    "1",
                    RemoveItemQuery {
                        rank: Some(rank.to_string()),
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_unparseable_id_is_not_found() {
        let service = service(MockListRepository::new());
        let err = service.list(&owner(), "not-a-number").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_payload_is_validated_before_id() {
        let service = service(MockListRepository::new());
        let err = service
            .update(&owner(), "bogus", UpdateListRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_place_item_forwards_validated_item() {
        let mut mock = MockListRepository::new();
        mock.expect_place_item()
            .withf(|list_id, owner, item| {
                *list_id == ListId(5)
                    && owner.as_str() == "alice"
                    && item.rank.get() == 3
                    && item.content_id == 42
                    && item.content_type == ContentType::Movie
                    && item.title == "Dune"
            })
            .times(1)
            .returning(|list_id, _, item| {
                Ok(Placement {
                    item: ListItem {
                        id: 1,
                        list_id,
                        rank: item.rank,
                        content_id: item.content_id,
                        content_type: item.content_type,
                        title: item.title,
                        poster_url: item.poster_url,
                        added_at: Utc::now(),
                    },
                    created: true,
                })
            });

        let placement = service(mock)
            .place_item(
                &owner(),
                "5",
                PlaceItemRequest {
                    rank: Some(3),
                    content_id: Some(42),
                    content_type: Some("movie".into()),
                    title: Some("Dune".into()),
                    poster_url: None,
                },
            )
            .await
            .unwrap();
        assert!(placement.created);
        assert_eq!(placement.item.rank, Rank::new(3).unwrap());
    }

    #[tokio::test]
    async fn test_create_forwards_normalized_list() {
        let mut mock = MockListRepository::new();
        mock.expect_create_list()
            .withf(|_, list| {
                list.title == "Favs" && list.list_type == ListType::Mixed && list.description.is_none()
            })
            .times(1)
            .returning(|owner, list| {
                let now = Utc::now();
                Ok(ListSummary {
                    list: Top10List {
                        id: ListId(1),
                        owner_id: owner.clone(),
                        title: list.title,
                        list_type: list.list_type,
                        description: list.description,
                        created_at: now,
                        updated_at: now,
                    },
                    item_count: 0,
                })
            });

        let created = service(mock)
            .create(
                &owner(),
                CreateListRequest {
                    title: Some("  Favs ".into()),
                    list_type: Some("mixed".into()),
                    description: Some("".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.item_count, 0);
        assert_eq!(created.list.owner_id, owner());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut mock = MockListRepository::new();
        mock.expect_list_by_owner()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let err = service(mock).lists(&owner()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
