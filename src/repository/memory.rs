use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;

use super::{ListRepository, ITEM_NOT_FOUND, LIST_NOT_FOUND};
use crate::{
    error::{AppError, AppResult},
    models::{
        ListDetail, ListId, ListItem, ListMetadata, ListSummary, NewList, OwnerId, PlaceItem,
        Placement, Rank, Top10List,
    },
};

/// In-process list store
///
/// Holds the same invariants as the Postgres store: every operation runs
/// under one lock acquisition, so each is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryListRepository {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_list_id: i64,
    last_item_id: i64,
    lists: HashMap<ListId, Top10List>,
    items: BTreeMap<(ListId, Rank), ListItem>,
}

impl MemoryState {
    fn owned(&self, list_id: ListId, owner: &OwnerId) -> AppResult<&Top10List> {
        self.lists
            .get(&list_id)
            .filter(|list| &list.owner_id == owner)
            .ok_or_else(|| AppError::NotFound(LIST_NOT_FOUND.to_string()))
    }

    fn items_of(&self, list_id: ListId) -> impl Iterator<Item = &ListItem> {
        self.items
            .range((list_id, Rank::MIN)..=(list_id, Rank::MAX))
            .map(|(_, item)| item)
    }
}

impl MemoryListRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of item rows stored for `list_id`, regardless of owner
    pub async fn item_rows(&self, list_id: ListId) -> usize {
        self.inner.read().await.items_of(list_id).count()
    }
}

#[async_trait::async_trait]
impl ListRepository for MemoryListRepository {
    async fn list_by_owner(&self, owner: &OwnerId) -> AppResult<Vec<ListSummary>> {
        let state = self.inner.read().await;

        let mut summaries: Vec<ListSummary> = state
            .lists
            .values()
            .filter(|list| &list.owner_id == owner)
            .map(|list| ListSummary {
                list: list.clone(),
                item_count: state.items_of(list.id).count() as i64,
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.list
                .created_at
                .cmp(&a.list.created_at)
                .then(b.list.id.cmp(&a.list.id))
        });

        Ok(summaries)
    }

    async fn get_list(&self, list_id: ListId, owner: &OwnerId) -> AppResult<ListDetail> {
        let state = self.inner.read().await;
        let list = state.owned(list_id, owner)?.clone();
        let items = state.items_of(list_id).cloned().collect();
        Ok(ListDetail::assemble(list, items))
    }

    async fn create_list(&self, owner: &OwnerId, list: NewList) -> AppResult<ListSummary> {
        let mut state = self.inner.write().await;
        state.last_list_id += 1;

        let now = Utc::now();
        let list = Top10List {
            id: ListId(state.last_list_id),
            owner_id: owner.clone(),
            title: list.title,
            list_type: list.list_type,
            description: list.description,
            created_at: now,
            updated_at: now,
        };
        state.lists.insert(list.id, list.clone());

        Ok(ListSummary {
            list,
            item_count: 0,
        })
    }

    async fn update_list_metadata(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        metadata: ListMetadata,
    ) -> AppResult<Top10List> {
        let mut state = self.inner.write().await;
        state.owned(list_id, owner)?;

        let list = state
            .lists
            .get_mut(&list_id)
            .ok_or_else(|| AppError::NotFound(LIST_NOT_FOUND.to_string()))?;
        list.title = metadata.title;
        list.description = metadata.description;
        list.updated_at = Utc::now();

        Ok(list.clone())
    }

    async fn delete_list(&self, list_id: ListId, owner: &OwnerId) -> AppResult<()> {
        let mut state = self.inner.write().await;
        state.owned(list_id, owner)?;

        state.lists.remove(&list_id);
        state.items.retain(|(id, _), _| *id != list_id);
        Ok(())
    }

    async fn place_item(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        item: PlaceItem,
    ) -> AppResult<Placement> {
        let mut state = self.inner.write().await;
        state.owned(list_id, owner)?.list_type.ensure_accepts(item.content_type)?;

        let key = (list_id, item.rank);
        if let Some(existing) = state.items.get_mut(&key) {
            existing.content_id = item.content_id;
            existing.content_type = item.content_type;
            existing.title = item.title;
            existing.poster_url = item.poster_url;
            return Ok(Placement {
                item: existing.clone(),
                created: false,
            });
        }

        state.last_item_id += 1;
        let stored = ListItem {
            id: state.last_item_id,
            list_id,
            rank: item.rank,
            content_id: item.content_id,
            content_type: item.content_type,
            title: item.title,
            poster_url: item.poster_url,
            added_at: Utc::now(),
        };
        state.items.insert(key, stored.clone());

        Ok(Placement {
            item: stored,
            created: true,
        })
    }

    async fn remove_item(&self, list_id: ListId, owner: &OwnerId, rank: Rank) -> AppResult<()> {
        let mut state = self.inner.write().await;
        state.owned(list_id, owner)?;

        state
            .items
            .remove(&(list_id, rank))
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(ITEM_NOT_FOUND.to_string()))
    }

    async fn move_item(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        from: Rank,
        to: Rank,
    ) -> AppResult<()> {
        let mut state = self.inner.write().await;
        state.owned(list_id, owner)?;

        let mut moving = state
            .items
            .remove(&(list_id, from))
            .ok_or_else(|| AppError::NotFound(ITEM_NOT_FOUND.to_string()))?;

        // Item rows stay bound to their slot; only the content travels.
        if let Some(mut displaced) = state.items.remove(&(list_id, to)) {
            std::mem::swap(&mut moving.id, &mut displaced.id);
            moving.rank = to;
            displaced.rank = from;
            state.items.insert((list_id, from), displaced);
        } else {
            moving.rank = to;
        }
        state.items.insert((list_id, to), moving);

        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
