//! Persistence of ranked lists
//!
//! Every operation is scoped by owner: a list that exists but belongs to
//! someone else is reported exactly like a list that does not exist. The
//! ownership check is part of the same statement or transaction as the read
//! or write it guards.
use crate::{
    error::AppResult,
    models::{
        ListDetail, ListId, ListMetadata, ListSummary, NewList, OwnerId, PlaceItem, Placement,
        Rank, Top10List,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryListRepository;
pub use postgres::PgListRepository;

pub(crate) const LIST_NOT_FOUND: &str = "List not found";
pub(crate) const ITEM_NOT_FOUND: &str = "No item found at this rank";

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ListRepository: Send + Sync {
    /// All lists of `owner`, newest first, each with its filled slot count
    async fn list_by_owner(&self, owner: &OwnerId) -> AppResult<Vec<ListSummary>>;

    /// One list laid out over its ten slots
    async fn get_list(&self, list_id: ListId, owner: &OwnerId) -> AppResult<ListDetail>;

    /// Stores a new, empty list
    async fn create_list(&self, owner: &OwnerId, list: NewList) -> AppResult<ListSummary>;

    /// Replaces title and description. Type and items are untouched.
    async fn update_list_metadata(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        metadata: ListMetadata,
    ) -> AppResult<Top10List>;

    /// Deletes a list together with all of its items
    async fn delete_list(&self, list_id: ListId, owner: &OwnerId) -> AppResult<()>;

    /// Puts content into a slot, overwriting whatever occupied it
    ///
    /// Rejects content the list type does not accept. When the slot was
    /// already filled the stored item keeps its id and `added_at`.
    async fn place_item(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        item: PlaceItem,
    ) -> AppResult<Placement>;

    /// Empties a slot; fails if the slot is already empty
    async fn remove_item(&self, list_id: ListId, owner: &OwnerId, rank: Rank) -> AppResult<()>;

    /// Moves the item at `from` to `to`, exchanging contents if `to` is filled
    async fn move_item(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        from: Rank,
        to: Rank,
    ) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
