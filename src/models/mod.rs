use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::{AppError, AppResult};

pub mod catalog;
pub mod requests;

pub use catalog::{CatalogPage, CatalogResponse, Pagination};
pub use requests::{
    CreateListRequest, MoveItemRequest, PlaceItemRequest, RemoveItemQuery, UpdateListRequest,
};

/// Number of ranked slots in every list
pub const SLOT_COUNT: u8 = 10;

/// Store-assigned identifier of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub i64);

impl Display for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListId {
    type Err = AppError;

    /// An id that cannot name a stored list is reported the same way as a
    /// missing one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(ListId)
            .ok_or_else(|| AppError::NotFound("List not found".to_string()))
    }
}

/// Opaque user identifier handed over by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of content a list may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListType {
    Movies,
    TvShows,
    Mixed,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Movies => "movies",
            ListType::TvShows => "tv-shows",
            ListType::Mixed => "mixed",
        }
    }

    /// Whether an item of `content_type` may be placed in a list of this type
    pub fn accepts(&self, content_type: ContentType) -> bool {
        matches!(
            (self, content_type),
            (ListType::Mixed, _)
                | (ListType::Movies, ContentType::Movie)
                | (ListType::TvShows, ContentType::TvShow)
        )
    }

    /// Checks compatibility, producing the client-facing rejection message
    pub fn ensure_accepts(&self, content_type: ContentType) -> AppResult<()> {
        let message = match self {
            _ if self.accepts(content_type) => return Ok(()),
            ListType::TvShows => "This list only accepts TV shows",
            _ => "This list only accepts movies",
        };
        Err(AppError::InvalidInput(message.to_string()))
    }
}

impl Display for ListType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movies" => Ok(ListType::Movies),
            "tv-shows" => Ok(ListType::TvShows),
            "mixed" => Ok(ListType::Mixed),
            _ => Err(AppError::InvalidInput("Invalid list type".to_string())),
        }
    }
}

/// Kind of a single catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Movie,
    TvShow,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::TvShow => "tv-show",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ContentType::Movie),
            "tv-show" => Ok(ContentType::TvShow),
            _ => Err(AppError::InvalidInput(
                "Content type must be \"movie\" or \"tv-show\"".to_string(),
            )),
        }
    }
}

/// A slot position, always within `1..=10`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rank(u8);

impl Rank {
    pub const MIN: Rank = Rank(1);
    pub const MAX: Rank = Rank(SLOT_COUNT);

    pub fn new(value: i64) -> AppResult<Self> {
        if (1..=i64::from(SLOT_COUNT)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AppError::InvalidInput(
                "Rank must be between 1 and 10".to_string(),
            ))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Every rank in ascending order
    pub fn all() -> impl Iterator<Item = Rank> {
        (1..=SLOT_COUNT).map(Rank)
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i16> for Rank {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Rank::new(i64::from(value))
    }
}

impl From<Rank> for i16 {
    fn from(rank: Rank) -> Self {
        i16::from(rank.0)
    }
}

/// A ranked list as stored
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Top10List {
    pub id: ListId,
    #[serde(skip)]
    pub owner_id: OwnerId,
    pub title: String,
    #[serde(rename = "type")]
    pub list_type: ListType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A list annotated with how many of its slots are filled
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    #[serde(flatten)]
    pub list: Top10List,
    pub item_count: i64,
}

/// A stored item occupying one slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: i64,
    #[serde(skip)]
    pub list_id: ListId,
    pub rank: Rank,
    pub content_id: i64,
    pub content_type: ContentType,
    pub title: String,
    pub poster_url: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Fields placed into a slot. After the placement exactly one item occupies
/// `rank`, carrying these fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceItem {
    pub rank: Rank,
    pub content_id: i64,
    pub content_type: ContentType,
    pub title: String,
    pub poster_url: Option<String>,
}

/// Outcome of a placement
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub item: ListItem,
    /// `true` when the slot was empty before
    pub created: bool,
}

/// Input for a new list
#[derive(Debug, Clone, PartialEq)]
pub struct NewList {
    pub title: String,
    pub list_type: ListType,
    pub description: Option<String>,
}

impl NewList {
    pub fn new(
        title: impl Into<String>,
        list_type: ListType,
        description: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            title: require_title(title.into())?,
            list_type,
            description: normalize_optional(description),
        })
    }
}

/// Mutable list metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ListMetadata {
    pub title: String,
    pub description: Option<String>,
}

impl ListMetadata {
    pub fn new(title: impl Into<String>, description: Option<String>) -> AppResult<Self> {
        Ok(Self {
            title: require_title(title.into())?,
            description: normalize_optional(description),
        })
    }
}

fn require_title(title: String) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Content shown in a filled slot. `contentId` goes out as `movieId` for
/// client compatibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotItem {
    #[serde(rename = "movieId")]
    pub content_id: i64,
    pub title: String,
    pub poster_url: Option<String>,
    pub content_type: ContentType,
}

/// One of the ten positions of a list, filled or empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub rank: Rank,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub item: Option<SlotItem>,
}

impl From<ListItem> for SlotItem {
    fn from(item: ListItem) -> Self {
        Self {
            content_id: item.content_id,
            title: item.title,
            poster_url: item.poster_url,
            content_type: item.content_type,
        }
    }
}

/// A list together with all ten of its slots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListDetail {
    #[serde(flatten)]
    pub list: Top10List,
    pub items: Vec<Slot>,
}

impl ListDetail {
    /// Lays stored items out over the ten slots in rank order
    pub fn assemble(list: Top10List, items: Vec<ListItem>) -> Self {
        let mut filled: Vec<Option<ListItem>> = vec![None; usize::from(SLOT_COUNT)];
        for item in items {
            let index = usize::from(item.rank.get() - 1);
            filled[index] = Some(item);
        }

        let items = Rank::all()
            .zip(filled)
            .map(|(rank, item)| Slot {
                rank,
                item: item.map(SlotItem::from),
            })
            .collect();

        Self { list, items }
    }

    pub fn filled_count(&self) -> usize {
        self.items.iter().filter(|slot| slot.item.is_some()).count()
    }
}

/// Turns an empty or whitespace-only optional string into `None`
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_list() -> Top10List {
        let now = Utc::now();
        Top10List {
            id: ListId(7),
            owner_id: OwnerId::new("user-1"),
            title: "Favs".to_string(),
            list_type: ListType::Movies,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_item(rank: i64, content_id: i64, title: &str) -> ListItem {
        ListItem {
            id: content_id,
            list_id: ListId(7),
            rank: Rank::new(rank).unwrap(),
            content_id,
            content_type: ContentType::Movie,
            title: title.to_string(),
            poster_url: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_list_type_parse() {
        assert_eq!("movies".parse::<ListType>().unwrap(), ListType::Movies);
        assert_eq!("tv-shows".parse::<ListType>().unwrap(), ListType::TvShows);
        assert_eq!("mixed".parse::<ListType>().unwrap(), ListType::Mixed);
        assert!("books".parse::<ListType>().is_err());
        assert!("Movies".parse::<ListType>().is_err());
    }

    #[test]
    fn test_list_type_accepts() {
        assert!(ListType::Movies.accepts(ContentType::Movie));
        assert!(!ListType::Movies.accepts(ContentType::TvShow));
        assert!(ListType::TvShows.accepts(ContentType::TvShow));
        assert!(!ListType::TvShows.accepts(ContentType::Movie));
        assert!(ListType::Mixed.accepts(ContentType::Movie));
        assert!(ListType::Mixed.accepts(ContentType::TvShow));
    }

    #[test]
    fn test_ensure_accepts_messages() {
        let err = ListType::Movies
            .ensure_accepts(ContentType::TvShow)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: This list only accepts movies");

        let err = ListType::TvShows
            .ensure_accepts(ContentType::Movie)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: This list only accepts TV shows");
    }

    #[test]
    fn test_rank_bounds() {
        assert!(Rank::new(0).is_err());
        assert!(Rank::new(-3).is_err());
        assert!(Rank::new(11).is_err());
        assert_eq!(Rank::new(1).unwrap().get(), 1);
        assert_eq!(Rank::new(10).unwrap().get(), 10);
        assert_eq!(Rank::all().count(), 10);
    }

    #[test]
    fn test_list_id_from_str() {
        assert_eq!("42".parse::<ListId>().unwrap(), ListId(42));
        assert!(matches!("abc".parse::<ListId>(), Err(AppError::NotFound(_))));
        assert!(matches!("-1".parse::<ListId>(), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_assemble_always_yields_ten_slots() {
        let detail = ListDetail::assemble(sample_list(), vec![]);
        assert_eq!(detail.items.len(), 10);
        assert_eq!(detail.filled_count(), 0);
        for (index, slot) in detail.items.iter().enumerate() {
            assert_eq!(usize::from(slot.rank.get()), index + 1);
        }
    }

    #[test]
    fn test_assemble_places_items_by_rank() {
        let detail = ListDetail::assemble(
            sample_list(),
            vec![sample_item(10, 2, "Alien"), sample_item(3, 42, "Dune")],
        );
        assert_eq!(detail.filled_count(), 2);
        assert_eq!(detail.items[2].item.as_ref().unwrap().title, "Dune");
        assert_eq!(detail.items[9].item.as_ref().unwrap().title, "Alien");
        assert!(detail.items[0].item.is_none());
    }

    #[test]
    fn test_slot_serialization_shapes() {
        let detail = ListDetail::assemble(sample_list(), vec![sample_item(3, 42, "Dune")]);
        let value = serde_json::to_value(&detail).unwrap();

        assert_eq!(value["title"], "Favs");
        assert_eq!(value["type"], "movies");
        assert!(value.get("ownerId").is_none());
        assert_eq!(value["items"][0], json!({ "rank": 1 }));
        assert_eq!(
            value["items"][2],
            json!({
                "rank": 3,
                "movieId": 42,
                "title": "Dune",
                "posterUrl": null,
                "contentType": "movie"
            })
        );
    }

    #[test]
    fn test_summary_serialization() {
        let summary = ListSummary {
            list: sample_list(),
            item_count: 4,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["itemCount"], 4);
        assert!(value["createdAt"].is_string());
        assert!(value["updatedAt"].is_string());
    }

    #[test]
    fn test_new_list_requires_title() {
        assert!(NewList::new("", ListType::Movies, None).is_err());
        assert!(NewList::new("   ", ListType::Mixed, None).is_err());

        let list = NewList::new(" Favs ", ListType::Movies, Some(String::new())).unwrap();
        assert_eq!(list.title, "Favs");
        assert_eq!(list.description, None);
    }

    #[test]
    fn test_metadata_requires_title() {
        assert!(ListMetadata::new("", None).is_err());
        let metadata = ListMetadata::new("Renamed", Some("all time".into())).unwrap();
        assert_eq!(metadata.description.as_deref(), Some("all time"));
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" Best of ".to_string())),
            Some("Best of".to_string())
        );
    }
}
