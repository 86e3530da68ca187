use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::{ListRepository, ITEM_NOT_FOUND, LIST_NOT_FOUND};
use crate::{
    error::{AppError, AppResult},
    models::{
        ContentType, ListDetail, ListId, ListItem, ListMetadata, ListSummary, ListType, NewList,
        OwnerId, PlaceItem, Placement, Rank, Top10List,
    },
};

const LIST_COLUMNS: &str =
    "l.list_id, l.user_id, l.title, l.list_type, l.description, l.created_at, l.updated_at";

const ITEM_COLUMNS: &str =
    "item_id, list_id, rank, content_id, content_type, title, poster_url, added_at";

#[derive(Debug, FromRow)]
struct ListRow {
    list_id: i64,
    user_id: String,
    title: String,
    list_type: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    list: ListRow,
    item_count: i64,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    item_id: i64,
    list_id: i64,
    rank: i16,
    content_id: i64,
    content_type: String,
    title: String,
    poster_url: Option<String>,
    added_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PlacedRow {
    #[sqlx(flatten)]
    item: ItemRow,
    inserted: bool,
}

/// List row joined with at most one of its items
#[derive(Debug, FromRow)]
struct DetailRow {
    #[sqlx(flatten)]
    list: ListRow,
    item_id: Option<i64>,
    rank: Option<i16>,
    content_id: Option<i64>,
    content_type: Option<String>,
    item_title: Option<String>,
    poster_url: Option<String>,
    added_at: Option<DateTime<Utc>>,
}

/// Column values the schema's CHECK constraints rule out
fn corrupt(column: &str, value: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Unexpected {} value in store: {}", column, value))
}

impl TryFrom<ListRow> for Top10List {
    type Error = AppError;

    fn try_from(row: ListRow) -> Result<Self, Self::Error> {
        let list_type: ListType = row
            .list_type
            .parse()
            .map_err(|_| corrupt("list_type", &row.list_type))?;

        Ok(Top10List {
            id: ListId(row.list_id),
            owner_id: OwnerId(row.user_id),
            title: row.title,
            list_type,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ItemRow> for ListItem {
    type Error = AppError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let rank = Rank::try_from(row.rank).map_err(|_| corrupt("rank", row.rank))?;
        let content_type: ContentType = row
            .content_type
            .parse()
            .map_err(|_| corrupt("content_type", &row.content_type))?;

        Ok(ListItem {
            id: row.item_id,
            list_id: ListId(row.list_id),
            rank,
            content_id: row.content_id,
            content_type,
            title: row.title,
            poster_url: row.poster_url,
            added_at: row.added_at,
        })
    }
}

impl DetailRow {
    /// Splits off the joined item, if the row carries one
    fn into_parts(self) -> (ListRow, Option<ItemRow>) {
        let item = match (
            self.item_id,
            self.rank,
            self.content_id,
            self.content_type,
            self.item_title,
            self.added_at,
        ) {
            (
                Some(item_id),
                Some(rank),
                Some(content_id),
                Some(content_type),
                Some(title),
                Some(added_at),
            ) => Some(ItemRow {
                item_id,
                list_id: self.list.list_id,
                rank,
                content_id,
                content_type,
                title,
                poster_url: self.poster_url,
                added_at,
            }),
            _ => None,
        };
        (self.list, item)
    }
}

/// Postgres-backed list store
#[derive(Clone)]
pub struct PgListRepository {
    pool: PgPool,
}

impl PgListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the owned list row for the rest of `tx` and returns its type
    ///
    /// `FOR SHARE` keeps the list from being deleted underneath a slot write;
    /// `FOR UPDATE` additionally serializes writers of the same list.
    async fn lock_owned_list(
        tx: &mut Transaction<'_, Postgres>,
        list_id: ListId,
        owner: &OwnerId,
        exclusive: bool,
    ) -> AppResult<ListType> {
        let lock = if exclusive { "FOR UPDATE" } else { "FOR SHARE" };
        let sql = format!(
            "SELECT list_type FROM top10_lists WHERE list_id = $1 AND user_id = $2 {}",
            lock
        );

        let list_type: Option<String> = sqlx::query_scalar(&sql)
            .bind(list_id.0)
            .bind(owner.as_str())
            .fetch_optional(&mut **tx)
            .await?;

        let list_type = list_type.ok_or_else(|| AppError::NotFound(LIST_NOT_FOUND.to_string()))?;
        list_type
            .parse()
            .map_err(|_| corrupt("list_type", &list_type))
    }
}

#[async_trait::async_trait]
impl ListRepository for PgListRepository {
    async fn list_by_owner(&self, owner: &OwnerId) -> AppResult<Vec<ListSummary>> {
        let sql = format!(
            r#"
            SELECT {}, COUNT(i.item_id) AS item_count
            FROM top10_lists l
            LEFT JOIN list_items i ON i.list_id = l.list_id
            WHERE l.user_id = $1
            GROUP BY l.list_id
            ORDER BY l.created_at DESC, l.list_id DESC
            "#,
            LIST_COLUMNS
        );

        let rows: Vec<SummaryRow> = sqlx::query_as(&sql)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> AppResult<ListSummary> {
                Ok(ListSummary {
                    list: row.list.try_into()?,
                    item_count: row.item_count,
                })
            })
            .collect()
    }

    async fn get_list(&self, list_id: ListId, owner: &OwnerId) -> AppResult<ListDetail> {
        // One statement, so the list and its items come from the same snapshot.
        let sql = format!(
            r#"
            SELECT {},
                   i.item_id, i.rank, i.content_id, i.content_type,
                   i.title AS item_title, i.poster_url, i.added_at
            FROM top10_lists l
            LEFT JOIN list_items i ON i.list_id = l.list_id
            WHERE l.list_id = $1 AND l.user_id = $2
            ORDER BY i.rank ASC
            "#,
            LIST_COLUMNS
        );

        let rows: Vec<DetailRow> = sqlx::query_as(&sql)
            .bind(list_id.0)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut list = None;
        let mut items = Vec::new();
        for row in rows {
            let (list_row, item_row) = row.into_parts();
            if list.is_none() {
                list = Some(Top10List::try_from(list_row)?);
            }
            if let Some(item_row) = item_row {
                items.push(ListItem::try_from(item_row)?);
            }
        }

        let list = list.ok_or_else(|| AppError::NotFound(LIST_NOT_FOUND.to_string()))?;
        Ok(ListDetail::assemble(list, items))
    }

    async fn create_list(&self, owner: &OwnerId, list: NewList) -> AppResult<ListSummary> {
        let row: ListRow = sqlx::query_as(
            r#"
            INSERT INTO top10_lists (user_id, title, list_type, description)
            VALUES ($1, $2, $3, $4)
            RETURNING list_id, user_id, title, list_type, description, created_at, updated_at
            "#,
        )
        .bind(owner.as_str())
        .bind(&list.title)
        .bind(list.list_type.as_str())
        .bind(list.description.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(ListSummary {
            list: row.try_into()?,
            item_count: 0,
        })
    }

    async fn update_list_metadata(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        metadata: ListMetadata,
    ) -> AppResult<Top10List> {
        let row: Option<ListRow> = sqlx::query_as(
            r#"
            UPDATE top10_lists
            SET title = $1, description = $2, updated_at = NOW()
            WHERE list_id = $3 AND user_id = $4
            RETURNING list_id, user_id, title, list_type, description, created_at, updated_at
            "#,
        )
        .bind(&metadata.title)
        .bind(metadata.description.as_deref())
        .bind(list_id.0)
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| AppError::NotFound(LIST_NOT_FOUND.to_string()))?
            .try_into()
    }

    async fn delete_list(&self, list_id: ListId, owner: &OwnerId) -> AppResult<()> {
        // list_items rows go with it through ON DELETE CASCADE
        let deleted: Option<i64> = sqlx::query_scalar(
            "DELETE FROM top10_lists WHERE list_id = $1 AND user_id = $2 RETURNING list_id",
        )
        .bind(list_id.0)
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        deleted
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(LIST_NOT_FOUND.to_string()))
    }

    async fn place_item(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        item: PlaceItem,
    ) -> AppResult<Placement> {
        let mut tx = self.pool.begin().await?;

        let list_type = Self::lock_owned_list(&mut tx, list_id, owner, false).await?;
        list_type.ensure_accepts(item.content_type)?;

        // xmax is 0 only on a freshly inserted tuple
        let sql = format!(
            r#"
            INSERT INTO list_items (list_id, rank, content_id, content_type, title, poster_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT ON CONSTRAINT list_items_list_rank_key DO UPDATE
            SET content_id = EXCLUDED.content_id,
                content_type = EXCLUDED.content_type,
                title = EXCLUDED.title,
                poster_url = EXCLUDED.poster_url
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            ITEM_COLUMNS
        );

        let row: PlacedRow = sqlx::query_as(&sql)
            .bind(list_id.0)
            .bind(i16::from(item.rank))
            .bind(item.content_id)
            .bind(item.content_type.as_str())
            .bind(&item.title)
            .bind(item.poster_url.as_deref())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Placement {
            created: row.inserted,
            item: row.item.try_into()?,
        })
    }

    async fn remove_item(&self, list_id: ListId, owner: &OwnerId, rank: Rank) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        Self::lock_owned_list(&mut tx, list_id, owner, false).await?;

        let removed: Option<i64> = sqlx::query_scalar(
            "DELETE FROM list_items WHERE list_id = $1 AND rank = $2 RETURNING item_id",
        )
        .bind(list_id.0)
        .bind(i16::from(rank))
        .fetch_optional(&mut *tx)
        .await?;

        if removed.is_none() {
            return Err(AppError::NotFound(ITEM_NOT_FOUND.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn move_item(
        &self,
        list_id: ListId,
        owner: &OwnerId,
        from: Rank,
        to: Rank,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        Self::lock_owned_list(&mut tx, list_id, owner, true).await?;

        let occupied: Vec<i16> = sqlx::query_scalar(
            "SELECT rank FROM list_items WHERE list_id = $1 AND rank IN ($2, $3)",
        )
        .bind(list_id.0)
        .bind(i16::from(from))
        .bind(i16::from(to))
        .fetch_all(&mut *tx)
        .await?;

        if !occupied.contains(&i16::from(from)) {
            return Err(AppError::NotFound(ITEM_NOT_FOUND.to_string()));
        }

        if occupied.contains(&i16::from(to)) {
            // The FROM side reads pre-update values, so both rows receive
            // the other's content in one statement.
            sqlx::query(
                r#"
                UPDATE list_items AS target
                SET content_id = source.content_id,
                    content_type = source.content_type,
                    title = source.title,
                    poster_url = source.poster_url,
                    added_at = source.added_at
                FROM list_items AS source
                WHERE target.list_id = $1
                  AND source.list_id = $1
                  AND ((target.rank = $2 AND source.rank = $3)
                    OR (target.rank = $3 AND source.rank = $2))
                "#,
            )
            .bind(list_id.0)
            .bind(i16::from(from))
            .bind(i16::from(to))
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query("UPDATE list_items SET rank = $3 WHERE list_id = $1 AND rank = $2")
                .bind(list_id.0)
                .bind(i16::from(from))
                .bind(i16::from(to))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
