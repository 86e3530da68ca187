use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::{AuthUser, RequestId},
    models::{
        CreateListRequest, MoveItemRequest, PlaceItemRequest, RemoveItemQuery, UpdateListRequest,
    },
    services::ListService,
};

type ApiResponse = AppResult<(StatusCode, Json<Value>)>;

fn success(status: StatusCode, body: Value) -> ApiResponse {
    Ok((status, Json(body)))
}

/// Lists owned by the caller
pub async fn index(State(lists): State<ListService>, AuthUser(owner): AuthUser) -> ApiResponse {
    let summaries = lists.lists(&owner).await?;
    success(StatusCode::OK, json!({ "success": true, "data": summaries }))
}

/// Creates an empty list
pub async fn create(
    State(lists): State<ListService>,
    Extension(request_id): Extension<RequestId>,
    AuthUser(owner): AuthUser,
    payload: Result<Json<CreateListRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(request) = payload?;
    let created = lists.create(&owner, request).await?;

    tracing::info!(
        request_id = %request_id,
        list_id = %created.list.id,
        "List created"
    );

    success(StatusCode::CREATED, json!({ "success": true, "data": created }))
}

/// One list with all ten slots
pub async fn show(
    State(lists): State<ListService>,
    AuthUser(owner): AuthUser,
    Path(list_id): Path<String>,
) -> ApiResponse {
    let detail = lists.list(&owner, &list_id).await?;
    success(StatusCode::OK, json!({ "success": true, "data": detail }))
}

pub async fn update(
    State(lists): State<ListService>,
    Extension(request_id): Extension<RequestId>,
    AuthUser(owner): AuthUser,
    Path(list_id): Path<String>,
    payload: Result<Json<UpdateListRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(request) = payload?;
    let updated = lists.update(&owner, &list_id, request).await?;

    tracing::info!(request_id = %request_id, list_id = %updated.id, "List updated");

    success(StatusCode::OK, json!({ "success": true, "data": updated }))
}

pub async fn destroy(
    State(lists): State<ListService>,
    Extension(request_id): Extension<RequestId>,
    AuthUser(owner): AuthUser,
    Path(list_id): Path<String>,
) -> ApiResponse {
    lists.delete(&owner, &list_id).await?;

    tracing::info!(request_id = %request_id, list_id = %list_id, "List deleted");

    success(
        StatusCode::OK,
        json!({ "success": true, "message": "List deleted successfully" }),
    )
}

/// Fills a slot, overwriting whatever occupied it
///
/// Answers 201 when the slot was empty and 200 when it was overwritten.
pub async fn place_item(
    State(lists): State<ListService>,
    Extension(request_id): Extension<RequestId>,
    AuthUser(owner): AuthUser,
    Path(list_id): Path<String>,
    payload: Result<Json<PlaceItemRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(request) = payload?;
    let placement = lists.place_item(&owner, &list_id, request).await?;

    tracing::info!(
        request_id = %request_id,
        list_id = %list_id,
        rank = %placement.item.rank,
        created = placement.created,
        "Item placed"
    );

    let (status, message) = if placement.created {
        (StatusCode::CREATED, "Item added successfully")
    } else {
        (StatusCode::OK, "Item updated successfully")
    };

    success(
        status,
        json!({ "success": true, "data": placement.item, "message": message }),
    )
}

pub async fn remove_item(
    State(lists): State<ListService>,
    Extension(request_id): Extension<RequestId>,
    AuthUser(owner): AuthUser,
    Path(list_id): Path<String>,
    query: Result<Query<RemoveItemQuery>, QueryRejection>,
) -> ApiResponse {
    let Query(query) = query?;
    let rank = query.rank.clone();
    lists.remove_item(&owner, &list_id, query).await?;

    tracing::info!(
        request_id = %request_id,
        list_id = %list_id,
        rank = rank.as_deref().unwrap_or_default(),
        "Item removed"
    );

    success(
        StatusCode::OK,
        json!({ "success": true, "message": "Item removed successfully" }),
    )
}

/// Re-ranks an item, swapping with the destination slot if it is filled
pub async fn move_item(
    State(lists): State<ListService>,
    Extension(request_id): Extension<RequestId>,
    AuthUser(owner): AuthUser,
    Path(list_id): Path<String>,
    payload: Result<Json<MoveItemRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(request) = payload?;
    let (from, to) = (request.from_rank, request.to_rank);
    let detail = lists.move_item(&owner, &list_id, request).await?;

    tracing::info!(
        request_id = %request_id,
        list_id = %list_id,
        from_rank = ?from,
        to_rank = ?to,
        "Item moved"
    );

    success(
        StatusCode::OK,
        json!({ "success": true, "data": detail, "message": "Item moved successfully" }),
    )
}
