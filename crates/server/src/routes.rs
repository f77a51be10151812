// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::AppState;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;
use zl_store::{Contribution, Project, StoreError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/projects", web::get().to(list_projects))
        .route("/api/projects", web::post().to(create_project))
        .route("/api/contributions", web::get().to(list_contributions))
        .route("/api/contributions", web::post().to(record_contribution))
        .route("/api/oracle", web::get().to(oracle_result));
}

fn unix_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn store_failure(context: &str, err: StoreError) -> HttpResponse {
    match err {
        StoreError::ProjectNotFound(_) => {
            HttpResponse::NotFound().json(json!({ "error": "Project not found" }))
        }
        err => {
            error!(error = %err, "{context}");
            HttpResponse::InternalServerError().json(json!({ "error": context }))
        }
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn list_projects(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_projects().await {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(err) => store_failure("Failed to read projects", err),
    }
}

/// Incoming project record. The id and createdAt are assigned server-side
/// when the caller leaves them out.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewProjectRequest {
    id: Option<String>,
    title: Option<String>,
    category: Option<String>,
    description: Option<String>,
    images: Option<Vec<String>>,
    hard_cap: Option<String>,
    min_per: Option<String>,
    max_per: Option<String>,
    start: Option<String>,
    end: Option<String>,
    pool_address: Option<String>,
    creator: Option<String>,
    created_at: Option<String>,
}

async fn create_project(
    state: web::Data<AppState>,
    body: web::Json<NewProjectRequest>,
) -> impl Responder {
    let body = body.into_inner();
    let (title, pool_address, creator) = match (&body.title, &body.pool_address, &body.creator) {
        (Some(title), Some(pool), Some(creator))
            if !title.is_empty() && !pool.is_empty() && !creator.is_empty() =>
        {
            (title.clone(), pool.clone(), creator.clone())
        }
        _ => {
            return HttpResponse::BadRequest().json(json!({ "error": "Missing required fields" }))
        }
    };

    let project = Project {
        id: body
            .id
            .unwrap_or_else(|| format!("{:016x}", rand::random::<u64>())),
        title,
        category: body.category,
        description: body.description,
        images: body.images,
        hard_cap: body.hard_cap,
        min_per: body.min_per,
        max_per: body.max_per,
        start: body.start,
        end: body.end,
        pool_address,
        creator,
        created_at: body
            .created_at
            .unwrap_or_else(|| unix_now_millis().to_string()),
        contributions: Vec::new(),
    };
    let id = project.id.clone();

    match state.store.insert_project(project).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "id": id })),
        Err(err) => store_failure("Failed to save project", err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolQuery {
    pool_address: Option<String>,
}

async fn list_contributions(
    state: web::Data<AppState>,
    query: web::Query<PoolQuery>,
) -> impl Responder {
    let Some(pool_address) = query.pool_address.as_deref() else {
        return HttpResponse::BadRequest().json(json!({ "error": "Missing poolAddress" }));
    };
    match state.store.contributions(pool_address).await {
        Ok(contributions) => HttpResponse::Ok().json(json!({ "contributions": contributions })),
        Err(err) => store_failure("Failed to fetch contributions", err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewContributionRequest {
    pool_address: Option<String>,
    user: Option<String>,
    #[serde(default)]
    is_private: bool,
    amount_wei: Option<String>,
    tx: Option<String>,
}

async fn record_contribution(
    state: web::Data<AppState>,
    body: web::Json<NewContributionRequest>,
) -> impl Responder {
    let body = body.into_inner();
    let (Some(pool_address), Some(user)) = (body.pool_address, body.user) else {
        return HttpResponse::BadRequest().json(json!({ "error": "Missing required fields" }));
    };

    // The record timestamp is assigned here, not trusted from the caller.
    let contribution = Contribution {
        user,
        is_private: body.is_private,
        amount_wei: body.amount_wei,
        tx: body.tx,
        timestamp: unix_now_millis(),
    };

    match state.store.append_contribution(&pool_address, contribution).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(err) => store_failure("Failed to save contribution", err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OracleQuery {
    request_id: Option<String>,
}

async fn oracle_result(
    state: web::Data<AppState>,
    query: web::Query<OracleQuery>,
) -> impl Responder {
    let Some(request_id) = query.request_id.as_deref() else {
        return HttpResponse::BadRequest().json(json!({ "error": "Missing requestId" }));
    };
    match state.oracle.fetch(request_id).await {
        Some(result) => HttpResponse::Ok().json(result),
        None => HttpResponse::NotFound().json(json!({
            "error": "No decryption result found",
            "requestId": request_id,
            "tried": state.oracle.tried_paths(request_id),
        })),
    }
}
