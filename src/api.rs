//! Handlers mounted under the protected `/api` prefix.

use actix_web::HttpResponse;
use serde_json::json;

use crate::auth::AuthenticatedUser;

/// Echoes the identity the token resolved to.
pub async fn current_user(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "userId": user.user_id }))
}
