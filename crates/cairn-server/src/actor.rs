// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Actor identification.
//!
//! Authentication is done by the reverse proxy in front of the server, which
//! forwards the authenticated user in trusted headers:
//!
//! - `x-cairn-user-id`: the user's UUID
//! - `x-cairn-admin`: `true` when the user is an administrator
//!
//! [`actor_layer`] turns those headers into an [`ActorContext`] request
//! extension. Handlers then use the [`RequireActor`] extractor.

use axum::{
	body::Body,
	extract::FromRequestParts,
	http::{request::Parts, HeaderMap, Request},
	middleware::Next,
	response::{IntoResponse, Response},
};
use cairn_common_entity::UserId;
use tracing::instrument;

use crate::error::ServerError;

pub const USER_ID_HEADER: &str = "x-cairn-user-id";
pub const ADMIN_HEADER: &str = "x-cairn-admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
	pub user_id: UserId,
	pub is_admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ActorContext {
	pub actor: Option<Actor>,
}

fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
	let user_id = headers
		.get(USER_ID_HEADER)?
		.to_str()
		.ok()?
		.trim()
		.parse::<UserId>()
		.ok()?;
	let is_admin = headers
		.get(ADMIN_HEADER)
		.and_then(|v| v.to_str().ok())
		.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
	Some(Actor { user_id, is_admin })
}

#[instrument(
	name = "actor_layer",
	skip(request, next),
	fields(user_id = tracing::field::Empty)
)]
pub async fn actor_layer(mut request: Request<Body>, next: Next) -> Response {
	let actor = actor_from_headers(request.headers());
	if let Some(ref actor) = actor {
		tracing::Span::current().record("user_id", tracing::field::display(&actor.user_id));
	}
	request.extensions_mut().insert(ActorContext { actor });
	next.run(request).await
}

/// Extractor that rejects requests without an identified actor.
pub struct RequireActor(pub Actor);

impl<S> FromRequestParts<S> for RequireActor
where
	S: Send + Sync,
{
	type Rejection = Response;

	#[instrument(name = "RequireActor::from_request_parts", skip_all)]
	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let context = parts
			.extensions
			.get::<ActorContext>()
			.cloned()
			.unwrap_or_default();

		match context.actor {
			Some(actor) => Ok(RequireActor(actor)),
			None => {
				tracing::debug!("request without actor rejected");
				Err(ServerError::Unauthorized("An authenticated user is required".to_string())
					.into_response())
			}
		}
	}
}

impl Actor {
	pub fn require_admin(&self) -> Result<(), ServerError> {
		if self.is_admin {
			Ok(())
		} else {
			Err(ServerError::Forbidden(
				"Administrator privileges are required".to_string(),
			))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	#[test]
	fn parses_user_and_admin_flag() {
		let user = UserId::generate();
		let mut headers = HeaderMap::new();
		headers.insert(USER_ID_HEADER, HeaderValue::from_str(&user.to_string()).unwrap());
		headers.insert(ADMIN_HEADER, HeaderValue::from_static("TRUE"));

		let actor = actor_from_headers(&headers).unwrap();
		assert_eq!(actor.user_id, user);
		assert!(actor.is_admin);
		assert!(actor.require_admin().is_ok());
	}

	#[test]
	fn missing_or_invalid_user_is_no_actor() {
		assert!(actor_from_headers(&HeaderMap::new()).is_none());

		let mut headers = HeaderMap::new();
		headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
		assert!(actor_from_headers(&headers).is_none());
	}

	#[test]
	fn non_admin_is_forbidden_from_admin_actions() {
		let actor = Actor {
			user_id: UserId::generate(),
			is_admin: false,
		};
		assert!(matches!(actor.require_admin(), Err(ServerError::Forbidden(_))));
	}

	#[test]
	fn extractor_rejects_requests_without_context() {
		let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
		let response = tokio_test::block_on(RequireActor::from_request_parts(&mut parts, &()))
			.err()
			.unwrap();
		assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
	}

	#[test]
	fn extractor_returns_actor_from_context() {
		let actor = Actor {
			user_id: UserId::generate(),
			is_admin: false,
		};
		let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
		parts.extensions.insert(ActorContext { actor: Some(actor) });
		let RequireActor(extracted) =
			tokio_test::block_on(RequireActor::from_request_parts(&mut parts, &())).unwrap();
		assert_eq!(extracted, actor);
	}
}
