// File:    main.rs
// Author:  apezoo
// Date:    2025-08-07
//
// Description: Local web server that renders printable passcards for the stored sequence key.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! A web server that renders printable Perfect Paper Passwords passcards.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};
use local_ip_address::local_ip;
use log::{error, info, warn};
use ppp_core::card::{card_of, parse_card_number};
use ppp_core::print::{PrintedCard, render_html_page};
use ppp_core::sequence::MAX_CARDS_PER_RUN;
use ppp_core::state_manager::{open_engine, resolve_key_dir};
use ppp_core::{KeyStore, PppError, PppResult, StatusReport};
use ppp_mpi::Mpi;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_PORT: u16 = 3000;

/// Shared application state
struct AppState {
    key_dir: PathBuf,
    host: String,
}

#[derive(Debug, Default, Deserialize)]
struct CardQuery {
    next: Option<usize>,
    card: Option<String>,
}

/// Which cards a page request asks for.
#[derive(Debug, PartialEq, Eq)]
enum Selection {
    /// The next `n` unprinted cards; advances the printed-card counter.
    Next(usize),
    /// One card by its 0-based number.
    Card(Mpi),
    /// The card holding the next passcode.
    Current,
}

impl CardQuery {
    fn selection(&self) -> Result<Selection, WebError> {
        match (self.next, &self.card) {
            (Some(_), Some(_)) => Err(WebError::BadRequest("use either next or card, not both".into())),
            (Some(0), None) => Err(WebError::BadRequest("next must be at least 1".into())),
            (Some(n), None) if n > MAX_CARDS_PER_RUN => Err(WebError::BadRequest(format!(
                "at most {MAX_CARDS_PER_RUN} cards per page"
            ))),
            (Some(n), None) => Ok(Selection::Next(n)),
            (None, Some(card)) => Ok(Selection::Card(parse_card_number(card)?)),
            (None, None) => Ok(Selection::Current),
        }
    }
}

#[derive(Debug)]
enum WebError {
    Ppp(PppError),
    BadRequest(String),
    Internal(String),
}

impl From<PppError> for WebError {
    fn from(e: PppError) -> Self {
        Self::Ppp(e)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Ppp(e @ PppError::NoKey(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            Self::Ppp(e @ PppError::InvalidPasscodeId(_)) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Ppp(e) => {
                error!("{e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(message) => {
                error!("{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = match env::var("PPP_WEB_PORT") {
        Ok(value) => match value.parse::<u16>() {
            Ok(port) => port,
            Err(e) => {
                error!("invalid PPP_WEB_PORT `{value}`: {e}");
                std::process::exit(1);
            }
        },
        Err(_) => DEFAULT_PORT,
    };
    let key_dir = resolve_key_dir(None, None);
    let host = env::var("PPP_WEB_NAME")
        .or_else(|_| env::var("HOSTNAME"))
        .unwrap_or_else(|_| "localhost".to_owned());

    println!("Using key directory: {}", key_dir.display());
    if !KeyStore::open(&key_dir).exists() {
        warn!("no sequence key in {}; create one with `pppauth key`", key_dir.display());
    }

    let app_state = Arc::new(AppState { key_dir, host });
    let app = Router::new()
        .route("/", get(cards_handler))
        .route("/api/status", get(status_handler))
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("listening on:");
    match local_ip() {
        Ok(ip) => println!("  - http://{ip}:{port}/"),
        Err(e) => info!("no local network address: {e}"),
    }
    println!("  - http://127.0.0.1:{port}/");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("cannot bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}

/// Runs key-store work off the async runtime; the store may sleep while
/// waiting for its lock.
async fn with_store<T, F>(state: Arc<AppState>, work: F) -> Result<T, WebError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> PppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| WebError::Internal(format!("worker failed: {e}")))?
        .map_err(WebError::from)
}

/// Renders the requested passcards as an HTML page.
async fn cards_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CardQuery>,
) -> Result<Html<String>, WebError> {
    let selection = query.selection()?;
    let page = with_store(state, move |app| {
        let mut engine = open_engine(KeyStore::open(&app.key_dir), None)?;
        let cards = match selection {
            Selection::Next(n) => engine.next_cards(n)?,
            Selection::Card(card) => vec![card],
            Selection::Current => vec![card_of(&engine.current_auth_index()?)?],
        };
        if let Some(first) = cards.first() {
            info!("rendering {} card(s) starting at {}", cards.len(), one_based(first)?);
        }
        let printed = cards
            .iter()
            .map(|card| PrintedCard::derive(engine.generator(), card))
            .collect::<PppResult<Vec<_>>>()?;
        let page = render_html_page(&printed, &app.host)?;
        Ok(page.as_str().to_owned())
    })
    .await?;
    Ok(Html(page))
}

/// Returns the sequence status as JSON.
async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusReport>, WebError> {
    let report = with_store(state, |app| open_engine(KeyStore::open(&app.key_dir), None)?.status()).await?;
    Ok(Json(report))
}

fn one_based(card: &Mpi) -> PppResult<String> {
    Ok(card.add_d(1)?.to_radix(10)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn query(next: Option<usize>, card: Option<&str>) -> CardQuery {
        CardQuery {
            next,
            card: card.map(str::to_owned),
        }
    }

    #[test]
    fn empty_query_shows_the_current_card() {
        assert_eq!(CardQuery::default().selection().unwrap(), Selection::Current);
    }

    #[test]
    fn card_numbers_are_one_based() {
        assert_eq!(
            query(None, Some("1,001")).selection().unwrap(),
            Selection::Card(Mpi::from_u64(1000))
        );
        assert!(matches!(
            query(None, Some("0")).selection(),
            Err(WebError::Ppp(PppError::InvalidPasscodeId(_)))
        ));
    }

    #[test]
    fn next_is_bounded() {
        assert_eq!(query(Some(3), None).selection().unwrap(), Selection::Next(3));
        assert!(matches!(query(Some(0), None).selection(), Err(WebError::BadRequest(_))));
        assert!(matches!(
            query(Some(MAX_CARDS_PER_RUN + 1), None).selection(),
            Err(WebError::BadRequest(_))
        ));
        assert!(matches!(query(Some(1), Some("2")).selection(), Err(WebError::BadRequest(_))));
    }

    #[test]
    fn missing_key_is_not_found() {
        let response = WebError::Ppp(PppError::NoKey(PathBuf::from("/nowhere"))).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
