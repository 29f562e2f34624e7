pub mod book;
pub mod form;
pub mod publishing_date;
pub mod session;
pub mod view;

use crate::configs::Server;
use crate::item::ItemError;
use crate::item::repo::{DbPool, DieselBookRepository, DieselPublishingDateRepository};
use crate::item::service::{BookService, PublishingDateService};
use crate::web::form::{BookForm, BookTitleForm, DateQuery, PublishingDateForm};
use crate::web::session::{Session, SessionStore, SESSION_COOKIE};
use crate::web::view::Page;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use axum_extra::extract::Form;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 컨트롤러가 사용하는 서비스 모음
pub struct Context {
    pub books: BookService<DieselBookRepository>,
    pub publishing_dates: PublishingDateService<DieselPublishingDateRepository, DieselBookRepository>,
}

impl Context {
    pub fn new(pool: DbPool) -> Self {
        Self {
            books: BookService::new(DieselBookRepository::new(pool.clone())),
            publishing_dates: PublishingDateService::new(
                DieselPublishingDateRepository::new(pool.clone()),
                DieselBookRepository::new(pool),
            ),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    ctx: Arc<Context>,
    sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(pool: DbPool, session_ttl: Duration) -> Self {
        Self {
            ctx: Arc::new(Context::new(pool)),
            sessions: Arc::new(SessionStore::new(session_ttl)),
        }
    }
}

/// 컨트롤러 처리 결과로 페이지를 그리거나 다른 경로로 리다이렉트 한다.
#[derive(Debug)]
pub enum Outcome {
    Render(Page),
    Redirect(String),
}

impl Outcome {
    pub fn redirect(to: impl Into<String>) -> Self {
        Outcome::Redirect(to.into())
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Render(page) => Html(page.render()).into_response(),
            Outcome::Redirect(to) => Redirect::to(&to).into_response(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Item(#[from] ItemError),

    #[error("controller task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/books", get(list_books))
        .route("/books/add", get(add_book_form).post(add_book))
        .route("/books/updateBookTitle", post(update_book_title))
        .route("/books/books-by-date", get(books_by_date))
        .route("/publishingDates", get(list_publishing_dates))
        .route("/publishingDates/edit/{id}", get(edit_publishing_date))
        .route("/publishingDates/add", post(add_publishing_date))
        .route("/publishingDates/update", post(update_publishing_date))
        .route("/publishingDates/search", get(search_publishing_date))
        .with_state(state)
}

/// 서버를 실행하고 종료 시그널을 받을 때까지 요청을 처리한다.
pub async fn serve(server: &Server, pool: DbPool) -> Result<(), std::io::Error> {
    let state = AppState::new(pool, server.session_ttl());
    let sweeper = tokio::spawn(sweep_sessions(state.sessions.clone(), server.session_ttl()));

    let listener = tokio::net::TcpListener::bind(server.address()).await?;
    info!(address = %server.address(), "server started");

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    result
}

/// 요청이 없는 동안에도 만료된 세션이 쌓이지 않도록 주기적으로 정리한다.
async fn sweep_sessions(sessions: Arc<SessionStore>, ttl: Duration) {
    let mut interval = tokio::time::interval(ttl.max(Duration::from_secs(1)));
    loop {
        interval.tick().await;
        let purged = sessions.purge_expired();
        if purged > 0 {
            debug!(purged, remaining = sessions.len(), "expired sessions purged");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

/// 세션을 불러와 컨트롤러를 블로킹 스레드에서 실행하고, 변경된 세션을 저장한 뒤 세션 쿠키를 내려준다.
/// 컨트롤러가 실패하면 세션 변경 사항은 버려진다.
async fn dispatch<F>(state: AppState, jar: CookieJar, controller: F) -> Result<(CookieJar, Outcome), WebError>
where
    F: FnOnce(&Context, &mut Session) -> Result<Outcome, ItemError> + Send + 'static,
{
    let requested = jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
    let (session_id, mut session) = state.sessions.load(requested);

    let ctx = state.ctx.clone();
    let (session, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = controller(&*ctx, &mut session);
        (session, outcome)
    }).await?;
    let outcome = outcome?;

    debug!(%session_id, edit_state = ?session.edit_state(), "session updated");
    state.sessions.save(session_id, session);

    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true);
    Ok((jar.add(cookie), outcome))
}

async fn index() -> Redirect {
    Redirect::to(book::LIST_PATH)
}

async fn list_books(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, book::list).await
}

async fn add_book_form(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, book::add_form).await
}

async fn add_book(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<BookForm>,
) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, move |ctx, session| book::add(ctx, session, form)).await
}

async fn update_book_title(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<BookTitleForm>,
) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, move |ctx, session| book::update_title(ctx, session, form)).await
}

async fn books_by_date(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, move |ctx, _| book::books_by_date(ctx, query.date)).await
}

async fn list_publishing_dates(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, publishing_date::list).await
}

async fn edit_publishing_date(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, move |ctx, session| publishing_date::edit(ctx, session, id)).await
}

async fn add_publishing_date(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<PublishingDateForm>,
) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, move |ctx, session| publishing_date::add(ctx, session, form)).await
}

async fn update_publishing_date(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<PublishingDateForm>,
) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, move |ctx, session| publishing_date::update(ctx, session, form)).await
}

async fn search_publishing_date(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, WebError> {
    dispatch(state, jar, move |ctx, session| publishing_date::search(ctx, session, query.date)).await
}
