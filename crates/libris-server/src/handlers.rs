//! HTTP request handlers for the library API.
//!
//! Catalog browsing, book creation and reader sign-up are open; everything
//! else requires a staff bearer token (see [`StaffSession`]).

use crate::config::StaffAccount;
use crate::dto::{
    parse_id, BookPayload, BookResponse, BorrowRequest, HealthCheckResponse, LoanListParams,
    LoanResponse, ReaderPayload, ReaderResponse, TokenRequest, TokenResponse,
};
use crate::error::AppError;
use crate::session::{SessionManager, StaffSession};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router as AxumRouter,
};
use libris_domain::traits::LibraryStore;
use libris_domain::{BookId, LoanId, LoanQuery, NewBook, NewReader, ReaderId};
use libris_gatekeeper::Gatekeeper;
use libris_store::SqliteStore;
use std::sync::{Arc, Mutex};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Record store; SQLite calls run on the blocking pool
    pub store: Arc<Mutex<SqliteStore>>,
    /// Draft validation
    pub gatekeeper: Arc<Gatekeeper>,
    /// Session manager for JWT token operations
    pub session_manager: Arc<SessionManager>,
    /// Accounts allowed to log in
    pub staff: Arc<Vec<StaffAccount>>,
}

impl AppState {
    /// Bundle the server's collaborators
    pub fn new(
        store: SqliteStore,
        gatekeeper: Gatekeeper,
        session_manager: SessionManager,
        staff: Vec<StaffAccount>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            gatekeeper: Arc::new(gatekeeper),
            session_manager: Arc::new(session_manager),
            staff: Arc::new(staff),
        }
    }

    /// Run `op` against the store on the blocking thread pool
    async fn with_store<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut SqliteStore, &Gatekeeper) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let gatekeeper = Arc::clone(&self.gatekeeper);

        tokio::task::spawn_blocking(move || {
            let mut store = store
                .lock()
                .map_err(|_| AppError::Internal("store lock poisoned".to_string()))?;
            op(&mut *store, gatekeeper.as_ref())
        })
        .await
        .map_err(|e| AppError::Internal(format!("store task failed: {}", e)))?
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn check_book(
    gatekeeper: &Gatekeeper,
    store: &SqliteStore,
    draft: &NewBook,
    current: Option<BookId>,
) -> Result<(), AppError> {
    let result = gatekeeper.validate_book(draft, current, Some(store))?;
    if result.is_accepted() {
        Ok(())
    } else {
        Err(AppError::Validation(result.message()))
    }
}

fn check_reader(
    gatekeeper: &Gatekeeper,
    store: &SqliteStore,
    draft: &NewReader,
    current: Option<ReaderId>,
) -> Result<(), AppError> {
    let result = gatekeeper.validate_reader(draft, current, Some(store))?;
    if result.is_accepted() {
        Ok(())
    } else {
        Err(AppError::Validation(result.message()))
    }
}

/// GET /health - Record counts
async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthCheckResponse>, AppError> {
    let stats = state.with_store(|store, _| Ok(store.stats()?)).await?;

    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        books: stats.books,
        readers: stats.readers,
        active_loans: stats.active_loans,
    }))
}

/// POST /api/token - Exchange staff credentials for a bearer token
async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let request = body(payload)?;

    let token = state
        .session_manager
        .login(&state.staff, &request.username, &request.password)
        .inspect_err(|_| tracing::warn!(username = %request.username, "Staff login failed"))?;

    tracing::info!(username = %request.username, "Issued staff token");

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.session_manager.token_expiry_secs(),
    }))
}

/// GET /api/books - Whole catalog
async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<BookResponse>>, AppError> {
    let books = state.with_store(|store, _| Ok(store.list_books()?)).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// POST /api/books - Add a book
async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let draft = NewBook::from(body(payload)?);

    let book = state
        .with_store(move |store, gatekeeper| {
            check_book(gatekeeper, store, &draft, None)?;
            Ok(store.create_book(draft)?)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(book.into())))
}

/// GET /api/books/:id
async fn get_book(
    _staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let id: BookId = parse_id(&id)?;

    let book = state
        .with_store(move |store, _| {
            store
                .get_book(id)?
                .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", id)))
        })
        .await?;

    Ok(Json(book.into()))
}

/// PUT /api/books/:id - Replace every field of a book
async fn update_book(
    _staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let id: BookId = parse_id(&id)?;
    let draft = NewBook::from(body(payload)?);

    let book = state
        .with_store(move |store, gatekeeper| {
            check_book(gatekeeper, store, &draft, Some(id))?;
            Ok(store.update_book(id, draft)?)
        })
        .await?;

    Ok(Json(book.into()))
}

/// DELETE /api/books/:id
async fn delete_book(
    staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: BookId = parse_id(&id)?;

    state
        .with_store(move |store, _| Ok(store.delete_book(id)?))
        .await?;

    tracing::info!(book_id = %id, staff = staff.username(), "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/readers
async fn list_readers(
    _staff: StaffSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReaderResponse>>, AppError> {
    let readers = state.with_store(|store, _| Ok(store.list_readers()?)).await?;
    Ok(Json(readers.into_iter().map(ReaderResponse::from).collect()))
}

/// POST /api/readers - Reader sign-up
async fn create_reader(
    State(state): State<AppState>,
    payload: Result<Json<ReaderPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ReaderResponse>), AppError> {
    let draft = NewReader::from(body(payload)?);

    let reader = state
        .with_store(move |store, gatekeeper| {
            check_reader(gatekeeper, store, &draft, None)?;
            Ok(store.create_reader(draft)?)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(reader.into())))
}

/// GET /api/readers/:id
async fn get_reader(
    _staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReaderResponse>, AppError> {
    let id: ReaderId = parse_id(&id)?;

    let reader = state
        .with_store(move |store, _| {
            store
                .get_reader(id)?
                .ok_or_else(|| AppError::NotFound(format!("Reader not found: {}", id)))
        })
        .await?;

    Ok(Json(reader.into()))
}

/// PUT /api/readers/:id - Replace a reader's name and email
async fn update_reader(
    _staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ReaderPayload>, JsonRejection>,
) -> Result<Json<ReaderResponse>, AppError> {
    let id: ReaderId = parse_id(&id)?;
    let draft = NewReader::from(body(payload)?);

    let reader = state
        .with_store(move |store, gatekeeper| {
            check_reader(gatekeeper, store, &draft, Some(id))?;
            Ok(store.update_reader(id, draft)?)
        })
        .await?;

    Ok(Json(reader.into()))
}

/// DELETE /api/readers/:id
async fn delete_reader(
    staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: ReaderId = parse_id(&id)?;

    state
        .with_store(move |store, _| Ok(store.delete_reader(id)?))
        .await?;

    tracing::info!(reader_id = %id, staff = staff.username(), "Reader deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/readers/:id/borrowed - Books the reader currently holds
async fn reader_borrowed_books(
    _staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    let id: ReaderId = parse_id(&id)?;

    let books = state
        .with_store(move |store, _| Ok(store.active_books_for_reader(id)?))
        .await?;

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// POST /api/loans - Lend a copy
async fn borrow_book(
    staff: StaffSession,
    State(state): State<AppState>,
    payload: Result<Json<BorrowRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoanResponse>), AppError> {
    let request = body(payload)?;
    let book_id: BookId = parse_id(&request.book)?;
    let reader_id: ReaderId = parse_id(&request.reader)?;

    let loan = state
        .with_store(move |store, _| Ok(store.borrow(book_id, reader_id)?))
        .await?;

    tracing::debug!(loan_id = %loan.id, staff = staff.username(), "Loan recorded");
    Ok((StatusCode::CREATED, Json(loan.into())))
}

/// GET /api/loans - Loan history with optional filters
async fn list_loans(
    _staff: StaffSession,
    State(state): State<AppState>,
    params: Result<Query<LoanListParams>, QueryRejection>,
) -> Result<Json<Vec<LoanResponse>>, AppError> {
    let Query(params) = params.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let query = LoanQuery::try_from(params)?;

    let loans = state
        .with_store(move |store, _| Ok(store.query_loans(&query)?))
        .await?;

    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

/// GET /api/loans/:id
async fn get_loan(
    _staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoanResponse>, AppError> {
    let id: LoanId = parse_id(&id)?;

    let loan = state
        .with_store(move |store, _| {
            store
                .get_loan(id)?
                .ok_or_else(|| AppError::NotFound(format!("Loan not found: {}", id)))
        })
        .await?;

    Ok(Json(loan.into()))
}

/// POST /api/loans/:id/return - Bring a copy back
async fn return_book(
    staff: StaffSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoanResponse>, AppError> {
    let id: LoanId = parse_id(&id)?;

    let loan = state
        .with_store(move |store, _| Ok(store.return_loan(id)?))
        .await?;

    tracing::debug!(loan_id = %loan.id, staff = staff.username(), "Return recorded");
    Ok(Json(loan.into()))
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/api/token", post(issue_token))
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/api/readers", get(list_readers).post(create_reader))
        .route(
            "/api/readers/:id",
            get(get_reader).put(update_reader).delete(delete_reader),
        )
        .route("/api/readers/:id/borrowed", get(reader_borrowed_books))
        .route("/api/loans", get(list_loans).post(borrow_book))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/return", post(return_book))
        .with_state(state)
}
