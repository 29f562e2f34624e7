use crate::item::{Book, PublishingDate, RepositoryError};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::DatabaseErrorKind;
use diesel::sqlite::Sqlite;
use diesel::{debug_query, SqliteConnection};
use r2d2::Pool;
use tracing::{debug, enabled};

mod schema;

use schema::{book, publishing_date};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RepositoryError::UniqueViolation(info.message().to_owned())
            }
            err => RepositoryError::SqlExecuteError(err.to_string()),
        }
    }
}

fn get_connection(pool: &DbPool) -> Result<DbConnection, RepositoryError> {
    pool.get().map_err(|e| RepositoryError::ConnectError(e.to_string()))
}

pub fn sql_debugging<T>(sql: T) -> T
where T: QueryFragment<Sqlite>,
{
    if enabled!(tracing::Level::DEBUG) {
        let debug_str = debug_query::<Sqlite, _>(&sql).to_string();
        debug!("SQL: {}", debug_str);
    }
    sql
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = book)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BookEntity {
    pub id: i64,
    pub title: String,
    pub genre: Option<String>,
    pub publishing_date_id: Option<i64>,
}

impl BookEntity {
    pub fn to_domain(self) -> Book {
        Book {
            id: self.id as u64,
            title: self.title,
            genre: self.genre,
            publishing_date_id: self.publishing_date_id.map(|id| id as u64),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = book)]
pub struct NewBook<'a> {
    pub title: &'a str,
    pub genre: Option<&'a str>,
    pub publishing_date_id: Option<i64>,
}

impl<'a> NewBook<'a> {
    pub fn from(book: &'a Book) -> Self {
        Self {
            title: book.title(),
            genre: book.genre(),
            publishing_date_id: book.publishing_date_id().map(|id| id as i64),
        }
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = publishing_date)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PublishingDateEntity {
    pub id: i64,
    pub date: NaiveDate,
}

impl PublishingDateEntity {
    pub fn to_domain(self) -> PublishingDate {
        PublishingDate::new(self.id as u64, self.date)
    }
}

#[derive(Insertable)]
#[diesel(table_name = publishing_date)]
pub struct NewPublishingDate {
    pub date: NaiveDate,
}

pub struct BookStore {
    pool: DbPool
}

impl BookStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BookStore {

    pub fn find_all(&self) -> Result<Vec<BookEntity>, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let results = sql_debugging(book::table
            .order_by(book::id.asc())
            .select(BookEntity::as_select()))
            .load(&mut connection)?;

        Ok(results)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<BookEntity>, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let result = sql_debugging(book::table
            .find(id)
            .select(BookEntity::as_select()))
            .first(&mut connection)
            .optional()?;

        Ok(result)
    }

    pub fn find_by_publishing_date_id(&self, publishing_date_id: i64) -> Result<Vec<BookEntity>, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let results = sql_debugging(book::table
            .filter(book::publishing_date_id.eq(publishing_date_id))
            .order_by(book::id.asc())
            .select(BookEntity::as_select()))
            .load(&mut connection)?;

        Ok(results)
    }

    pub fn find_by_publishing_date(&self, date: &NaiveDate) -> Result<Vec<BookEntity>, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let results = sql_debugging(book::table
            .inner_join(publishing_date::table)
            .filter(publishing_date::date.eq(*date))
            .order_by(book::id.asc())
            .select(BookEntity::as_select()))
            .load(&mut connection)?;

        Ok(results)
    }

    pub fn save_book(&self, book: &Book) -> Result<BookEntity, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let result = sql_debugging(diesel::insert_into(book::table)
            .values(NewBook::from(book))
            .returning(BookEntity::as_returning()))
            .get_result(&mut connection)?;

        Ok(result)
    }

    pub fn update_title(&self, id: i64, title: &str) -> Result<usize, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let updated_count = sql_debugging(diesel::update(book::table.find(id))
            .set(book::title.eq(title)))
            .execute(&mut connection)?;

        Ok(updated_count)
    }

    pub fn count(&self) -> Result<i64, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let count = book::table
            .count()
            .get_result(&mut connection)?;

        Ok(count)
    }
}

pub struct PublishingDateStore {
    pool: DbPool
}

impl PublishingDateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl PublishingDateStore {

    pub fn find_all(&self) -> Result<Vec<PublishingDateEntity>, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let results = sql_debugging(publishing_date::table
            .order_by(publishing_date::date.asc())
            .select(PublishingDateEntity::as_select()))
            .load(&mut connection)?;

        Ok(results)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<PublishingDateEntity>, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let result = sql_debugging(publishing_date::table
            .find(id)
            .select(PublishingDateEntity::as_select()))
            .first(&mut connection)
            .optional()?;

        Ok(result)
    }

    pub fn find_by_date(&self, date: &NaiveDate) -> Result<Option<PublishingDateEntity>, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let result = sql_debugging(publishing_date::table
            .filter(publishing_date::date.eq(*date))
            .select(PublishingDateEntity::as_select()))
            .first(&mut connection)
            .optional()?;

        Ok(result)
    }

    pub fn exists_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let exists = diesel::select(diesel::dsl::exists(publishing_date::table.find(id)))
            .get_result(&mut connection)?;

        Ok(exists)
    }

    /// 출판일 저장과 도서 연결을 하나의 트랜잭션으로 처리한다.
    pub fn save_with_books(&self, date: NaiveDate, book_ids: &[i64]) -> Result<(PublishingDateEntity, usize), RepositoryError> {
        let mut pooled = get_connection(&self.pool)?;
        let connection: &mut SqliteConnection = &mut pooled;
        connection.transaction::<_, RepositoryError, _>(|conn| {
            let saved: PublishingDateEntity = sql_debugging(diesel::insert_into(publishing_date::table)
                .values(NewPublishingDate { date })
                .returning(PublishingDateEntity::as_returning()))
                .get_result(conn)?;

            let attached = attach_books(conn, saved.id, book_ids)?;
            Ok((saved, attached))
        })
    }

    /// 날짜 변경, 기존 도서 연결 해제, 새 도서 연결을 하나의 트랜잭션으로 처리한다.
    /// 출판일이 존재하지 않으면 아무것도 변경하지 않고 `None`을 반환한다.
    pub fn update_with_books(&self, id: i64, date: NaiveDate, book_ids: &[i64]) -> Result<Option<(PublishingDateEntity, usize, usize)>, RepositoryError> {
        let mut pooled = get_connection(&self.pool)?;
        let connection: &mut SqliteConnection = &mut pooled;
        connection.transaction::<_, RepositoryError, _>(|conn| {
            let exists: bool = diesel::select(diesel::dsl::exists(publishing_date::table.find(id)))
                .get_result(conn)?;
            if !exists {
                return Ok(None);
            }

            let detached = sql_debugging(diesel::update(book::table.filter(book::publishing_date_id.eq(id)))
                .set(book::publishing_date_id.eq(None::<i64>)))
                .execute(conn)?;

            let attached = attach_books(conn, id, book_ids)?;

            // 날짜 중복은 이 시점에 발견되며 앞선 도서 변경도 함께 롤백 된다.
            sql_debugging(diesel::update(publishing_date::table.find(id))
                .set(publishing_date::date.eq(date)))
                .execute(conn)?;

            Ok(Some((PublishingDateEntity { id, date }, detached, attached)))
        })
    }

    pub fn count(&self) -> Result<i64, RepositoryError> {
        let mut connection = get_connection(&self.pool)?;
        let count = publishing_date::table
            .count()
            .get_result(&mut connection)?;

        Ok(count)
    }
}

fn attach_books(conn: &mut SqliteConnection, publishing_date_id: i64, book_ids: &[i64]) -> Result<usize, RepositoryError> {
    if book_ids.is_empty() {
        return Ok(0);
    }

    let attached = sql_debugging(diesel::update(book::table.filter(book::id.eq_any(book_ids.to_vec())))
        .set(book::publishing_date_id.eq(Some(publishing_date_id))))
        .execute(conn)?;

    Ok(attached)
}
