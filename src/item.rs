pub mod repo;
pub mod service;

use chrono::NaiveDate;
use std::fmt;
use std::fmt::{Display, Formatter};

/// 도서 제목 최대 길이 (`book.title` 컬럼 크기)
pub const TITLE_MAX_LENGTH: usize = 256;

/// Item 모듈에서 사용할 에러 열거
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    /// 필수 데이터가 입력 되지 않음
    #[error("{0}")]
    RequireArgumentMissing(String),

    /// 형식이 잘못된 데이터
    #[error("{0}")]
    InvalidArgument(String),

    /// 요청한 데이터가 저장소에 존재하지 않음
    #[error("{0}")]
    NotFound(String),

    /// 이미 같은 날짜의 출판일이 존재함
    #[error("publishing date {0} already exists")]
    DuplicateDate(NaiveDate),

    /// 저장소 접근 실패
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 저장소 구현체에서 발생하는 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("failed to get connection: {0}")]
    ConnectError(String),

    #[error("failed to execute sql: {0}")]
    SqlExecuteError(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
}

/// 출판일
///
/// 같은 날짜를 가지는 출판일은 하나만 존재할 수 있다. 출판일에 속한 도서 목록은 따로 저장하지 않고
/// [`BookRepository::find_by_publishing_date_id`]로 조회한다.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PublishingDate {
    id: u64,
    date: NaiveDate,
}

impl PublishingDate {
    pub fn new(id: u64, date: NaiveDate) -> Self {
        Self { id, date }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Display for PublishingDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

/// 출판일과 해당 출판일을 참조하는 도서들
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PublishingDateDetail {
    publishing_date: PublishingDate,
    books: Vec<Book>,
}

impl PublishingDateDetail {
    pub fn new(publishing_date: PublishingDate, books: Vec<Book>) -> Self {
        Self { publishing_date, books }
    }

    pub fn publishing_date(&self) -> &PublishingDate {
        &self.publishing_date
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn book_ids(&self) -> Vec<u64> {
        self.books.iter().map(|b| b.id()).collect()
    }
}

/// 출판일 변경 결과
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Reassignment {
    pub publishing_date: PublishingDate,

    /// 기존 출판일에서 연결이 해제된 도서 수
    pub detached: usize,

    /// 새로 연결된 도서 수
    pub attached: usize,
}

/// 도서
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Book {
    id: u64,
    title: String,
    genre: Option<String>,
    publishing_date_id: Option<u64>,
}

impl Book {
    pub fn builder() -> BookBuilder {
        BookBuilder::new()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }

    pub fn publishing_date_id(&self) -> Option<u64> {
        self.publishing_date_id
    }
}

/// Book 빌더
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BookBuilder {
    id: Option<u64>,
    title: Option<String>,
    genre: Option<String>,
    publishing_date_id: Option<u64>,
}

impl BookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn genre(mut self, genre: String) -> Self {
        self.genre = Some(genre);
        self
    }

    pub fn publishing_date_id(mut self, publishing_date_id: u64) -> Self {
        self.publishing_date_id = Some(publishing_date_id);
        self
    }

    /// 제목은 [`validate_title`]을 통과해야 하며, 장르는 비어있을 경우 `None`으로 저장된다.
    pub fn build(self) -> Result<Book, ItemError> {
        let title = validate_title(self.title.as_deref().unwrap_or_default())?;

        let genre = self.genre
            .map(|g| g.trim().to_owned())
            .filter(|g| !g.is_empty());

        Ok(Book {
            id: self.id.unwrap_or(0),
            title,
            genre,
            publishing_date_id: self.publishing_date_id,
        })
    }
}

/// 앞뒤 공백을 제거한 도서 제목을 반환한다. 비어있거나 [`TITLE_MAX_LENGTH`]보다 길면 에러를 반환한다.
pub fn validate_title(title: &str) -> Result<String, ItemError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ItemError::RequireArgumentMissing("title must not be blank".to_owned()));
    }

    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(ItemError::InvalidArgument(
            format!("title must be at most {} characters", TITLE_MAX_LENGTH)
        ));
    }

    Ok(title.to_owned())
}

/// 도서 저장소
pub trait BookRepository {

    /// 모든 도서를 아이디 순으로 가져온다.
    fn find_all(&self) -> Result<Vec<Book>, RepositoryError>;

    /// 전달 받은 아이디로 도서를 찾는다.
    fn find_by_id(&self, id: u64) -> Result<Option<Book>, RepositoryError>;

    /// 전달 받은 출판일 아이디를 참조하는 도서를 찾는다.
    fn find_by_publishing_date_id(&self, publishing_date_id: u64) -> Result<Vec<Book>, RepositoryError>;

    /// 전달 받은 날짜의 출판일을 참조하는 도서를 찾는다.
    fn find_by_publishing_date(&self, date: &NaiveDate) -> Result<Vec<Book>, RepositoryError>;

    /// 새 도서를 저장하고 아이디가 할당된 도서를 반환한다.
    fn save_book(&self, book: &Book) -> Result<Book, RepositoryError>;

    /// 도서 제목을 변경하고 변경된 행의 수를 반환한다.
    fn update_title(&self, id: u64, title: &str) -> Result<usize, RepositoryError>;

    fn count(&self) -> Result<u64, RepositoryError>;
}

/// 출판일 저장소
///
/// 도서와의 연결을 바꾸는 `save_with_books`, `update_with_books`는 출판일과 도서 양쪽의 변경을
/// 하나의 트랜잭션으로 처리해야 한다.
pub trait PublishingDateRepository {

    /// 모든 출판일을 날짜 순으로 가져온다.
    fn find_all(&self) -> Result<Vec<PublishingDate>, RepositoryError>;

    fn find_by_id(&self, id: u64) -> Result<Option<PublishingDate>, RepositoryError>;

    fn find_by_date(&self, date: &NaiveDate) -> Result<Option<PublishingDate>, RepositoryError>;

    fn exists_by_id(&self, id: u64) -> Result<bool, RepositoryError>;

    /// 새 출판일을 저장하고 전달 받은 도서들이 새 출판일을 참조하도록 변경한다.
    fn save_with_books(&self, date: NaiveDate, book_ids: &[u64]) -> Result<Reassignment, RepositoryError>;

    /// 출판일의 날짜를 바꾸고 기존 도서들의 연결을 끊은 뒤 전달 받은 도서들을 연결한다.
    /// 출판일이 존재하지 않으면 `None`을 반환한다.
    fn update_with_books(&self, publishing_date: &PublishingDate, book_ids: &[u64]) -> Result<Option<Reassignment>, RepositoryError>;

    fn count(&self) -> Result<u64, RepositoryError>;
}
