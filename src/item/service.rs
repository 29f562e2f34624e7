use crate::item::{
    validate_title, Book, BookRepository, ItemError, PublishingDate, PublishingDateDetail,
    PublishingDateRepository, RepositoryError,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::{info, warn};

pub struct BookService<R>
where
    R: BookRepository
{
    repository: R,
}

impl<R: BookRepository> BookService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn get_all_books(&self) -> Result<Vec<Book>, ItemError> {
        Ok(self.repository.find_all()?)
    }

    #[cfg(test)]
    pub fn get_book_by_id(&self, id: u64) -> Result<Option<Book>, ItemError> {
        Ok(self.repository.find_by_id(id)?)
    }

    pub fn save_book(&self, book: &Book) -> Result<Book, ItemError> {
        let saved = self.repository.save_book(book)?;
        info!(book_id = saved.id(), title = saved.title(), "book saved");
        Ok(saved)
    }

    /// 도서 제목을 변경한다. 제목은 도서를 만들 때와 같은 규칙으로 검사하며,
    /// 존재하지 않는 도서라면 [`ItemError::NotFound`]를 반환한다.
    pub fn update_book_title(&self, id: u64, title: &str) -> Result<(), ItemError> {
        let title = validate_title(title)?;

        let updated_count = self.repository.update_title(id, &title)?;
        if updated_count == 0 {
            return Err(ItemError::NotFound(format!("Book with ID {} does not exist.", id)));
        }

        info!(book_id = id, title = %title, "book title updated");
        Ok(())
    }
}

/// 출판일과 도서 사이의 연결을 관리한다.
///
/// 도서는 출판일 아이디 하나만 참조하고, 출판일에 속한 도서 목록은 항상 조회로 만들어진다.
/// 연결 변경은 저장소의 트랜잭션 안에서 한 번에 처리되기 때문에 한쪽만 반영되는 일은 없다.
pub struct PublishingDateService<P, B>
where
    P: PublishingDateRepository,
    B: BookRepository
{
    publishing_dates: P,
    books: B,
}

impl<P, B> PublishingDateService<P, B>
where
    P: PublishingDateRepository,
    B: BookRepository
{
    pub fn new(publishing_dates: P, books: B) -> Self {
        Self { publishing_dates, books }
    }

    pub fn get_all_publishing_dates(&self) -> Result<Vec<PublishingDate>, ItemError> {
        Ok(self.publishing_dates.find_all()?)
    }

    /// 출판일과 해당 출판일을 참조하는 도서들을 함께 가져온다.
    pub fn get_publishing_date_by_id(&self, id: u64) -> Result<Option<PublishingDateDetail>, ItemError> {
        match self.publishing_dates.find_by_id(id)? {
            Some(publishing_date) => Ok(Some(self.with_books(publishing_date)?)),
            None => Ok(None),
        }
    }

    pub fn find_by_date(&self, date: &NaiveDate) -> Result<Option<PublishingDate>, ItemError> {
        Ok(self.publishing_dates.find_by_date(date)?)
    }

    /// 전달 받은 날짜의 출판일에 속한 도서들을 가져온다. 출판일이 없으면 빈 목록을 반환한다.
    pub fn get_books_by_publishing_date(&self, date: &NaiveDate) -> Result<Vec<Book>, ItemError> {
        Ok(self.books.find_by_publishing_date(date)?)
    }

    /// 새 출판일을 만들고 전달 받은 도서들이 새 출판일을 참조하도록 한다.
    pub fn create(&self, date: NaiveDate, book_ids: &[u64]) -> Result<PublishingDateDetail, ItemError> {
        let book_ids = distinct(book_ids);
        let reassignment = self.publishing_dates
            .save_with_books(date, &book_ids)
            .map_err(|e| duplicate_or(e, date))?;

        report_missing_books(&reassignment.publishing_date, book_ids.len(), reassignment.attached);
        info!(
            publishing_date_id = reassignment.publishing_date.id(),
            date = %reassignment.publishing_date,
            attached = reassignment.attached,
            "publishing date created"
        );

        self.with_books(reassignment.publishing_date)
    }

    /// 기존 출판일의 날짜와 도서 목록을 교체한다.
    ///
    /// 새 목록에서 빠진 도서들은 삭제되지 않고 출판일 참조만 해제된다.
    pub fn update(&self, publishing_date: &PublishingDate, book_ids: &[u64]) -> Result<PublishingDateDetail, ItemError> {
        if !self.publishing_dates.exists_by_id(publishing_date.id())? {
            return Err(not_found(publishing_date.id()));
        }

        let book_ids = distinct(book_ids);
        let reassignment = self.publishing_dates
            .update_with_books(publishing_date, &book_ids)
            .map_err(|e| duplicate_or(e, publishing_date.date()))?
            .ok_or_else(|| not_found(publishing_date.id()))?;

        report_missing_books(&reassignment.publishing_date, book_ids.len(), reassignment.attached);
        info!(
            publishing_date_id = reassignment.publishing_date.id(),
            date = %reassignment.publishing_date,
            detached = reassignment.detached,
            attached = reassignment.attached,
            "publishing date updated"
        );

        self.with_books(reassignment.publishing_date)
    }

    fn with_books(&self, publishing_date: PublishingDate) -> Result<PublishingDateDetail, ItemError> {
        let books = self.books.find_by_publishing_date_id(publishing_date.id())?;
        Ok(PublishingDateDetail::new(publishing_date, books))
    }
}

fn distinct(ids: &[u64]) -> Vec<u64> {
    ids.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn not_found(id: u64) -> ItemError {
    ItemError::NotFound(format!("Publishing date with ID {} does not exist.", id))
}

fn duplicate_or(err: RepositoryError, date: NaiveDate) -> ItemError {
    match err {
        RepositoryError::UniqueViolation(_) => ItemError::DuplicateDate(date),
        err => ItemError::Repository(err),
    }
}

fn report_missing_books(publishing_date: &PublishingDate, requested: usize, attached: usize) {
    if attached < requested {
        warn!(
            publishing_date_id = publishing_date.id(),
            requested,
            attached,
            "some requested books do not exist and were ignored"
        );
    }
}
