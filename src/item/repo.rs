use crate::item::repo::diesel::{BookEntity, BookStore, PublishingDateStore};
use crate::item::{Book, BookRepository, PublishingDate, PublishingDateRepository, Reassignment, RepositoryError};
use chrono::NaiveDate;

mod diesel;

pub use self::diesel::DbPool;

pub struct DieselBookRepository {
    store: BookStore,
}

impl DieselBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            store: BookStore::new(pool),
        }
    }
}

impl BookRepository for DieselBookRepository {
    fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        self.store.find_all().map(to_domain_books)
    }

    fn find_by_id(&self, id: u64) -> Result<Option<Book>, RepositoryError> {
        self.store
            .find_by_id(id as i64)
            .map(|entity| entity.map(BookEntity::to_domain))
    }

    fn find_by_publishing_date_id(&self, publishing_date_id: u64) -> Result<Vec<Book>, RepositoryError> {
        self.store
            .find_by_publishing_date_id(publishing_date_id as i64)
            .map(to_domain_books)
    }

    fn find_by_publishing_date(&self, date: &NaiveDate) -> Result<Vec<Book>, RepositoryError> {
        self.store.find_by_publishing_date(date).map(to_domain_books)
    }

    fn save_book(&self, book: &Book) -> Result<Book, RepositoryError> {
        self.store.save_book(book).map(BookEntity::to_domain)
    }

    fn update_title(&self, id: u64, title: &str) -> Result<usize, RepositoryError> {
        self.store.update_title(id as i64, title)
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        self.store.count().map(|count| count as u64)
    }
}

pub struct DieselPublishingDateRepository {
    store: PublishingDateStore,
}

impl DieselPublishingDateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            store: PublishingDateStore::new(pool),
        }
    }
}

impl PublishingDateRepository for DieselPublishingDateRepository {
    fn find_all(&self) -> Result<Vec<PublishingDate>, RepositoryError> {
        self.store.find_all().map(|entities| {
            entities.into_iter()
                .map(|entity| entity.to_domain())
                .collect()
        })
    }

    fn find_by_id(&self, id: u64) -> Result<Option<PublishingDate>, RepositoryError> {
        self.store
            .find_by_id(id as i64)
            .map(|entity| entity.map(|e| e.to_domain()))
    }

    fn find_by_date(&self, date: &NaiveDate) -> Result<Option<PublishingDate>, RepositoryError> {
        self.store
            .find_by_date(date)
            .map(|entity| entity.map(|e| e.to_domain()))
    }

    fn exists_by_id(&self, id: u64) -> Result<bool, RepositoryError> {
        self.store.exists_by_id(id as i64)
    }

    fn save_with_books(&self, date: NaiveDate, book_ids: &[u64]) -> Result<Reassignment, RepositoryError> {
        let (saved, attached) = self.store.save_with_books(date, &to_entity_ids(book_ids))?;

        Ok(Reassignment {
            publishing_date: saved.to_domain(),
            detached: 0,
            attached,
        })
    }

    fn update_with_books(&self, publishing_date: &PublishingDate, book_ids: &[u64]) -> Result<Option<Reassignment>, RepositoryError> {
        let updated = self.store.update_with_books(
            publishing_date.id() as i64,
            publishing_date.date(),
            &to_entity_ids(book_ids)
        )?;

        Ok(updated.map(|(entity, detached, attached)| Reassignment {
            publishing_date: entity.to_domain(),
            detached,
            attached,
        }))
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        self.store.count().map(|count| count as u64)
    }
}

fn to_domain_books(entities: Vec<BookEntity>) -> Vec<Book> {
    entities.into_iter()
        .map(BookEntity::to_domain)
        .collect()
}

fn to_entity_ids(ids: &[u64]) -> Vec<i64> {
    ids.iter().map(|id| *id as i64).collect()
}
