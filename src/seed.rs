use crate::item::{Book, BookRepository, ItemError, PublishingDate, PublishingDateRepository};
use chrono::NaiveDate;
use tracing::info;

const SAMPLE_SIZE: u32 = 10;

/// 도서와 출판일 테이블이 모두 비어있을 때 샘플 데이터를 넣는다.
///
/// 출판일 10개와 각 출판일 중 하나를 참조하는 도서 10개를 만든다. 이미 데이터가 있다면 아무것도 하지 않고
/// `false`를 반환한다.
pub fn load_sample_data<B, P>(books: &B, publishing_dates: &P) -> Result<bool, ItemError>
where
    B: BookRepository,
    P: PublishingDateRepository,
{
    let book_count = books.count()?;
    let publishing_date_count = publishing_dates.count()?;
    if book_count > 0 || publishing_date_count > 0 {
        info!(book_count, publishing_date_count, "sample data skipped, tables are not empty");
        return Ok(false);
    }

    let mut dates: Vec<PublishingDate> = Vec::with_capacity(SAMPLE_SIZE as usize);
    for i in 1..=SAMPLE_SIZE {
        let date = sample_date(i)?;
        dates.push(publishing_dates.save_with_books(date, &[])?.publishing_date);
    }

    for i in 1..=SAMPLE_SIZE {
        let publishing_date = &dates[(i % SAMPLE_SIZE) as usize];
        let book = Book::builder()
            .title(format!("Book {}", i))
            .genre(format!("Genre {}", i))
            .publishing_date_id(publishing_date.id())
            .build()?;
        books.save_book(&book)?;
    }

    info!(books = SAMPLE_SIZE, publishing_dates = dates.len(), "sample data loaded");
    Ok(true)
}

fn sample_date(i: u32) -> Result<NaiveDate, ItemError> {
    let year = 2018 + (i % 5) as i32;
    let month = i % 12 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ItemError::InvalidArgument(format!("invalid sample date {}-{}-01", year, month)))
}
