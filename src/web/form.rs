use crate::item::{Book, PublishingDateDetail};
use chrono::NaiveDate;
use serde::Deserialize;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 도서 추가 폼
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    pub title: Option<String>,
    pub genre: Option<String>,
    #[serde(rename = "publishingDateId")]
    pub publishing_date_id: Option<String>,
}

impl BookForm {
    pub fn to_book(&self) -> Result<Book, String> {
        let mut builder = Book::builder();

        if let Some(title) = &self.title {
            builder = builder.title(title.clone());
        }

        if let Some(genre) = &self.genre {
            builder = builder.genre(genre.clone());
        }

        if let Some(id) = parse_id(self.publishing_date_id.as_deref(), "publishingDateId")? {
            builder = builder.publishing_date_id(id);
        }

        builder.build().map_err(|e| e.to_string())
    }
}

/// 도서 제목 변경 폼
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookTitleForm {
    #[serde(rename = "bookId")]
    pub book_id: Option<String>,
    #[serde(rename = "newTitle")]
    pub new_title: Option<String>,
}

impl BookTitleForm {
    pub fn book_id(&self) -> Result<u64, String> {
        parse_id(self.book_id.as_deref(), "bookId")?
            .ok_or_else(|| "bookId is required".to_owned())
    }

    /// 앞뒤 공백을 제거한 제목, 비어있으면 `None`
    pub fn title(&self) -> Option<&str> {
        self.new_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// 출판일 추가/수정 폼
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
pub struct PublishingDateForm {
    pub id: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "bookIds", default)]
    pub book_ids: Vec<u64>,
}

impl PublishingDateForm {
    pub fn id(&self) -> Result<Option<u64>, String> {
        parse_id(self.id.as_deref(), "id")
    }

    pub fn date(&self) -> Result<NaiveDate, String> {
        let raw = self.date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| "date is required".to_owned())?;

        parse_date(raw)
    }
}

impl From<&PublishingDateDetail> for PublishingDateForm {
    fn from(detail: &PublishingDateDetail) -> Self {
        let publishing_date = detail.publishing_date();
        Self {
            id: Some(publishing_date.id().to_string()),
            date: Some(publishing_date.date().format(DATE_FORMAT).to_string()),
            book_ids: detail.book_ids(),
        }
    }
}

/// `date=YYYY-MM-DD` 쿼리
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| format!("'{}' is not a valid date (expected YYYY-MM-DD)", raw))
}

/// 빈 값은 `None`으로 처리하고 숫자가 아닌 값은 에러로 처리한다.
fn parse_id(raw: Option<&str>, field: &str) -> Result<Option<u64>, String> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse::<u64>()
            .map(Some)
            .map_err(|_| format!("{} must be a number, got '{}'", field, v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::PublishingDate;

    #[test]
    fn book_form_builds_book() {
        let form = BookForm {
            title: Some("Dune".to_owned()),
            genre: Some("Sci-Fi".to_owned()),
            publishing_date_id: Some("4".to_owned()),
        };

        let book = form.to_book().unwrap();
        assert_eq!(book.title(), "Dune");
        assert_eq!(book.genre(), Some("Sci-Fi"));
        assert_eq!(book.publishing_date_id(), Some(4));
    }

    #[test]
    fn book_form_treats_empty_publishing_date_as_none() {
        let form = BookForm {
            title: Some("Dune".to_owned()),
            genre: None,
            publishing_date_id: Some("".to_owned()),
        };

        assert_eq!(form.to_book().unwrap().publishing_date_id(), None);
    }

    #[test]
    fn book_form_rejects_blank_title_and_bad_id() {
        let blank = BookForm { title: Some(" ".to_owned()), ..Default::default() };
        assert_eq!(blank.to_book().unwrap_err(), "title must not be blank");

        let bad_id = BookForm {
            title: Some("Dune".to_owned()),
            publishing_date_id: Some("abc".to_owned()),
            ..Default::default()
        };
        assert_eq!(bad_id.to_book().unwrap_err(), "publishingDateId must be a number, got 'abc'");
    }

    #[test]
    fn title_form_trims_title() {
        let form = BookTitleForm { book_id: Some("1".to_owned()), new_title: Some("  New  ".to_owned()) };
        assert_eq!(form.book_id(), Ok(1));
        assert_eq!(form.title(), Some("New"));

        let blank = BookTitleForm { book_id: None, new_title: Some("   ".to_owned()) };
        assert_eq!(blank.title(), None);
        assert!(blank.book_id().is_err());
    }

    #[test]
    fn publishing_date_form_parses_fields() {
        let form = PublishingDateForm {
            id: Some("".to_owned()),
            date: Some("2023-01-01".to_owned()),
            book_ids: vec![1, 2],
        };

        assert_eq!(form.id(), Ok(None));
        assert_eq!(form.date(), Ok(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()));
    }

    #[test]
    fn publishing_date_form_rejects_missing_or_malformed_date() {
        let missing = PublishingDateForm::default();
        assert_eq!(missing.date(), Err("date is required".to_owned()));

        let malformed = PublishingDateForm { date: Some("2023-13-01".to_owned()), ..Default::default() };
        assert_eq!(
            malformed.date(),
            Err("'2023-13-01' is not a valid date (expected YYYY-MM-DD)".to_owned())
        );
    }

    #[test]
    fn form_from_detail_prefills_fields() {
        let date = PublishingDate::new(7, NaiveDate::from_ymd_opt(2005, 5, 5).unwrap());
        let book = Book::builder().id(2).title("Two".to_owned()).publishing_date_id(7).build().unwrap();
        let detail = PublishingDateDetail::new(date, vec![book]);

        let form = PublishingDateForm::from(&detail);

        assert_eq!(form.id.as_deref(), Some("7"));
        assert_eq!(form.date.as_deref(), Some("2005-05-05"));
        assert_eq!(form.book_ids, vec![2]);
    }
}
