use crate::item::ItemError;
use crate::web::form::{BookForm, BookTitleForm};
use crate::web::session::{Flash, Session};
use crate::web::view::{BookFormPage, BooksByDatePage, BooksPage, Page};
use crate::web::{Context, Outcome};
use chrono::NaiveDate;
use tracing::{debug, warn};

pub const LIST_PATH: &str = "/books";
pub const ADD_PATH: &str = "/books/add";

/// 모든 도서 목록
pub fn list(ctx: &Context, session: &mut Session) -> Result<Outcome, ItemError> {
    let books = ctx.books.get_all_books()?;
    let publishing_dates = ctx.publishing_dates.get_all_publishing_dates()?;
    debug!(count = books.len(), "listing books");

    Ok(Outcome::Render(Page::Books(BooksPage {
        books,
        publishing_dates,
        flash: session.take_flash(),
    })))
}

pub fn add_form(ctx: &Context, session: &mut Session) -> Result<Outcome, ItemError> {
    Ok(Outcome::Render(Page::BookForm(BookFormPage {
        publishing_dates: ctx.publishing_dates.get_all_publishing_dates()?,
        flash: session.take_flash(),
    })))
}

/// 도서를 추가한다. 입력값이 잘못되었거나 출판일을 찾을 수 없으면 추가 폼으로 돌아간다.
pub fn add(ctx: &Context, session: &mut Session, form: BookForm) -> Result<Outcome, ItemError> {
    let book = match form.to_book() {
        Ok(book) => book,
        Err(message) => {
            warn!(%message, "invalid book details");
            session.set_flash(Flash::error(format!("Invalid book details: {}", message)));
            return Ok(Outcome::redirect(ADD_PATH));
        }
    };

    if let Some(id) = book.publishing_date_id() {
        if ctx.publishing_dates.get_publishing_date_by_id(id)?.is_none() {
            session.set_flash(Flash::error(format!("Invalid publishing date ID: {}", id)));
            return Ok(Outcome::redirect(ADD_PATH));
        }
    }

    ctx.books.save_book(&book)?;
    session.set_flash(Flash::message("Book added successfully!"));
    Ok(Outcome::redirect(LIST_PATH))
}

pub fn update_title(ctx: &Context, session: &mut Session, form: BookTitleForm) -> Result<Outcome, ItemError> {
    let Some(title) = form.title() else {
        session.set_flash(Flash::error("Book title cannot be empty."));
        return Ok(Outcome::redirect(LIST_PATH));
    };

    let result = form.book_id()
        .map_err(ItemError::InvalidArgument)
        .and_then(|id| ctx.books.update_book_title(id, title));

    match result {
        Ok(()) => session.set_flash(Flash::message("Book title updated successfully!")),
        Err(ItemError::Repository(e)) => return Err(ItemError::Repository(e)),
        Err(e) => {
            warn!(error = %e, "failed to update book title");
            session.set_flash(Flash::error(format!("Failed to update book title: {}", e)));
        }
    }

    Ok(Outcome::redirect(LIST_PATH))
}

pub fn books_by_date(ctx: &Context, date: NaiveDate) -> Result<Outcome, ItemError> {
    let books = ctx.publishing_dates.get_books_by_publishing_date(&date)?;

    Ok(Outcome::Render(Page::BooksByDate(BooksByDatePage {
        selected_date: date,
        books,
    })))
}
