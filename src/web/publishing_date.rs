use crate::item::{ItemError, PublishingDate};
use crate::web::form::PublishingDateForm;
use crate::web::session::{Flash, Session};
use crate::web::view::{Page, PublishingDatesPage};
use crate::web::{Context, Outcome};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

pub const LIST_PATH: &str = "/publishingDates";

const DUPLICATE_DATE: &str = "Error: Duplicate or invalid date.";

/// 출판일 목록 화면
///
/// 세션에 편집 중인 출판일이 남아있다면 다시 조회해서 편집 폼을 채운다.
/// 그 사이 출판일을 찾을 수 없게 되었다면 편집 상태를 해제하고 빈 폼을 보여준다.
pub fn list(ctx: &Context, session: &mut Session) -> Result<Outcome, ItemError> {
    let Some(id) = session.edit_state().editing_id() else {
        return render(ctx, session, PublishingDateForm::default(), false, None);
    };

    match ctx.publishing_dates.get_publishing_date_by_id(id)? {
        Some(detail) => render(ctx, session, PublishingDateForm::from(&detail), true, None),
        None => {
            debug!(publishing_date_id = id, "publishing date under edit no longer exists");
            session.stop_editing();
            render(ctx, session, PublishingDateForm::default(), false, None)
        }
    }
}

pub fn edit(ctx: &Context, session: &mut Session, id: u64) -> Result<Outcome, ItemError> {
    let Some(detail) = ctx.publishing_dates.get_publishing_date_by_id(id)? else {
        warn!(publishing_date_id = id, "edit requested for unknown publishing date");
        session.stop_editing();
        session.set_flash(Flash::error(format!("Invalid publishing date ID: {}", id)));
        return Ok(Outcome::redirect(LIST_PATH));
    };

    session.start_editing(id);
    render(ctx, session, PublishingDateForm::from(&detail), true, None)
}

pub fn add(ctx: &Context, session: &mut Session, form: PublishingDateForm) -> Result<Outcome, ItemError> {
    session.stop_editing();

    let date = match form.date() {
        Ok(date) => date,
        Err(message) => {
            let error = format!("Invalid publishing date: {}", message);
            return render(ctx, session, form, false, Some(error));
        }
    };

    match ctx.publishing_dates.create(date, &form.book_ids) {
        Ok(_) => {
            session.set_flash(Flash::message("Publishing date added successfully!"));
            Ok(Outcome::redirect(LIST_PATH))
        }
        Err(ItemError::DuplicateDate(date)) => {
            info!(%date, "rejected duplicate publishing date");
            render(ctx, session, form, false, Some(DUPLICATE_DATE.to_owned()))
        }
        Err(e) => Err(e),
    }
}

/// 출판일을 수정한다.
///
/// 입력값 오류나 중복 날짜로 실패하면 편집 상태를 유지한 채로 폼을 다시 보여주고,
/// 출판일이 존재하지 않는다면 편집 상태를 해제하고 목록으로 돌아간다.
pub fn update(ctx: &Context, session: &mut Session, form: PublishingDateForm) -> Result<Outcome, ItemError> {
    let id = match form.id() {
        Ok(Some(id)) => id,
        Ok(None) => {
            let error = "Publishing date ID cannot be null.".to_owned();
            return render(ctx, session, form, true, Some(error));
        }
        Err(message) => {
            let error = format!("Invalid publishing date: {}", message);
            return render(ctx, session, form, true, Some(error));
        }
    };

    let date = match form.date() {
        Ok(date) => date,
        Err(message) => {
            session.start_editing(id);
            let error = format!("Invalid publishing date: {}", message);
            return render(ctx, session, form, true, Some(error));
        }
    };

    match ctx.publishing_dates.update(&PublishingDate::new(id, date), &form.book_ids) {
        Ok(_) => {
            session.stop_editing();
            session.set_flash(Flash::message("Publishing date updated successfully!"));
            Ok(Outcome::redirect(LIST_PATH))
        }
        Err(ItemError::NotFound(message)) => {
            warn!(publishing_date_id = id, "update requested for unknown publishing date");
            session.stop_editing();
            session.set_flash(Flash::error(message));
            Ok(Outcome::redirect(LIST_PATH))
        }
        Err(ItemError::DuplicateDate(date)) => {
            info!(publishing_date_id = id, %date, "rejected duplicate publishing date");
            session.start_editing(id);
            render(ctx, session, form, true, Some(DUPLICATE_DATE.to_owned()))
        }
        Err(e) => Err(e),
    }
}

/// 날짜로 출판일을 찾아 편집 폼을 연다. 찾지 못하면 세션은 그대로 두고 목록으로 돌아간다.
pub fn search(ctx: &Context, session: &mut Session, date: NaiveDate) -> Result<Outcome, ItemError> {
    let detail = match ctx.publishing_dates.find_by_date(&date)? {
        Some(found) => ctx.publishing_dates.get_publishing_date_by_id(found.id())?,
        None => None,
    };

    let Some(detail) = detail else {
        session.set_flash(Flash::error(format!("No publishing date found for {}", date.format("%Y-%m-%d"))));
        return Ok(Outcome::redirect(LIST_PATH));
    };

    session.start_editing(detail.publishing_date().id());
    render(ctx, session, PublishingDateForm::from(&detail), true, None)
}

fn render(
    ctx: &Context,
    session: &mut Session,
    form: PublishingDateForm,
    editing_mode: bool,
    error: Option<String>,
) -> Result<Outcome, ItemError> {
    Ok(Outcome::Render(Page::PublishingDates(PublishingDatesPage {
        publishing_dates: ctx.publishing_dates.get_all_publishing_dates()?,
        books: ctx.books.get_all_books()?,
        form,
        editing_mode,
        error,
        flash: session.take_flash(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Book;
    use crate::testing;
    use crate::web::session::EditState;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_book(ctx: &Context, title: &str) -> Book {
        let book = Book::builder().title(title.to_owned()).build().unwrap();
        ctx.books.save_book(&book).unwrap()
    }

    fn page(outcome: Outcome) -> PublishingDatesPage {
        match outcome {
            Outcome::Render(Page::PublishingDates(page)) => page,
            other => panic!("expected publishing dates page, got {:?}", other),
        }
    }

    fn redirect_to(outcome: &Outcome) -> &str {
        match outcome {
            Outcome::Redirect(to) => to,
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    fn form(id: Option<u64>, raw_date: &str, book_ids: Vec<u64>) -> PublishingDateForm {
        PublishingDateForm {
            id: id.map(|id| id.to_string()),
            date: Some(raw_date.to_owned()),
            book_ids,
        }
    }

    #[test]
    fn add_links_books_and_redirects() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let first = new_book(&ctx, "First");
        let second = new_book(&ctx, "Second");
        let mut session = Session::default();

        let outcome = add(&ctx, &mut session, form(None, "2023-01-01", vec![first.id(), second.id()])).unwrap();

        assert_eq!(redirect_to(&outcome), LIST_PATH);
        assert_eq!(session.edit_state(), EditState::Listing);
        assert_eq!(session.take_flash(), Some(Flash::message("Publishing date added successfully!")));

        let created = ctx.publishing_dates.find_by_date(&date(2023, 1, 1)).unwrap().unwrap();
        let detail = ctx.publishing_dates.get_publishing_date_by_id(created.id()).unwrap().unwrap();
        assert_eq!(detail.book_ids(), vec![first.id(), second.id()]);
    }

    #[test]
    fn add_with_invalid_date_rerenders_form() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let mut session = Session::default();
        session.start_editing(3);

        let submitted = form(None, "not-a-date", vec![]);
        let page = page(add(&ctx, &mut session, submitted.clone()).unwrap());

        assert!(!page.editing_mode);
        assert_eq!(page.form, submitted);
        assert_eq!(
            page.error.as_deref(),
            Some("Invalid publishing date: 'not-a-date' is not a valid date (expected YYYY-MM-DD)")
        );
        assert_eq!(session.edit_state(), EditState::Listing);
        assert!(ctx.publishing_dates.get_all_publishing_dates().unwrap().is_empty());
    }

    #[test]
    fn add_with_duplicate_date_rerenders_with_error() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let book = new_book(&ctx, "Lonely");
        ctx.publishing_dates.create(date(2023, 1, 1), &[]).unwrap();
        let mut session = Session::default();

        let page = page(add(&ctx, &mut session, form(None, "2023-01-01", vec![book.id()])).unwrap());

        assert_eq!(page.error.as_deref(), Some(DUPLICATE_DATE));
        assert!(!page.editing_mode);
        assert_eq!(ctx.publishing_dates.get_all_publishing_dates().unwrap().len(), 1);
        assert_eq!(ctx.books.get_book_by_id(book.id()).unwrap().unwrap().publishing_date_id(), None);
    }

    #[test]
    fn edit_known_id_enters_edit_mode() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let book = new_book(&ctx, "Member");
        let created = ctx.publishing_dates.create(date(2021, 4, 1), &[book.id()]).unwrap();
        let id = created.publishing_date().id();
        let mut session = Session::default();

        let page = page(edit(&ctx, &mut session, id).unwrap());

        assert!(page.editing_mode);
        assert_eq!(page.form.id, Some(id.to_string()));
        assert_eq!(page.form.date.as_deref(), Some("2021-04-01"));
        assert_eq!(page.form.book_ids, vec![book.id()]);
        assert_eq!(session.edit_state(), EditState::Editing(id));
    }

    #[test]
    fn edit_unknown_id_redirects_and_clears_edit_state() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let mut session = Session::default();
        session.start_editing(99);

        let outcome = edit(&ctx, &mut session, 99).unwrap();

        assert_eq!(redirect_to(&outcome), LIST_PATH);
        assert_eq!(session.edit_state(), EditState::Listing);
        assert_eq!(session.take_flash(), Some(Flash::error("Invalid publishing date ID: 99")));
    }

    #[test]
    fn list_restores_edit_mode_from_session() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let created = ctx.publishing_dates.create(date(2020, 2, 1), &[]).unwrap();
        let id = created.publishing_date().id();
        let mut session = Session::default();
        session.start_editing(id);

        let page = page(list(&ctx, &mut session).unwrap());

        assert!(page.editing_mode);
        assert_eq!(page.form.id, Some(id.to_string()));
        assert_eq!(session.edit_state(), EditState::Editing(id));
    }

    #[test]
    fn list_heals_edit_state_for_vanished_id() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let mut session = Session::default();
        session.start_editing(404);

        let page = page(list(&ctx, &mut session).unwrap());

        assert!(!page.editing_mode);
        assert_eq!(page.form, PublishingDateForm::default());
        assert_eq!(session.edit_state(), EditState::Listing);
    }

    #[test]
    fn update_replaces_books_and_leaves_edit_mode() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let first = new_book(&ctx, "First");
        let second = new_book(&ctx, "Second");
        let created = ctx.publishing_dates.create(date(2023, 1, 1), &[first.id()]).unwrap();
        let id = created.publishing_date().id();
        let mut session = Session::default();
        session.start_editing(id);

        let outcome = update(&ctx, &mut session, form(Some(id), "2023-05-01", vec![second.id()])).unwrap();

        assert_eq!(redirect_to(&outcome), LIST_PATH);
        assert_eq!(session.edit_state(), EditState::Listing);
        assert_eq!(session.take_flash(), Some(Flash::message("Publishing date updated successfully!")));

        let detail = ctx.publishing_dates.get_publishing_date_by_id(id).unwrap().unwrap();
        assert_eq!(detail.publishing_date().date(), date(2023, 5, 1));
        assert_eq!(detail.book_ids(), vec![second.id()]);
        assert_eq!(ctx.books.get_book_by_id(first.id()).unwrap().unwrap().publishing_date_id(), None);
    }

    #[test]
    fn update_without_id_keeps_session() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let mut session = Session::default();
        session.start_editing(5);

        let page = page(update(&ctx, &mut session, form(None, "2023-01-01", vec![])).unwrap());

        assert_eq!(page.error.as_deref(), Some("Publishing date ID cannot be null."));
        assert!(page.editing_mode);
        assert_eq!(session.edit_state(), EditState::Editing(5));
    }

    #[test]
    fn update_without_id_stays_on_update_form_while_listing() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let mut session = Session::default();

        let page = page(update(&ctx, &mut session, form(None, "2023-01-01", vec![])).unwrap());

        assert_eq!(page.error.as_deref(), Some("Publishing date ID cannot be null."));
        assert!(page.editing_mode);
        assert_eq!(session.edit_state(), EditState::Listing);
    }

    #[test]
    fn update_of_unknown_id_redirects_and_creates_nothing() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let mut session = Session::default();
        session.start_editing(42);

        let outcome = update(&ctx, &mut session, form(Some(42), "2023-01-01", vec![])).unwrap();

        assert_eq!(redirect_to(&outcome), LIST_PATH);
        assert_eq!(session.edit_state(), EditState::Listing);
        assert_eq!(
            session.take_flash(),
            Some(Flash::error("Publishing date with ID 42 does not exist."))
        );
        assert!(ctx.publishing_dates.get_all_publishing_dates().unwrap().is_empty());
    }

    #[test]
    fn update_with_invalid_date_stays_in_edit_mode() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let created = ctx.publishing_dates.create(date(2023, 1, 1), &[]).unwrap();
        let id = created.publishing_date().id();
        let mut session = Session::default();

        let page = page(update(&ctx, &mut session, form(Some(id), "", vec![])).unwrap());

        assert!(page.editing_mode);
        assert_eq!(page.error.as_deref(), Some("Invalid publishing date: date is required"));
        assert_eq!(session.edit_state(), EditState::Editing(id));
    }

    #[test]
    fn update_to_duplicate_date_keeps_edit_mode_and_data() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let book = new_book(&ctx, "Stays");
        ctx.publishing_dates.create(date(2023, 1, 1), &[]).unwrap();
        let target = ctx.publishing_dates.create(date(2023, 2, 1), &[book.id()]).unwrap();
        let id = target.publishing_date().id();
        let mut session = Session::default();

        let page = page(update(&ctx, &mut session, form(Some(id), "2023-01-01", vec![])).unwrap());

        assert!(page.editing_mode);
        assert_eq!(page.error.as_deref(), Some(DUPLICATE_DATE));
        assert_eq!(session.edit_state(), EditState::Editing(id));

        let detail = ctx.publishing_dates.get_publishing_date_by_id(id).unwrap().unwrap();
        assert_eq!(detail.publishing_date().date(), date(2023, 2, 1));
        assert_eq!(detail.book_ids(), vec![book.id()]);
    }

    #[test]
    fn search_found_enters_edit_mode() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let created = ctx.publishing_dates.create(date(2019, 9, 1), &[]).unwrap();
        let id = created.publishing_date().id();
        let mut session = Session::default();

        let page = page(search(&ctx, &mut session, date(2019, 9, 1)).unwrap());

        assert!(page.editing_mode);
        assert_eq!(page.form.id, Some(id.to_string()));
        assert_eq!(session.edit_state(), EditState::Editing(id));
    }

    #[test]
    fn search_missing_date_redirects_with_message() {
        let db = testing::database();
        let ctx = Context::new(db.pool());
        let mut session = Session::default();

        let outcome = search(&ctx, &mut session, date(1999, 12, 31)).unwrap();

        assert_eq!(redirect_to(&outcome), LIST_PATH);
        assert_eq!(session.edit_state(), EditState::Listing);
        assert_eq!(
            session.take_flash(),
            Some(Flash::error("No publishing date found for 1999-12-31"))
        );
    }
}
