use crate::item::{Book, PublishingDate};
use crate::web::form::PublishingDateForm;
use crate::web::session::Flash;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Page {
    Books(BooksPage),
    BookForm(BookFormPage),
    BooksByDate(BooksByDatePage),
    PublishingDates(PublishingDatesPage),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BooksPage {
    pub books: Vec<Book>,
    pub publishing_dates: Vec<PublishingDate>,
    pub flash: Option<Flash>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BookFormPage {
    pub publishing_dates: Vec<PublishingDate>,
    pub flash: Option<Flash>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BooksByDatePage {
    pub selected_date: NaiveDate,
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PublishingDatesPage {
    pub publishing_dates: Vec<PublishingDate>,
    pub books: Vec<Book>,
    pub form: PublishingDateForm,
    pub editing_mode: bool,
    pub error: Option<String>,
    pub flash: Option<Flash>,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Books(_) => "Books",
            Page::BookForm(_) => "Add Book",
            Page::BooksByDate(_) => "Books by Publishing Date",
            Page::PublishingDates(_) => "Publishing Dates",
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>", self.title())?;
        writeln!(
            f,
            "<nav><a href=\"/books\">Books</a> | <a href=\"/books/add\">Add Book</a> | \
             <a href=\"/publishingDates\">Publishing Dates</a></nav>\n<h1>{}</h1>",
            self.title()
        )?;

        match self {
            Page::Books(page) => books(f, page)?,
            Page::BookForm(page) => book_form(f, page)?,
            Page::BooksByDate(page) => books_by_date(f, page)?,
            Page::PublishingDates(page) => publishing_dates(f, page)?,
        }

        f.write_str("</body>\n</html>\n")
    }
}

fn books(f: &mut fmt::Formatter<'_>, page: &BooksPage) -> fmt::Result {
    let dates: HashMap<u64, &PublishingDate> = page.publishing_dates.iter()
        .map(|d| (d.id(), d))
        .collect();

    flash(f, page.flash.as_ref())?;
    f.write_str("<table>\n<tr><th>ID</th><th>Title</th><th>Genre</th><th>Publishing Date</th><th>Rename</th></tr>\n")?;
    for book in &page.books {
        let date = book.publishing_date_id()
            .and_then(|id| dates.get(&id))
            .map(|d| d.to_string())
            .unwrap_or_default();

        writeln!(
            f,
            "<tr><td>{id}</td><td>{title}</td><td>{genre}</td><td>{date}</td><td>\
             <form method=\"post\" action=\"/books/updateBookTitle\">\
             <input type=\"hidden\" name=\"bookId\" value=\"{id}\">\
             <input type=\"text\" name=\"newTitle\" value=\"{title}\">\
             <button type=\"submit\">Update</button></form></td></tr>",
            id = book.id(),
            title = Escaped(book.title()),
            genre = Escaped(book.genre().unwrap_or_default()),
            date = date,
        )?;
    }
    f.write_str("</table>\n")?;
    f.write_str(
        "<form method=\"get\" action=\"/books/books-by-date\">\
         <input type=\"date\" name=\"date\" required><button type=\"submit\">Books by date</button></form>\n"
    )
}

fn book_form(f: &mut fmt::Formatter<'_>, page: &BookFormPage) -> fmt::Result {
    flash(f, page.flash.as_ref())?;
    f.write_str("<form method=\"post\" action=\"/books/add\">\n")?;
    f.write_str("<label>Title <input type=\"text\" name=\"title\" required></label>\n")?;
    f.write_str("<label>Genre <input type=\"text\" name=\"genre\"></label>\n")?;
    f.write_str("<label>Publishing Date <select name=\"publishingDateId\">\n<option value=\"\">None</option>\n")?;
    for date in &page.publishing_dates {
        writeln!(f, "<option value=\"{}\">{}</option>", date.id(), date)?;
    }
    f.write_str("</select></label>\n<button type=\"submit\">Add</button>\n</form>\n")
}

fn books_by_date(f: &mut fmt::Formatter<'_>, page: &BooksByDatePage) -> fmt::Result {
    writeln!(f, "<p>Books published on {}</p>", page.selected_date.format("%Y-%m-%d"))?;
    if page.books.is_empty() {
        return f.write_str("<p>No books found.</p>\n");
    }

    f.write_str("<ul>\n")?;
    for book in &page.books {
        writeln!(f, "<li>{} ({})</li>", Escaped(book.title()), Escaped(book.genre().unwrap_or_default()))?;
    }
    f.write_str("</ul>\n")
}

fn publishing_dates(f: &mut fmt::Formatter<'_>, page: &PublishingDatesPage) -> fmt::Result {
    flash(f, page.flash.as_ref())?;
    if let Some(error) = &page.error {
        writeln!(f, "<p class=\"error\">{}</p>", Escaped(error))?;
    }

    f.write_str(
        "<form method=\"get\" action=\"/publishingDates/search\">\
         <input type=\"date\" name=\"date\" required><button type=\"submit\">Search</button></form>\n"
    )?;

    f.write_str("<table>\n<tr><th>ID</th><th>Date</th><th></th></tr>\n")?;
    for date in &page.publishing_dates {
        writeln!(
            f,
            "<tr><td>{id}</td><td>{date}</td><td><a href=\"/publishingDates/edit/{id}\">Edit</a> \
             <a href=\"/books/books-by-date?date={date}\">Books</a></td></tr>",
            id = date.id(),
            date = date,
        )?;
    }
    f.write_str("</table>\n")?;

    let (action, label) = if page.editing_mode {
        ("/publishingDates/update", "Update")
    } else {
        ("/publishingDates/add", "Add")
    };

    writeln!(f, "<form method=\"post\" action=\"{}\">", action)?;
    if page.editing_mode {
        writeln!(
            f,
            "<input type=\"hidden\" name=\"id\" value=\"{}\">",
            Escaped(page.form.id.as_deref().unwrap_or_default())
        )?;
    }
    writeln!(
        f,
        "<label>Date <input type=\"date\" name=\"date\" value=\"{}\" required></label>",
        Escaped(page.form.date.as_deref().unwrap_or_default())
    )?;
    f.write_str("<fieldset><legend>Books</legend>\n")?;
    for book in &page.books {
        let checked = if page.form.book_ids.contains(&book.id()) { " checked" } else { "" };
        writeln!(
            f,
            "<label><input type=\"checkbox\" name=\"bookIds\" value=\"{}\"{}> {}</label>",
            book.id(),
            checked,
            Escaped(book.title()),
        )?;
    }
    f.write_str("</fieldset>\n")?;
    writeln!(f, "<button type=\"submit\">{}</button>", label)?;
    f.write_str("</form>\n")
}

fn flash(f: &mut fmt::Formatter<'_>, flash: Option<&Flash>) -> fmt::Result {
    match flash {
        Some(flash) if flash.is_error() => writeln!(f, "<p class=\"error\">{}</p>", Escaped(flash.text())),
        Some(flash) => writeln!(f, "<p class=\"message\">{}</p>", Escaped(flash.text())),
        None => Ok(()),
    }
}

/// HTML 특수 문자를 엔티티로 바꿔 출력한다.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            f.write_str(match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            })?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}
