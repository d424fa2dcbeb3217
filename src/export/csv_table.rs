use crate::export::ExportError;
use crate::item::{Author, BookDetail, Category};
use rust_decimal::prelude::ToPrimitive;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// 엑셀에서 UTF-8로 인식 되도록 파일 앞에 BOM을 기록한다.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const DATE_FORMAT: &str = "%Y-%m-%d";

const AUTHOR_HEADER: [&str; 4] = ["ID", "姓名", "電子郵件", "出生日期"];
const CATEGORY_HEADER: [&str; 3] = ["ID", "分類名稱", "描述"];
const BOOK_HEADER: [&str; 9] = ["ID", "書名", "作者ID", "作者", "分類ID", "分類", "出版日期", "價格", "是否可借"];

fn create_writer(path: &Path) -> Result<csv::Writer<File>, ExportError> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    Ok(csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(file))
}

pub fn write_authors(path: &Path, authors: &[Author]) -> Result<(), ExportError> {
    let mut writer = create_writer(path)?;
    writer.write_record(AUTHOR_HEADER)?;

    for author in authors {
        writer.write_record([
            author.id().to_string(),
            author.name().to_owned(),
            author.email().to_owned(),
            author.birth_date()
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_categories(path: &Path, categories: &[Category]) -> Result<(), ExportError> {
    let mut writer = create_writer(path)?;
    writer.write_record(CATEGORY_HEADER)?;

    for category in categories {
        writer.write_record([
            category.id().to_string(),
            category.name().to_owned(),
            category.description().to_owned(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// 도서는 저자, 분류의 아이디와 이름을 함께 기록한다. 가격은 실수로, 대여 가능 여부는 是/否로 기록한다.
pub fn write_books(path: &Path, books: &[BookDetail]) -> Result<(), ExportError> {
    let mut writer = create_writer(path)?;
    writer.write_record(BOOK_HEADER)?;

    for detail in books {
        let book = detail.book();
        writer.write_record([
            book.id().to_string(),
            book.title().to_owned(),
            book.author_id().to_string(),
            detail.author_name().to_owned(),
            book.category_id().to_string(),
            detail.category_name().to_owned(),
            book.publish_date().format(DATE_FORMAT).to_string(),
            float_text(book),
            availability(book.is_available()).to_owned(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn float_text(book: &crate::item::Book) -> String {
    book.price().to_f64()
        .map(|price| format!("{:?}", price))
        .unwrap_or_else(|| book.price().to_string())
}

fn availability(is_available: bool) -> &'static str {
    if is_available { "是" } else { "否" }
}
