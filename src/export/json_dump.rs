use crate::export::{CatalogSnapshot, ExportError};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct TotalRecords {
    authors: i64,
    categories: i64,
    books: i64,
}

#[derive(Serialize)]
struct Metadata {
    export_time: String,
    total_records: TotalRecords,
}

#[serde_as]
#[derive(Serialize)]
struct AuthorRow<'a> {
    id: i64,
    name: &'a str,
    email: &'a str,
    #[serde_as(as = "Option<DisplayFromStr>")]
    birth_date: Option<NaiveDate>,
}

#[derive(Serialize)]
struct CategoryRow<'a> {
    id: i64,
    name: &'a str,
    description: &'a str,
}

#[serde_as]
#[derive(Serialize)]
struct BookRow<'a> {
    id: i64,
    title: &'a str,
    author_id: i64,
    category_id: i64,
    #[serde_as(as = "DisplayFromStr")]
    publish_date: NaiveDate,
    #[serde_as(as = "DisplayFromStr")]
    price: Decimal,
    is_available: bool,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    metadata: Metadata,
    authors: Vec<AuthorRow<'a>>,
    categories: Vec<CategoryRow<'a>>,
    books: Vec<BookRow<'a>>,
}

/// 마이크로초 단위 ISO-8601 시각, 마이크로초가 0이면 소수부를 생략한다.
fn iso_time(time: NaiveDateTime) -> String {
    let seconds = time.format("%Y-%m-%dT%H:%M:%S");
    match time.nanosecond() / 1_000 {
        0 => seconds.to_string(),
        micros => format!("{}.{:06}", seconds, micros),
    }
}

fn to_document(snapshot: &CatalogSnapshot, export_time: NaiveDateTime) -> ExportDocument<'_> {
    let counts = snapshot.counts();

    ExportDocument {
        metadata: Metadata {
            export_time: iso_time(export_time),
            total_records: TotalRecords {
                authors: counts.authors(),
                categories: counts.categories(),
                books: counts.books(),
            },
        },
        authors: snapshot.authors().iter()
            .map(|a| AuthorRow {
                id: a.id(),
                name: a.name(),
                email: a.email(),
                birth_date: a.birth_date(),
            })
            .collect(),
        categories: snapshot.categories().iter()
            .map(|c| CategoryRow {
                id: c.id(),
                name: c.name(),
                description: c.description(),
            })
            .collect(),
        books: snapshot.books().iter()
            .map(|detail| {
                let book = detail.book();
                BookRow {
                    id: book.id(),
                    title: book.title(),
                    author_id: book.author_id(),
                    category_id: book.category_id(),
                    publish_date: book.publish_date(),
                    price: book.price(),
                    is_available: book.is_available(),
                }
            })
            .collect(),
    }
}

/// 메타데이터(내보내기 시각, 엔티티별 레코드 수)와 전체 데이터를 2칸 들여쓰기 JSON으로 기록한다.
/// 날짜와 가격은 문자열로 기록된다.
pub fn write(path: &Path, snapshot: &CatalogSnapshot, export_time: NaiveDateTime) -> Result<(), ExportError> {
    let document = to_document(snapshot, export_time);

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.flush()?;
    Ok(())
}
