pub mod loader;
pub mod cleaner;
pub mod importer;

use crate::item::{NewAuthor, NewCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

/// 시드 파일에서 읽은 정제 전 저자
///
/// 값의 타입은 정제 단계에서 검사한다. 문자열이 아닌 값이 있으면 해당 레코드만 건너뛴다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAuthor {
    pub name: Value,
    pub email: Value,
    pub birth_date: Value,
}

/// 시드 파일에서 읽은 정제 전 분류
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCategory {
    pub name: Value,
    pub description: Value,
}

/// 시드 파일에서 읽은 정제 전 도서, 가격은 숫자로 입력 되어도 문자열로 보관한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBook {
    pub title: Value,
    pub author_name: Value,
    pub category_name: Value,
    pub publish_date: Value,
    pub price: String,
}

/// 엔티티 종류로 태그된 정제 전 레코드
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    Author(RawAuthor),
    Category(RawCategory),
    Book(RawBook),
}

/// 정제가 끝났지만 아직 저자와 분류가 확정되지 않은 도서
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    title: String,
    author_name: String,
    category_name: String,
    publish_date: NaiveDate,
    price: Decimal,
}

impl BookDraft {
    pub fn new(title: String, author_name: String, category_name: String, publish_date: NaiveDate, price: Decimal) -> Self {
        Self { title, author_name, category_name, publish_date, price }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }

    pub fn publish_date(&self) -> NaiveDate {
        self.publish_date
    }

    pub fn price(&self) -> Decimal {
        self.price
    }
}

/// 정제가 끝난 레코드
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanRecord {
    Author(NewAuthor),
    Category(NewCategory),
    Book(BookDraft),
}
