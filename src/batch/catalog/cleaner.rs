use crate::batch::catalog::{BookDraft, CleanRecord, RawAuthor, RawBook, RawCategory, RawRecord};
use crate::batch::error::JobProcessFailed;
use crate::batch::Processor;
use crate::item::{NewAuthor, NewCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("{0} is empty")]
    EmptyField(&'static str),

    #[error("{field} must be a string, found {value}")]
    NotText {
        field: &'static str,
        value: Value,
    },

    #[error("invalid {field} '{value}': {source}")]
    InvalidDate {
        field: &'static str,
        value: String,
        source: chrono::ParseError,
    },

    #[error("invalid price '{value}': {source}")]
    InvalidPrice {
        value: String,
        source: rust_decimal::Error,
    },

    #[error("price {0} is out of range (0 ~ 9999.99)")]
    PriceOutOfRange(Decimal),
}

/// 레코드 정제기
///
/// - 저자: 이름 공백 제거, 이메일 공백 제거 후 소문자 변환, 생일은 비어 있으면 없음으로 처리
/// - 분류: 이름, 설명 공백 제거
/// - 도서: 제목, 저자명, 분류명 공백 제거, 출판일(필수)과 가격 파싱
pub struct RecordCleaner;

impl Processor for RecordCleaner {
    type In = RawRecord;
    type Out = CleanRecord;

    fn do_process(&self, item: Self::In) -> Result<Self::Out, JobProcessFailed<Self::In>> {
        clean(&item).map_err(|e| JobProcessFailed::new(item, e.to_string()))
    }
}

pub fn clean(record: &RawRecord) -> Result<CleanRecord, CleanError> {
    match record {
        RawRecord::Author(author) => clean_author(author).map(CleanRecord::Author),
        RawRecord::Category(category) => clean_category(category).map(CleanRecord::Category),
        RawRecord::Book(book) => clean_book(book).map(CleanRecord::Book),
    }
}

fn clean_author(raw: &RawAuthor) -> Result<NewAuthor, CleanError> {
    let name = required("name", &raw.name)?;
    let email = text("email", &raw.email)?.trim().to_lowercase();
    let birth_date = match optional_text("birth_date", &raw.birth_date)?.map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(parse_date("birth_date", value)?),
    };

    Ok(NewAuthor::new(name, email, birth_date))
}

fn clean_category(raw: &RawCategory) -> Result<NewCategory, CleanError> {
    let name = required("name", &raw.name)?;
    let description = optional_text("description", &raw.description)?.unwrap_or_default();

    Ok(NewCategory::new(name, description.trim().to_owned()))
}

fn clean_book(raw: &RawBook) -> Result<BookDraft, CleanError> {
    let title = required("title", &raw.title)?;
    let author_name = text("author_name", &raw.author_name)?.trim().to_owned();
    let category_name = text("category_name", &raw.category_name)?.trim().to_owned();
    let publish_date = parse_date("publish_date", text("publish_date", &raw.publish_date)?.trim())?;
    let price = parse_price(&raw.price)?;

    Ok(BookDraft::new(title, author_name, category_name, publish_date, price))
}

fn text<'a>(field: &'static str, value: &'a Value) -> Result<&'a str, CleanError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(CleanError::NotText { field, value: other.clone() }),
    }
}

/// `null`은 값이 없는 것으로 본다.
fn optional_text<'a>(field: &'static str, value: &'a Value) -> Result<Option<&'a str>, CleanError> {
    match value {
        Value::Null => Ok(None),
        other => text(field, other).map(Some),
    }
}

/// 자연키로 사용하는 값은 공백 제거 후 비어 있으면 안된다.
fn required(field: &'static str, value: &Value) -> Result<String, CleanError> {
    let value = text(field, value)?.trim();
    if value.is_empty() {
        return Err(CleanError::EmptyField(field));
    }
    Ok(value.to_owned())
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, CleanError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|source| CleanError::InvalidDate { field, value: value.to_owned(), source })
}

/// 가격을 소수점 둘째 자리로 반올림한다. 허용 범위는 decimal(6, 2)와 같다.
fn parse_price(value: &str) -> Result<Decimal, CleanError> {
    let trimmed = value.trim();
    let price = Decimal::from_str(trimmed)
        .or_else(|e| Decimal::from_scientific(trimmed).map_err(|_| e))
        .map_err(|source| CleanError::InvalidPrice { value: value.to_owned(), source })?
        .round_dp(2);

    if price < Decimal::ZERO || price > max_price() {
        return Err(CleanError::PriceOutOfRange(price));
    }
    Ok(price)
}

fn max_price() -> Decimal {
    Decimal::new(999_999, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw_book(publish_date: &str, price: &str) -> RawRecord {
        RawRecord::Book(RawBook {
            title: "  T  ".into(),
            author_name: " A ".into(),
            category_name: "C\t".into(),
            publish_date: Value::from(publish_date),
            price: price.into(),
        })
    }

    #[test]
    fn author_is_trimmed_and_email_lowercased() {
        let raw = RawRecord::Author(RawAuthor {
            name: "  A ".into(),
            email: " A@X.com ".into(),
            birth_date: "2000-01-01".into(),
        });

        let cleaned = clean(&raw).unwrap();

        assert_eq!(cleaned, CleanRecord::Author(NewAuthor::new(
            "A".into(),
            "a@x.com".into(),
            NaiveDate::from_ymd_opt(2000, 1, 1),
        )));
    }

    #[rstest]
    #[case(Value::Null)]
    #[case(Value::from(""))]
    #[case(Value::from("   "))]
    fn empty_birth_date_is_absent(#[case] birth_date: Value) {
        let raw = RawRecord::Author(RawAuthor {
            name: "A".into(),
            email: "a@x.com".into(),
            birth_date,
        });

        match clean(&raw).unwrap() {
            CleanRecord::Author(author) => assert_eq!(author.birth_date(), None),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn category_description_is_trimmed() {
        let raw = RawRecord::Category(RawCategory { name: " 科技 ".into(), description: " 技術相關書籍\n".into() });

        assert_eq!(
            clean(&raw).unwrap(),
            CleanRecord::Category(NewCategory::new("科技".into(), "技術相關書籍".into()))
        );
    }

    #[rstest]
    #[case("9.99", Decimal::new(999, 2))]
    #[case("350", Decimal::new(350, 0))]
    #[case(" 12.345 ", Decimal::new(1234, 2))]
    #[case("1e2", Decimal::new(100, 0))]
    #[case("0", Decimal::ZERO)]
    #[case("9999.99", Decimal::new(999_999, 2))]
    fn book_price_is_parsed(#[case] price: &str, #[case] expected: Decimal) {
        match clean(&raw_book("2020-01-01", price)).unwrap() {
            CleanRecord::Book(book) => {
                assert_eq!(book.price(), expected);
                assert_eq!(book.title(), "T");
                assert_eq!(book.author_name(), "A");
                assert_eq!(book.category_name(), "C");
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[rstest]
    #[case("abc")]
    #[case("")]
    #[case("null")]
    fn invalid_price_is_rejected(#[case] price: &str) {
        assert!(matches!(clean(&raw_book("2020-01-01", price)), Err(CleanError::InvalidPrice { .. })));
    }

    #[rstest]
    #[case("-1")]
    #[case("10000")]
    fn out_of_range_price_is_rejected(#[case] price: &str) {
        assert!(matches!(clean(&raw_book("2020-01-01", price)), Err(CleanError::PriceOutOfRange(_))));
    }

    #[rstest]
    #[case("")]
    #[case("2020/01/01")]
    #[case("2020-13-01")]
    fn invalid_publish_date_is_rejected(#[case] date: &str) {
        assert!(matches!(
            clean(&raw_book(date, "1")),
            Err(CleanError::InvalidDate { field: "publish_date", .. })
        ));
    }

    #[test]
    fn null_publish_date_is_rejected() {
        let mut raw = raw_book("2020-01-01", "1");
        if let RawRecord::Book(book) = &mut raw {
            book.publish_date = Value::Null;
        }

        assert!(matches!(clean(&raw), Err(CleanError::NotText { field: "publish_date", .. })));
    }

    #[rstest]
    #[case("name", RawAuthor { name: Value::from(42), email: "a@x.com".into(), birth_date: Value::Null })]
    #[case("email", RawAuthor { name: "A".into(), email: Value::Null, birth_date: Value::Null })]
    #[case("birth_date", RawAuthor { name: "A".into(), email: "a@x.com".into(), birth_date: Value::from(19800515) })]
    fn non_string_author_value_is_rejected(#[case] expected: &str, #[case] raw: RawAuthor) {
        match clean(&RawRecord::Author(raw)) {
            Err(CleanError::NotText { field, .. }) => assert_eq!(field, expected),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn non_string_category_description_is_rejected() {
        let raw = RawRecord::Category(RawCategory { name: "C".into(), description: Value::from(true) });

        assert!(matches!(clean(&raw), Err(CleanError::NotText { field: "description", .. })));
    }

    #[test]
    fn empty_natural_key_is_rejected() {
        let raw = RawRecord::Category(RawCategory { name: "   ".into(), description: "".into() });

        assert!(matches!(clean(&raw), Err(CleanError::EmptyField("name"))));
    }

    #[test]
    fn processor_returns_failed_item_with_reason() {
        let raw = raw_book("not a date", "1");

        let failed = RecordCleaner.do_process(raw.clone()).unwrap_err();

        assert_eq!(failed.item(), &raw);
        assert!(failed.message().contains("publish_date"));
    }
}
