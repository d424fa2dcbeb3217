use crate::batch::catalog::{RawAuthor, RawBook, RawCategory, RawRecord};
use crate::batch::error::JobReadFailed;
use crate::batch::{Provider, Reader};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cannot read seed file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid seed document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct SeedDocument {
    #[serde(default)]
    authors: Vec<SeedAuthor>,
    #[serde(default)]
    categories: Vec<SeedCategory>,
    #[serde(default)]
    books: Vec<SeedBook>,
}

/// 키가 없는 필수 항목은 문서 파싱 실패로 처리한다. 값의 타입은 정제 단계에서 검사한다.
#[derive(Debug, Deserialize)]
struct SeedAuthor {
    name: Value,
    email: Value,
    #[serde(default)]
    birth_date: Value,
}

#[derive(Debug, Deserialize)]
struct SeedCategory {
    name: Value,
    #[serde(default)]
    description: Value,
}

#[derive(Debug, Deserialize)]
struct SeedBook {
    title: Value,
    author_name: Value,
    category_name: Value,
    publish_date: Value,
    price: Value,
}

impl SeedDocument {
    /// 저자, 분류, 도서 순서로 하나의 레코드 목록으로 펼친다.
    fn into_records(self) -> Vec<RawRecord> {
        let authors = self.authors.into_iter()
            .map(|a| RawRecord::Author(RawAuthor {
                name: a.name,
                email: a.email,
                birth_date: a.birth_date,
            }));
        let categories = self.categories.into_iter()
            .map(|c| RawRecord::Category(RawCategory {
                name: c.name,
                description: c.description,
            }));
        let books = self.books.into_iter()
            .map(|b| RawRecord::Book(RawBook {
                title: b.title,
                author_name: b.author_name,
                category_name: b.category_name,
                publish_date: b.publish_date,
                price: price_text(b.price),
            }));

        authors.chain(categories).chain(books).collect()
    }
}

fn price_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// 최상위 값은 반드시 객체여야 한다.
fn parse_document(content: &str) -> Result<SeedDocument, serde_json::Error> {
    let value: Value = serde_json::from_str(content)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom("seed document must be a JSON object"));
    }

    serde_json::from_value(value)
}

/// 시드 JSON 파일을 읽어 정제 전 레코드 목록으로 변환한다.
///
/// 문서 전체가 성공하거나 전체가 실패하며, 일부 레코드만 읽는 경우는 없다.
pub fn read_seed_file(path: &Path) -> Result<Vec<RawRecord>, SeedError> {
    let content = fs::read_to_string(path)
        .map_err(|source| SeedError::Io { path: path.to_owned(), source })?;
    let document = parse_document(content.trim_start_matches('\u{feff}'))
        .map_err(|source| SeedError::Parse { path: path.to_owned(), source })?;

    info!(
        path = %path.display(),
        total = document.authors.len() + document.categories.len() + document.books.len(),
        authors = document.authors.len(),
        categories = document.categories.len(),
        books = document.books.len(),
        "loaded seed file"
    );

    Ok(document.into_records())
}

/// 시드 파일을 읽을 수 없을 때 사용하는 기본 데이터 (저자 2, 분류 1, 도서 1)
pub fn default_records() -> Vec<RawRecord> {
    vec![
        RawRecord::Author(RawAuthor {
            name: "張三".into(),
            email: "zhangsan@email.com".into(),
            birth_date: "1980-05-15".into(),
        }),
        RawRecord::Author(RawAuthor {
            name: "李四".into(),
            email: "lisi@email.com".into(),
            birth_date: "1975-12-01".into(),
        }),
        RawRecord::Category(RawCategory {
            name: "科技".into(),
            description: "技術相關書籍".into(),
        }),
        RawRecord::Book(RawBook {
            title: "Python入門".into(),
            author_name: "張三".into(),
            category_name: "科技".into(),
            publish_date: "2023-01-15".into(),
            price: "350.00".to_owned(),
        }),
    ]
}

pub type FallbackProvider = Box<dyn Provider<Item = Vec<RawRecord>>>;

/// 시드 파일 리더
///
/// 파일을 읽지 못하면 생성시 주입된 대체 데이터 제공자(fallback)의 데이터를 사용한다.
/// 제공자가 없으면 읽기 실패로 잡을 중단한다.
pub struct SeedFileReader {
    path: PathBuf,
    fallback: Option<FallbackProvider>,
}

impl SeedFileReader {
    pub fn new(path: &Path, fallback: FallbackProvider) -> Self {
        Self { path: path.to_owned(), fallback: Some(fallback) }
    }

    pub fn strict(path: &Path) -> Self {
        Self { path: path.to_owned(), fallback: None }
    }
}

impl Reader for SeedFileReader {
    type Item = RawRecord;

    fn do_read(&self) -> Result<Vec<Self::Item>, JobReadFailed> {
        match read_seed_file(&self.path) {
            Ok(records) => Ok(records),
            Err(e) => {
                error!(error = %e, "cannot load seed file");
                let fallback = self.fallback.as_ref()
                    .ok_or_else(|| JobReadFailed::InvalidInput(e.to_string()))?;

                let records = fallback.retrieve();
                warn!(count = records.len(), "using fallback records");
                Ok(records)
            }
        }
    }
}
