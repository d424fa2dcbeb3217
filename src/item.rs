pub mod repo;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// 저장소 계층에서 발생하는 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// 커넥션 풀에서 커넥션을 얻지 못함
    #[error("cannot acquire database connection: {0}")]
    ConnectError(String),

    /// 쿼리 실행 실패
    #[error("sql execution failed: {0}")]
    SqlExecuteError(String),

    /// 저장된 값을 도메인 값으로 변환할 수 없음
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// 자연키(natural key)로 조회 후 생성하는 작업의 결과
///
/// 이미 존재하는 레코드는 [`Upserted::Found`]로 변경 없이 반환되고,
/// 새로 저장된 레코드는 [`Upserted::Created`]로 반환된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted<T> {
    Found(T),
    Created(T),
}

impl<T> Upserted<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Upserted::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Upserted::Found(item) | Upserted::Created(item) => item,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Upserted::Found(item) | Upserted::Created(item) => item,
        }
    }
}

/// 저자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: i64,
    name: String,
    email: String,
    birth_date: Option<NaiveDate>,
}

impl Author {
    pub fn new(id: i64, name: String, email: String, birth_date: Option<NaiveDate>) -> Self {
        Self { id, name, email, birth_date }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }
}

/// 정제가 끝나 저장 대기 중인 저자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    name: String,
    email: String,
    birth_date: Option<NaiveDate>,
}

impl NewAuthor {
    pub fn new(name: String, email: String, birth_date: Option<NaiveDate>) -> Self {
        Self { name, email, birth_date }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }
}

/// 도서 분류
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: i64,
    name: String,
    description: String,
}

impl Category {
    pub fn new(id: i64, name: String, description: String) -> Self {
        Self { id, name, description }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    name: String,
    description: String,
}

impl NewCategory {
    pub fn new(name: String, description: String) -> Self {
        Self { name, description }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// 도서
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: i64,
    title: String,
    author_id: i64,
    category_id: i64,
    publish_date: NaiveDate,
    price: Decimal,
    is_available: bool,
}

impl Book {
    pub fn new(
        id: i64,
        title: String,
        author_id: i64,
        category_id: i64,
        publish_date: NaiveDate,
        price: Decimal,
        is_available: bool,
    ) -> Self {
        Self { id, title, author_id, category_id, publish_date, price, is_available }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author_id(&self) -> i64 {
        self.author_id
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn publish_date(&self) -> NaiveDate {
        self.publish_date
    }

    /// 소수점 둘째 자리까지의 가격
    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }
}

/// 저자와 분류가 확정되어 저장 대기 중인 도서
///
/// 새로 생성되는 도서는 항상 대여 가능 상태로 저장된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    title: String,
    author_id: i64,
    category_id: i64,
    publish_date: NaiveDate,
    price: Decimal,
}

impl NewBook {
    pub fn new(title: String, author: &Author, category: &Category, publish_date: NaiveDate, price: Decimal) -> Self {
        Self {
            title,
            author_id: author.id(),
            category_id: category.id(),
            publish_date,
            price,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author_id(&self) -> i64 {
        self.author_id
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn publish_date(&self) -> NaiveDate {
        self.publish_date
    }

    pub fn price(&self) -> Decimal {
        self.price
    }
}

/// 저자명과 분류명을 함께 가지는 도서, 내보내기에서 사용한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetail {
    book: Book,
    author_name: String,
    category_name: String,
}

impl BookDetail {
    pub fn new(book: Book, author_name: String, category_name: String) -> Self {
        Self { book, author_name, category_name }
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }
}

/// 저장소에 저장된 엔티티별 레코드 수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    authors: i64,
    categories: i64,
    books: i64,
}

impl CatalogCounts {
    pub fn new(authors: i64, categories: i64, books: i64) -> Self {
        Self { authors, categories, books }
    }

    pub fn authors(&self) -> i64 {
        self.authors
    }

    pub fn categories(&self) -> i64 {
        self.categories
    }

    pub fn books(&self) -> i64 {
        self.books
    }

    pub fn total(&self) -> i64 {
        self.authors + self.categories + self.books
    }

    pub fn meets_book_requirement(&self, min_books: i64) -> bool {
        self.books >= min_books
    }
}

impl Display for CatalogCounts {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "作者數量: {}", self.authors)?;
        writeln!(f, "分類數量: {}", self.categories)?;
        writeln!(f, "書籍數量: {}", self.books)?;
        write!(f, "總記錄數: {}", self.total())
    }
}

/// 저자 저장소
pub trait AuthorRepository {

    /// 이름이 정확히 일치하는 저자를 찾고, 없으면 새로 저장한다.
    fn find_or_create_author(&self, author: &NewAuthor) -> Result<Upserted<Author>, RepositoryError>;

    /// 모든 저자를 아이디 순으로 가져온다.
    fn find_all_authors(&self) -> Result<Vec<Author>, RepositoryError>;

    fn count_authors(&self) -> Result<i64, RepositoryError>;
}

/// 분류 저장소
pub trait CategoryRepository {

    /// 이름이 정확히 일치하는 분류를 찾고, 없으면 새로 저장한다.
    fn find_or_create_category(&self, category: &NewCategory) -> Result<Upserted<Category>, RepositoryError>;

    fn find_all_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    fn count_categories(&self) -> Result<i64, RepositoryError>;
}

/// 도서 저장소
pub trait BookRepository {

    /// 제목이 정확히 일치하는 도서를 찾고, 없으면 새로 저장한다.
    /// 이미 존재하는 도서는 저자, 분류, 가격이 달라도 갱신하지 않는다.
    fn find_or_create_book(&self, book: &NewBook) -> Result<Upserted<Book>, RepositoryError>;

    /// 모든 도서를 저자명, 분류명과 함께 아이디 순으로 가져온다.
    fn find_all_book_details(&self) -> Result<Vec<BookDetail>, RepositoryError>;

    fn count_books(&self) -> Result<i64, RepositoryError>;
}

/// 가져오기와 내보내기가 사용하는 전체 카탈로그 저장소
pub trait CatalogRepository: AuthorRepository + CategoryRepository + BookRepository {

    fn counts(&self) -> Result<CatalogCounts, RepositoryError> {
        Ok(CatalogCounts::new(
            self.count_authors()?,
            self.count_categories()?,
            self.count_books()?,
        ))
    }
}

impl<T> CatalogRepository for T where T: AuthorRepository + CategoryRepository + BookRepository {}
