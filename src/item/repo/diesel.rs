use crate::item::{Author, Book, Category, NewAuthor, NewBook, NewCategory, RepositoryError, Upserted};
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::sqlite::SqliteConnection;
use r2d2::{Pool, PooledConnection};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

mod schema;

/// 카탈로그 테이블 DDL, 자연키(이름/제목)는 저장소 수준에서 유일하다.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS author (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL UNIQUE,
    email VARCHAR(254) NOT NULL,
    birth_date DATE NULL
);
CREATE TABLE IF NOT EXISTS category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(50) NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS book (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(200) NOT NULL UNIQUE,
    author_id INTEGER NOT NULL REFERENCES author (id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES category (id) ON DELETE CASCADE,
    publish_date DATE NOT NULL,
    price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
    is_available BOOLEAN NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS book_author_id ON book (author_id);
CREATE INDEX IF NOT EXISTS book_category_id ON book (category_id);
"#;

#[derive(Queryable, Selectable)]
#[diesel(table_name = schema::author)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuthorEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
}

impl AuthorEntity {
    pub fn to_domain(self) -> Author {
        Author::new(self.id, self.name, self.email, self.birth_date)
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::author)]
pub struct NewAuthorEntity<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub birth_date: Option<NaiveDate>,
}

impl<'a> NewAuthorEntity<'a> {
    pub fn from(author: &'a NewAuthor) -> Self {
        Self {
            name: author.name(),
            email: author.email(),
            birth_date: author.birth_date(),
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = schema::category)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CategoryEntity {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl CategoryEntity {
    pub fn to_domain(self) -> Category {
        Category::new(self.id, self.name, self.description)
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::category)]
pub struct NewCategoryEntity<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

impl<'a> NewCategoryEntity<'a> {
    pub fn from(category: &'a NewCategory) -> Self {
        Self {
            name: category.name(),
            description: category.description(),
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = schema::book)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BookEntity {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub category_id: i64,
    pub publish_date: NaiveDate,
    pub price_cents: i64,
    pub is_available: bool,
}

impl BookEntity {
    pub fn to_domain(self) -> Book {
        Book::new(
            self.id,
            self.title,
            self.author_id,
            self.category_id,
            self.publish_date,
            Decimal::new(self.price_cents, 2),
            self.is_available,
        )
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::book)]
pub struct NewBookEntity<'a> {
    pub title: &'a str,
    pub author_id: i64,
    pub category_id: i64,
    pub publish_date: NaiveDate,
    pub price_cents: i64,
    pub is_available: bool,
}

impl<'a> NewBookEntity<'a> {
    pub fn from(book: &'a NewBook) -> Result<Self, RepositoryError> {
        Ok(Self {
            title: book.title(),
            author_id: book.author_id(),
            category_id: book.category_id(),
            publish_date: book.publish_date(),
            price_cents: to_cents(book.price())?,
            is_available: true,
        })
    }
}

/// 가격을 소수점 둘째 자리에서 반올림 후 정수(1/100 단위)로 변환한다.
fn to_cents(price: Decimal) -> Result<i64, RepositoryError> {
    (price.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| RepositoryError::InvalidValue(format!("price out of range: {}", price)))
}

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// 테이블이 없을 경우 생성한다. 여러번 호출해도 안전하다.
pub fn initialize_schema(pool: &SqlitePool) -> Result<(), RepositoryError> {
    let mut connection = pool.get()
        .map_err(|e| RepositoryError::ConnectError(e.to_string()))?;

    connection.batch_execute(SCHEMA_SQL)
        .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
}

#[derive(Clone)]
pub struct CatalogSqliteStore {
    pool: SqlitePool,
}

impl CatalogSqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, RepositoryError> {
        self.pool.get()
            .map_err(|e| RepositoryError::ConnectError(e.to_string()))
    }
}

impl CatalogSqliteStore {

    pub fn find_or_create_author(&self, new_author: &NewAuthor) -> Result<Upserted<AuthorEntity>, RepositoryError> {
        use schema::author::dsl::{author, name};

        let mut connection = self.connection()?;
        let conn: &mut SqliteConnection = &mut connection;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let exists = author
                .filter(name.eq(new_author.name()))
                .select(AuthorEntity::as_select())
                .first(conn)
                .optional()?;
            if let Some(entity) = exists {
                return Ok(Upserted::Found(entity));
            }

            diesel::insert_into(author)
                .values(NewAuthorEntity::from(new_author))
                .execute(conn)?;
            let created = author
                .filter(name.eq(new_author.name()))
                .select(AuthorEntity::as_select())
                .first(conn)?;
            Ok(Upserted::Created(created))
        })
        .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }

    pub fn find_or_create_category(&self, new_category: &NewCategory) -> Result<Upserted<CategoryEntity>, RepositoryError> {
        use schema::category::dsl::{category, name};

        let mut connection = self.connection()?;
        let conn: &mut SqliteConnection = &mut connection;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let exists = category
                .filter(name.eq(new_category.name()))
                .select(CategoryEntity::as_select())
                .first(conn)
                .optional()?;
            if let Some(entity) = exists {
                return Ok(Upserted::Found(entity));
            }

            diesel::insert_into(category)
                .values(NewCategoryEntity::from(new_category))
                .execute(conn)?;
            let created = category
                .filter(name.eq(new_category.name()))
                .select(CategoryEntity::as_select())
                .first(conn)?;
            Ok(Upserted::Created(created))
        })
        .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }

    pub fn find_or_create_book(&self, new_book: &NewBook) -> Result<Upserted<BookEntity>, RepositoryError> {
        use schema::book::dsl::{book, title};

        let entity = NewBookEntity::from(new_book)?;
        let mut connection = self.connection()?;
        let conn: &mut SqliteConnection = &mut connection;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let exists = book
                .filter(title.eq(new_book.title()))
                .select(BookEntity::as_select())
                .first(conn)
                .optional()?;
            if let Some(found) = exists {
                return Ok(Upserted::Found(found));
            }

            diesel::insert_into(book)
                .values(&entity)
                .execute(conn)?;
            let created = book
                .filter(title.eq(new_book.title()))
                .select(BookEntity::as_select())
                .first(conn)?;
            Ok(Upserted::Created(created))
        })
        .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }

    pub fn find_all_authors(&self) -> Result<Vec<AuthorEntity>, RepositoryError> {
        use schema::author::dsl::{author, id};

        let mut connection = self.connection()?;
        author
            .order_by(id.asc())
            .select(AuthorEntity::as_select())
            .load(&mut *connection)
            .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }

    pub fn find_all_categories(&self) -> Result<Vec<CategoryEntity>, RepositoryError> {
        use schema::category::dsl::{category, id};

        let mut connection = self.connection()?;
        category
            .order_by(id.asc())
            .select(CategoryEntity::as_select())
            .load(&mut *connection)
            .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }

    /// 도서를 저자명, 분류명과 함께 조회한다.
    pub fn find_all_books_with_names(&self) -> Result<Vec<(BookEntity, String, String)>, RepositoryError> {
        use schema::{author, book, category};

        let mut connection = self.connection()?;
        book::table
            .inner_join(author::table)
            .inner_join(category::table)
            .order_by(book::id.asc())
            .select((BookEntity::as_select(), author::name, category::name))
            .load::<(BookEntity, String, String)>(&mut *connection)
            .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }

    pub fn count_authors(&self) -> Result<i64, RepositoryError> {
        use schema::author::dsl::author;

        let mut connection = self.connection()?;
        author.count()
            .get_result(&mut *connection)
            .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }

    pub fn count_categories(&self) -> Result<i64, RepositoryError> {
        use schema::category::dsl::category;

        let mut connection = self.connection()?;
        category.count()
            .get_result(&mut *connection)
            .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }

    pub fn count_books(&self) -> Result<i64, RepositoryError> {
        use schema::book::dsl::book;

        let mut connection = self.connection()?;
        book.count()
            .get_result(&mut *connection)
            .map_err(|e| RepositoryError::SqlExecuteError(e.to_string()))
    }
}
