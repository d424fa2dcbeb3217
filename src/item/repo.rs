use crate::item::repo::diesel::CatalogSqliteStore;
use crate::item::{
    Author, AuthorRepository, Book, BookDetail, BookRepository, Category, CategoryRepository, NewAuthor, NewBook,
    NewCategory, RepositoryError, Upserted,
};

mod diesel;

pub use self::diesel::{initialize_schema, SqlitePool};

/// diesel(SQLite) 기반 카탈로그 저장소
#[derive(Clone)]
pub struct DieselCatalogRepository {
    store: CatalogSqliteStore,
}

impl DieselCatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { store: CatalogSqliteStore::new(pool) }
    }
}

impl AuthorRepository for DieselCatalogRepository {
    fn find_or_create_author(&self, author: &NewAuthor) -> Result<Upserted<Author>, RepositoryError> {
        self.store.find_or_create_author(author)
            .map(|upserted| match upserted {
                Upserted::Found(entity) => Upserted::Found(entity.to_domain()),
                Upserted::Created(entity) => Upserted::Created(entity.to_domain()),
            })
    }

    fn find_all_authors(&self) -> Result<Vec<Author>, RepositoryError> {
        self.store.find_all_authors()
            .map(|entities| entities.into_iter().map(|e| e.to_domain()).collect())
    }

    fn count_authors(&self) -> Result<i64, RepositoryError> {
        self.store.count_authors()
    }
}

impl CategoryRepository for DieselCatalogRepository {
    fn find_or_create_category(&self, category: &NewCategory) -> Result<Upserted<Category>, RepositoryError> {
        self.store.find_or_create_category(category)
            .map(|upserted| match upserted {
                Upserted::Found(entity) => Upserted::Found(entity.to_domain()),
                Upserted::Created(entity) => Upserted::Created(entity.to_domain()),
            })
    }

    fn find_all_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.store.find_all_categories()
            .map(|entities| entities.into_iter().map(|e| e.to_domain()).collect())
    }

    fn count_categories(&self) -> Result<i64, RepositoryError> {
        self.store.count_categories()
    }
}

impl BookRepository for DieselCatalogRepository {
    fn find_or_create_book(&self, book: &NewBook) -> Result<Upserted<Book>, RepositoryError> {
        self.store.find_or_create_book(book)
            .map(|upserted| match upserted {
                Upserted::Found(entity) => Upserted::Found(entity.to_domain()),
                Upserted::Created(entity) => Upserted::Created(entity.to_domain()),
            })
    }

    fn find_all_book_details(&self) -> Result<Vec<BookDetail>, RepositoryError> {
        self.store.find_all_books_with_names()
            .map(|rows| {
                rows.into_iter()
                    .map(|(entity, author_name, category_name)| {
                        BookDetail::new(entity.to_domain(), author_name, category_name)
                    })
                    .collect()
            })
    }

    fn count_books(&self) -> Result<i64, RepositoryError> {
        self.store.count_books()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::memory_repository;
    use super::*;
    use crate::item::CatalogRepository;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn find_or_create_author_is_idempotent_by_name() {
        let repository = memory_repository();
        let first = NewAuthor::new("張三".into(), "zhangsan@email.com".into(), Some(date("1980-05-15")));
        let second = NewAuthor::new("張三".into(), "other@email.com".into(), None);

        let created = repository.find_or_create_author(&first).unwrap();
        let found = repository.find_or_create_author(&second).unwrap();

        assert!(created.is_created());
        assert!(!found.is_created());
        assert_eq!(created.get().id(), found.get().id());
        assert_eq!(found.get().email(), "zhangsan@email.com");
        assert_eq!(repository.count_authors().unwrap(), 1);
    }

    #[test]
    fn find_or_create_category_keeps_existing_description() {
        let repository = memory_repository();

        repository.find_or_create_category(&NewCategory::new("科技".into(), "技術相關書籍".into())).unwrap();
        let found = repository.find_or_create_category(&NewCategory::new("科技".into(), "".into())).unwrap();

        assert!(!found.is_created());
        assert_eq!(found.get().description(), "技術相關書籍");
    }

    #[test]
    fn book_round_trips_price_and_names() {
        let repository = memory_repository();
        let author = repository.find_or_create_author(
            &NewAuthor::new("A".into(), "a@x.com".into(), None)
        ).unwrap().into_inner();
        let category = repository.find_or_create_category(
            &NewCategory::new("C".into(), "".into())
        ).unwrap().into_inner();

        let book = NewBook::new("T".into(), &author, &category, date("2020-01-01"), Decimal::new(999, 2));
        let created = repository.find_or_create_book(&book).unwrap();
        let again = repository.find_or_create_book(&book).unwrap();

        assert!(created.is_created());
        assert!(!again.is_created());

        let details = repository.find_all_book_details().unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].book().price(), Decimal::new(999, 2));
        assert!(details[0].book().is_available());
        assert_eq!(details[0].author_name(), "A");
        assert_eq!(details[0].category_name(), "C");
        assert_eq!(repository.counts().unwrap().total(), 3);
    }

    #[test]
    fn book_with_unknown_references_is_rejected_by_storage() {
        let repository = memory_repository();
        let ghost_author = Author::new(99, "ghost".into(), "".into(), None);
        let ghost_category = Category::new(99, "ghost".into(), "".into());
        let book = NewBook::new("T".into(), &ghost_author, &ghost_category, date("2020-01-01"), Decimal::ONE);

        let result = repository.find_or_create_book(&book);

        assert!(matches!(result, Err(RepositoryError::SqlExecuteError(_))));
        assert_eq!(repository.count_books().unwrap(), 0);
    }
}
