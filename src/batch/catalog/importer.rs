use crate::batch::catalog::{BookDraft, CleanRecord};
use crate::batch::error::JobWriteFailed;
use crate::batch::Writer;
use crate::item::{Author, CatalogRepository, Category, NewAuthor, NewBook, NewCategory, RepositoryError, Upserted};
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use tracing::{error, info, warn};

/// 엔티티별 생성/조회 건수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertTally {
    created: usize,
    found: usize,
}

impl UpsertTally {
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn found(&self) -> usize {
        self.found
    }

    fn record<T>(&mut self, upserted: &Upserted<T>) {
        if upserted.is_created() {
            self.created += 1;
        } else {
            self.found += 1;
        }
    }
}

/// 가져오기 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    authors: UpsertTally,
    categories: UpsertTally,
    books: UpsertTally,

    /// 저자나 분류를 찾지 못해 건너뛴 도서 제목
    unresolved: Vec<String>,

    /// 저장소 에러로 저장하지 못한 레코드
    failed: Vec<String>,
}

impl ImportSummary {
    pub fn authors(&self) -> UpsertTally {
        self.authors
    }

    pub fn categories(&self) -> UpsertTally {
        self.categories
    }

    pub fn books(&self) -> UpsertTally {
        self.books
    }

    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }
}

impl Display for ImportSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "作者: 建立 {}, 找到 {}", self.authors.created, self.authors.found)?;
        writeln!(f, "分類: 建立 {}, 找到 {}", self.categories.created, self.categories.found)?;
        writeln!(f, "書籍: 建立 {}, 找到 {}", self.books.created, self.books.found)?;
        writeln!(f, "找不到作者或分類的書籍: {}", self.unresolved.len())?;
        write!(f, "匯入失敗: {}", self.failed.len())
    }
}

/// 정제된 레코드를 자연키 기준으로 저장하는 Writer
///
/// 저자, 분류를 먼저 저장하며 그 결과를 이름 기준으로 기억해 두었다가 도서의 저자, 분류를 찾는데 사용한다.
/// 이 이름 맵은 `do_write` 한번의 호출 동안만 유지된다.
pub struct CatalogWriter<R: CatalogRepository> {
    repository: R,
}

impl<R: CatalogRepository> CatalogWriter<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    fn import_authors(&self, authors: Vec<NewAuthor>, summary: &mut ImportSummary) -> Result<HashMap<String, Author>, JobWriteFailed> {
        let mut author_map = HashMap::new();

        for author in authors {
            match self.repository.find_or_create_author(&author) {
                Ok(upserted) => {
                    info!(name = author.name(), created = upserted.is_created(), "author imported");
                    summary.authors.record(&upserted);
                    author_map.insert(author.name().to_owned(), upserted.into_inner());
                }
                Err(e) => on_failure(summary, format!("author {}", author.name()), e)?,
            }
        }
        Ok(author_map)
    }

    fn import_categories(&self, categories: Vec<NewCategory>, summary: &mut ImportSummary) -> Result<HashMap<String, Category>, JobWriteFailed> {
        let mut category_map = HashMap::new();

        for category in categories {
            match self.repository.find_or_create_category(&category) {
                Ok(upserted) => {
                    info!(name = category.name(), created = upserted.is_created(), "category imported");
                    summary.categories.record(&upserted);
                    category_map.insert(category.name().to_owned(), upserted.into_inner());
                }
                Err(e) => on_failure(summary, format!("category {}", category.name()), e)?,
            }
        }
        Ok(category_map)
    }

    fn import_books(
        &self,
        books: Vec<BookDraft>,
        author_map: &HashMap<String, Author>,
        category_map: &HashMap<String, Category>,
        summary: &mut ImportSummary,
    ) -> Result<(), JobWriteFailed> {
        for draft in books {
            let (Some(author), Some(category)) = (author_map.get(draft.author_name()), category_map.get(draft.category_name())) else {
                warn!(
                    title = draft.title(),
                    author = draft.author_name(),
                    category = draft.category_name(),
                    "cannot find author or category, book skipped"
                );
                summary.unresolved.push(draft.title().to_owned());
                continue;
            };

            let book = NewBook::new(draft.title().to_owned(), author, category, draft.publish_date(), draft.price());
            match self.repository.find_or_create_book(&book) {
                Ok(upserted) => {
                    info!(title = book.title(), created = upserted.is_created(), "book imported");
                    summary.books.record(&upserted);
                }
                Err(e) => on_failure(summary, format!("book {}", book.title()), e)?,
            }
        }
        Ok(())
    }
}

impl<R: CatalogRepository> Writer for CatalogWriter<R> {
    type Item = CleanRecord;
    type Summary = ImportSummary;

    fn do_write(&self, items: Vec<Self::Item>) -> Result<Self::Summary, JobWriteFailed> {
        let mut authors = Vec::new();
        let mut categories = Vec::new();
        let mut books = Vec::new();
        for item in items {
            match item {
                CleanRecord::Author(author) => authors.push(author),
                CleanRecord::Category(category) => categories.push(category),
                CleanRecord::Book(book) => books.push(book),
            }
        }

        info!(authors = authors.len(), categories = categories.len(), books = books.len(), "cleaned records accepted");

        let mut summary = ImportSummary::default();
        let author_map = self.import_authors(authors, &mut summary)?;
        let category_map = self.import_categories(categories, &mut summary)?;
        self.import_books(books, &author_map, &category_map, &mut summary)?;

        info!(created = summary.books.created, "new books created");
        Ok(summary)
    }
}

/// 레코드 하나의 저장 실패는 기록 후 계속 진행하지만, 커넥션을 얻지 못하면 더 진행하지 않는다.
fn on_failure(summary: &mut ImportSummary, record: String, e: RepositoryError) -> Result<(), JobWriteFailed> {
    if let RepositoryError::ConnectError(_) = e {
        return Err(JobWriteFailed::new(&e.to_string()));
    }

    error!(record = %record, error = %e, "cannot import record");
    summary.failed.push(record);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::repo::testing::memory_repository;
    use crate::item::{AuthorRepository, BookRepository, CatalogCounts};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn author(name: &str) -> CleanRecord {
        CleanRecord::Author(NewAuthor::new(name.into(), format!("{}@x.com", name.to_lowercase()), None))
    }

    fn category(name: &str) -> CleanRecord {
        CleanRecord::Category(NewCategory::new(name.into(), "".into()))
    }

    fn book(title: &str, author_name: &str, category_name: &str) -> CleanRecord {
        CleanRecord::Book(BookDraft::new(
            title.into(),
            author_name.into(),
            category_name.into(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            Decimal::new(1000, 2),
        ))
    }

    #[test]
    fn imports_authors_before_books_regardless_of_order() {
        let repository = memory_repository();
        let writer = CatalogWriter::new(repository.clone());

        let summary = writer.do_write(vec![book("T", "A", "C"), category("C"), author("A")]).unwrap();

        assert_eq!(summary.books().created(), 1);
        assert!(summary.unresolved().is_empty());
        assert_eq!(repository.counts().unwrap(), CatalogCounts::new(1, 1, 1));
    }

    #[test]
    fn unresolved_book_is_skipped_without_error() {
        let repository = memory_repository();
        let writer = CatalogWriter::new(repository.clone());

        let summary = writer.do_write(vec![
            author("A"),
            category("C"),
            book("no author", "ghost", "C"),
            book("no category", "A", "ghost"),
        ]).unwrap();

        assert_eq!(summary.unresolved(), &["no author".to_owned(), "no category".to_owned()]);
        assert_eq!(summary.books(), UpsertTally::default());
        assert_eq!(repository.count_books().unwrap(), 0);
    }

    #[test]
    fn second_import_creates_nothing() {
        let repository = memory_repository();
        let writer = CatalogWriter::new(repository.clone());
        let records = vec![author("A"), author("B"), category("C"), book("T1", "A", "C"), book("T2", "B", "C")];

        let first = writer.do_write(records.clone()).unwrap();
        let second = writer.do_write(records).unwrap();

        assert_eq!(first.books().created(), 2);
        assert_eq!(second.authors(), UpsertTally { created: 0, found: 2 });
        assert_eq!(second.categories(), UpsertTally { created: 0, found: 1 });
        assert_eq!(second.books(), UpsertTally { created: 0, found: 2 });
        assert_eq!(repository.counts().unwrap(), CatalogCounts::new(2, 1, 2));
    }

    #[test]
    fn existing_author_is_not_overwritten() {
        let repository = memory_repository();
        let writer = CatalogWriter::new(repository.clone());

        writer.do_write(vec![author("A")]).unwrap();
        writer.do_write(vec![CleanRecord::Author(NewAuthor::new("A".into(), "changed@x.com".into(), None))]).unwrap();

        let authors = repository.find_all_authors().unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].email(), "a@x.com");
    }

    #[test]
    fn duplicate_names_in_one_batch_resolve_to_same_row() {
        let repository = memory_repository();
        let writer = CatalogWriter::new(repository.clone());

        let summary = writer.do_write(vec![author("A"), author("A"), category("C"), book("T", "A", "C")]).unwrap();

        assert_eq!(summary.authors(), UpsertTally { created: 1, found: 1 });
        assert_eq!(repository.count_authors().unwrap(), 1);
        assert_eq!(repository.count_books().unwrap(), 1);
    }
}
