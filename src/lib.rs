use crate::batch::catalog::cleaner::RecordCleaner;
use crate::batch::catalog::importer::{CatalogWriter, ImportSummary};
use crate::batch::catalog::loader::SeedFileReader;
use crate::batch::catalog::{CleanRecord, RawRecord};
use crate::batch::Job;
use crate::item::{CatalogCounts, CatalogRepository, RepositoryError};
use std::fmt;
use std::fmt::{Display, Formatter};

pub mod batch;
pub mod configs;
pub mod export;
pub mod item;

/// 시드 파일을 읽어 정제 후 저장소에 가져오는 잡을 생성한다.
pub fn create_import_job<R>(repository: R, reader: SeedFileReader) -> Job<RawRecord, CleanRecord, ImportSummary>
where
    R: CatalogRepository + 'static,
{
    batch::job_builder()
        .reader(Box::new(reader))
        .processor(Box::new(RecordCleaner))
        .writer(Box::new(CatalogWriter::new(repository)))
        .build()
}

/// 저장소 통계와 최소 도서 수 충족 여부
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    counts: CatalogCounts,
    min_books: i64,
}

impl CatalogStats {
    pub fn counts(&self) -> CatalogCounts {
        self.counts
    }

    pub fn min_books(&self) -> i64 {
        self.min_books
    }

    pub fn meets_requirement(&self) -> bool {
        self.counts.meets_book_requirement(self.min_books)
    }
}

impl Display for CatalogStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.counts)?;
        if self.meets_requirement() {
            write!(f, "已達到至少{}筆書籍記錄的要求", self.min_books)
        } else {
            write!(f, "尚未達到{}筆書籍記錄要求", self.min_books)
        }
    }
}

pub fn collect_stats<R: CatalogRepository>(repository: &R, min_books: i64) -> Result<CatalogStats, RepositoryError> {
    Ok(CatalogStats {
        counts: repository.counts()?,
        min_books,
    })
}
