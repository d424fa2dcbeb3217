mod csv_table;
mod json_dump;
mod text_report;

use crate::item::{Author, BookDetail, CatalogCounts, CatalogRepository, Category, RepositoryError};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

pub use self::text_report::PriceStatistics;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 내보내기 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// 전체 데이터 JSON 파일
    Json,
    /// 엔티티별 CSV 파일 3개
    Csv,
    /// 텍스트 보고서
    Report,
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Report => write!(f, "report"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 내보내기 시점의 카탈로그 전체 데이터
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    counts: CatalogCounts,
    authors: Vec<Author>,
    categories: Vec<Category>,
    books: Vec<BookDetail>,
}

impl CatalogSnapshot {
    pub fn load<R: CatalogRepository>(repository: &R) -> Result<Self, RepositoryError> {
        Ok(Self {
            counts: repository.counts()?,
            authors: repository.find_all_authors()?,
            categories: repository.find_all_categories()?,
            books: repository.find_all_book_details()?,
        })
    }

    pub fn counts(&self) -> CatalogCounts {
        self.counts
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn books(&self) -> &[BookDetail] {
        &self.books
    }
}

/// 형식 하나의 내보내기 결과
#[derive(Debug)]
pub struct ExportOutcome {
    format: ExportFormat,
    result: Result<Vec<PathBuf>, ExportError>,
}

impl ExportOutcome {
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// 성공시 생성된 파일 경로
    pub fn result(&self) -> &Result<Vec<PathBuf>, ExportError> {
        &self.result
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub struct ExportSummary {
    base_name: String,
    export_time: NaiveDateTime,
    outcomes: Vec<ExportOutcome>,
}

impl ExportSummary {
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn outcomes(&self) -> &[ExportOutcome] {
        &self.outcomes
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.success_count() == self.outcomes.len()
    }

    pub fn any_succeeded(&self) -> bool {
        self.success_count() > 0
    }
}

impl Display for ExportSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let line = "=".repeat(50);
        writeln!(f, "{}", line)?;
        writeln!(f, "資料匯出摘要")?;
        writeln!(f, "{}", line)?;
        writeln!(f, "匯出時間: {}", self.export_time.format(TIME_FORMAT))?;
        writeln!(f, "成功項目: {}/{}", self.success_count(), self.outcomes.len())?;
        writeln!(f, "基礎檔名: {}", self.base_name)?;
        if self.is_complete() {
            writeln!(f, "所有匯出操作都成功完成！")?;
        } else {
            writeln!(f, "部分匯出操作失敗，請檢查錯誤訊息")?;
        }

        writeln!(f)?;
        writeln!(f, "生成的檔案:")?;
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(paths) => {
                    for path in paths {
                        writeln!(f, "  {}", path.display())?;
                    }
                }
                Err(e) => writeln!(f, "  ({} 失敗: {})", outcome.format, e)?,
            }
        }
        write!(f, "{}", line)
    }
}

/// 카탈로그 전체를 JSON, CSV, 텍스트 보고서로 내보낸다.
///
/// 내보내기 시각은 생성 시점에 한번만 정해지며 기본 파일명과 각 파일의 시각 표기에 같은 값이 사용된다.
/// 각 형식은 독립적으로 실행되어 한 형식의 실패가 다른 형식에 영향을 주지 않는다.
pub struct Exporter<'a, R: CatalogRepository> {
    repository: &'a R,
    dir: PathBuf,
    export_time: NaiveDateTime,
}

impl<'a, R: CatalogRepository> Exporter<'a, R> {
    pub fn new(repository: &'a R, dir: &Path) -> Self {
        Self::with_export_time(repository, dir, chrono::Local::now().naive_local())
    }

    pub fn with_export_time(repository: &'a R, dir: &Path, export_time: NaiveDateTime) -> Self {
        Self { repository, dir: dir.to_owned(), export_time }
    }

    pub fn export_time(&self) -> NaiveDateTime {
        self.export_time
    }

    /// `data_export_YYYYMMDD_HHMMSS`
    pub fn default_base_name(&self) -> String {
        format!("data_export_{}", self.export_time.format("%Y%m%d_%H%M%S"))
    }

    pub fn export_all(&self, base_name: &str, formats: &[ExportFormat]) -> ExportSummary {
        info!(base_name, dir = %self.dir.display(), "export started");

        let mut requested: Vec<ExportFormat> = Vec::new();
        for format in formats {
            if !requested.contains(format) {
                requested.push(*format);
            }
        }

        let outcomes = requested.into_iter()
            .map(|format| {
                let result = self.export(format, base_name);
                match &result {
                    Ok(paths) => info!(%format, files = paths.len(), "export finished"),
                    Err(e) => error!(%format, error = %e, "export failed"),
                }
                ExportOutcome { format, result }
            })
            .collect();

        ExportSummary {
            base_name: base_name.to_owned(),
            export_time: self.export_time,
            outcomes,
        }
    }

    pub fn export(&self, format: ExportFormat, base_name: &str) -> Result<Vec<PathBuf>, ExportError> {
        match format {
            ExportFormat::Json => self.export_json(base_name).map(|path| vec![path]),
            ExportFormat::Csv => self.export_csv(base_name),
            ExportFormat::Report => self.export_report(base_name).map(|path| vec![path]),
        }
    }

    pub fn export_json(&self, base_name: &str) -> Result<PathBuf, ExportError> {
        let snapshot = CatalogSnapshot::load(self.repository)?;
        let path = self.dir.join(format!("{}.json", base_name));

        json_dump::write(&path, &snapshot, self.export_time)?;
        Ok(path)
    }

    pub fn export_csv(&self, base_name: &str) -> Result<Vec<PathBuf>, ExportError> {
        let snapshot = CatalogSnapshot::load(self.repository)?;
        let authors = self.dir.join(format!("{}_authors.csv", base_name));
        let categories = self.dir.join(format!("{}_categories.csv", base_name));
        let books = self.dir.join(format!("{}_books.csv", base_name));

        csv_table::write_authors(&authors, snapshot.authors())?;
        csv_table::write_categories(&categories, snapshot.categories())?;
        csv_table::write_books(&books, snapshot.books())?;
        Ok(vec![authors, categories, books])
    }

    pub fn export_report(&self, base_name: &str) -> Result<PathBuf, ExportError> {
        let snapshot = CatalogSnapshot::load(self.repository)?;
        let path = self.dir.join(format!("{}_report.txt", base_name));

        let report = text_report::render(&snapshot, base_name, self.export_time);
        std::fs::write(&path, report)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::catalog::{BookDraft, CleanRecord};
    use crate::batch::catalog::importer::CatalogWriter;
    use crate::batch::Writer;
    use crate::item::repo::testing::memory_repository;
    use crate::item::repo::DieselCatalogRepository;
    use crate::item::{NewAuthor, NewCategory};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn export_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_micro_opt(9, 30, 5, 123456).unwrap()
    }

    fn seeded_repository() -> DieselCatalogRepository {
        let repository = memory_repository();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        CatalogWriter::new(repository.clone())
            .do_write(vec![
                CleanRecord::Author(NewAuthor::new("A".into(), "a@x.com".into(), None)),
                CleanRecord::Category(NewCategory::new("C".into(), "".into())),
                CleanRecord::Book(BookDraft::new("T".into(), "A".into(), "C".into(), date, Decimal::new(999, 2))),
            ])
            .unwrap();
        repository
    }

    #[test]
    fn default_base_name_uses_export_time() {
        let repository = memory_repository();
        let exporter = Exporter::with_export_time(&repository, Path::new("."), export_time());

        assert_eq!(exporter.default_base_name(), "data_export_20240301_093005");
    }

    #[test]
    fn export_all_writes_every_file() {
        let repository = seeded_repository();
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::with_export_time(&repository, dir.path(), export_time());

        let summary = exporter.export_all("out", &[ExportFormat::Json, ExportFormat::Csv, ExportFormat::Report]);

        assert!(summary.is_complete());
        for name in ["out.json", "out_authors.csv", "out_categories.csv", "out_books.csv", "out_report.txt"] {
            assert!(dir.path().join(name).is_file(), "{} missing", name);
        }
    }

    #[test]
    fn failing_format_does_not_stop_others() {
        let repository = seeded_repository();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out.json")).unwrap();
        let exporter = Exporter::with_export_time(&repository, dir.path(), export_time());

        let summary = exporter.export_all("out", &[ExportFormat::Json, ExportFormat::Csv, ExportFormat::Report]);

        assert_eq!(summary.success_count(), 2);
        assert!(!summary.is_complete());
        assert!(summary.any_succeeded());
        assert!(matches!(summary.outcomes()[0].result(), Err(ExportError::Io(_))));
        assert!(dir.path().join("out_books.csv").is_file());
        assert!(dir.path().join("out_report.txt").is_file());
    }

    #[test]
    fn repeated_formats_are_exported_once() {
        let repository = seeded_repository();
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::with_export_time(&repository, dir.path(), export_time());

        let summary = exporter.export_all("out", &[ExportFormat::Report, ExportFormat::Report]);

        assert_eq!(summary.outcomes().len(), 1);
        assert_eq!(summary.outcomes()[0].format(), ExportFormat::Report);
    }

    #[test]
    fn summary_lists_generated_files() {
        let repository = seeded_repository();
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::with_export_time(&repository, dir.path(), export_time());

        let printed = exporter.export_all("out", &[ExportFormat::Csv]).to_string();

        assert!(printed.contains("成功項目: 1/1"));
        assert!(printed.contains("out_categories.csv"));
    }
}
