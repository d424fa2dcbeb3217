use crate::export::{CatalogSnapshot, TIME_FORMAT};
use crate::item::BookDetail;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};

/// 도서 가격 통계
///
/// 최고가, 최저가가 여러 권이면 목록에서 먼저 나온 도서를 사용한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceStatistics {
    highest: (Decimal, String),
    lowest: (Decimal, String),
    average: Decimal,
}

impl PriceStatistics {
    /// 도서가 없으면 `None`
    pub fn from_books(books: &[BookDetail]) -> Option<Self> {
        let (first, rest) = books.split_first()?;
        let first = first.book();

        let mut highest = first;
        let mut lowest = first;
        let mut sum = first.price();
        for detail in rest {
            let book = detail.book();
            if book.price() > highest.price() {
                highest = book;
            }
            if book.price() < lowest.price() {
                lowest = book;
            }
            sum += book.price();
        }

        Some(Self {
            highest: (highest.price(), highest.title().to_owned()),
            lowest: (lowest.price(), lowest.title().to_owned()),
            average: (sum / Decimal::from(books.len())).round_dp(2),
        })
    }

    pub fn highest(&self) -> (Decimal, &str) {
        (self.highest.0, &self.highest.1)
    }

    pub fn lowest(&self) -> (Decimal, &str) {
        (self.lowest.0, &self.lowest.1)
    }

    pub fn average(&self) -> Decimal {
        self.average
    }
}

struct Report<'a> {
    snapshot: &'a CatalogSnapshot,
    base_name: &'a str,
    export_time: NaiveDateTime,
}

impl Report<'_> {
    fn books_by<F: Fn(&BookDetail) -> i64>(&self, key: F) -> HashMap<i64, usize> {
        let mut counts = HashMap::new();
        for detail in self.snapshot.books() {
            *counts.entry(key(detail)).or_insert(0) += 1;
        }
        counts
    }
}

const DIVIDER_WIDTH: usize = 9;

fn section(f: &mut Formatter<'_>, title: &str, width: usize) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    writeln!(f, "{}", "-".repeat(width))
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let counts = self.snapshot.counts();

        writeln!(f, "資料匯出詳細報告")?;
        writeln!(f, "{}", "=".repeat(16))?;
        writeln!(f)?;

        section(f, "基本資訊", DIVIDER_WIDTH)?;
        writeln!(f, "匯出時間: {}", self.export_time.format(TIME_FORMAT))?;
        writeln!(f, "匯出檔案基礎名稱: {}", self.base_name)?;
        writeln!(f)?;

        section(f, "資料統計", DIVIDER_WIDTH)?;
        writeln!(f, "{}", counts)?;
        writeln!(f)?;

        section(f, "作者列表", DIVIDER_WIDTH)?;
        let by_author = self.books_by(|d| d.book().author_id());
        for author in self.snapshot.authors() {
            let count = by_author.get(&author.id()).copied().unwrap_or(0);
            writeln!(f, "- {} ({}) - 著作: {}本", author.name(), author.email(), count)?;
        }
        writeln!(f)?;

        section(f, "分類列表", DIVIDER_WIDTH)?;
        let by_category = self.books_by(|d| d.book().category_id());
        for category in self.snapshot.categories() {
            let count = by_category.get(&category.id()).copied().unwrap_or(0);
            writeln!(f, "- {} - 書籍: {}本", category.name(), count)?;
            if !category.description().is_empty() {
                writeln!(f, "  描述: {}", category.description())?;
            }
        }
        writeln!(f)?;

        section(f, "書籍價格統計", 12)?;
        match PriceStatistics::from_books(self.snapshot.books()) {
            Some(stats) => {
                writeln!(f, "最高價格: {:.2} ({})", stats.highest.0, stats.highest.1)?;
                writeln!(f, "最低價格: {:.2} ({})", stats.lowest.0, stats.lowest.1)?;
                writeln!(f, "平均價格: {:.2}", stats.average)?;
            }
            None => writeln!(f, "無書籍資料")?,
        }
        writeln!(f)?;

        section(f, "匯出檔案", DIVIDER_WIDTH)?;
        writeln!(f, "1. {}.json - JSON格式完整資料", self.base_name)?;
        writeln!(f, "2. {}_authors.csv - 作者資料表", self.base_name)?;
        writeln!(f, "3. {}_categories.csv - 分類資料表", self.base_name)?;
        writeln!(f, "4. {}_books.csv - 書籍資料表", self.base_name)?;
        writeln!(f, "5. {}_report.txt - 本報告檔案", self.base_name)?;
        writeln!(f)?;

        section(f, "注意事項", DIVIDER_WIDTH)?;
        writeln!(f, "- 所有檔案使用UTF-8編碼")?;
        writeln!(f, "- CSV檔案適合用Excel開啟編輯")?;
        writeln!(f, "- JSON檔案包含完整的資料關係")?;
        writeln!(f, "- 建議定期備份重要資料")
    }
}

pub fn render(snapshot: &CatalogSnapshot, base_name: &str, export_time: NaiveDateTime) -> String {
    Report { snapshot, base_name, export_time }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Author, Book, CatalogCounts, Category};
    use chrono::NaiveDate;

    fn detail(id: i64, title: &str, author_id: i64, category_id: i64, cents: i64) -> BookDetail {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        BookDetail::new(
            Book::new(id, title.into(), author_id, category_id, date, Decimal::new(cents, 2), true),
            "A".into(),
            "C".into(),
        )
    }

    fn export_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 30, 5).unwrap()
    }

    #[test]
    fn price_statistics_over_three_books() {
        let books = vec![detail(1, "B", 1, 1, 2000), detail(2, "A", 1, 1, 1000), detail(3, "C", 1, 1, 3000)];

        let stats = PriceStatistics::from_books(&books).unwrap();

        assert_eq!(stats.highest(), (Decimal::new(3000, 2), "C"));
        assert_eq!(stats.lowest(), (Decimal::new(1000, 2), "A"));
        assert_eq!(stats.average(), Decimal::new(2000, 2));
    }

    #[test]
    fn price_tie_keeps_first_book() {
        let books = vec![detail(1, "first", 1, 1, 500), detail(2, "second", 1, 1, 500)];

        let stats = PriceStatistics::from_books(&books).unwrap();

        assert_eq!(stats.highest().1, "first");
        assert_eq!(stats.lowest().1, "first");
    }

    #[test]
    fn average_is_rounded_to_two_places() {
        let books = vec![detail(1, "a", 1, 1, 1000), detail(2, "b", 1, 1, 1000), detail(3, "c", 1, 1, 1001)];

        assert_eq!(PriceStatistics::from_books(&books).unwrap().average(), Decimal::new(1000, 2));
    }

    #[test]
    fn report_lists_entities_and_prices() {
        let snapshot = CatalogSnapshot {
            counts: CatalogCounts::new(2, 2, 3),
            authors: vec![
                Author::new(1, "張三".into(), "zhangsan@email.com".into(), None),
                Author::new(2, "李四".into(), "lisi@email.com".into(), None),
            ],
            categories: vec![
                Category::new(1, "科技".into(), "技術相關書籍".into()),
                Category::new(2, "文學".into(), "".into()),
            ],
            books: vec![detail(1, "B", 1, 1, 2000), detail(2, "A", 1, 2, 1000), detail(3, "C", 1, 1, 3000)],
        };

        let report = render(&snapshot, "out", export_time());

        assert!(report.contains("匯出時間: 2024-03-01 09:30:05"));
        assert!(report.contains("匯出檔案基礎名稱: out"));
        assert!(report.contains("總記錄數: 7"));
        assert!(report.contains("- 張三 (zhangsan@email.com) - 著作: 3本"));
        assert!(report.contains("- 李四 (lisi@email.com) - 著作: 0本"));
        assert!(report.contains("- 科技 - 書籍: 2本\n  描述: 技術相關書籍\n"));
        assert!(report.contains("- 文學 - 書籍: 1本\n\n"));
        assert!(report.contains("最高價格: 30.00 (C)"));
        assert!(report.contains("最低價格: 10.00 (A)"));
        assert!(report.contains("平均價格: 20.00"));
        assert!(report.contains("5. out_report.txt"));
        assert!(report.contains("分類列表:\n---------\n"));
        assert!(report.contains("書籍價格統計:\n------------\n"));
    }

    #[test]
    fn empty_catalog_shows_placeholder() {
        let snapshot = CatalogSnapshot {
            counts: CatalogCounts::new(0, 0, 0),
            authors: vec![],
            categories: vec![],
            books: vec![],
        };

        let report = render(&snapshot, "out", export_time());

        assert!(report.contains("無書籍資料"));
        assert!(!report.contains("最高價格"));
    }
}
