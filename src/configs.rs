use crate::export::ExportFormat;
use crate::item::repo::SqlitePool;
use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use diesel::sqlite::SqliteConnection;
use r2d2::{CustomizeConnection, Pool};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub mod logging;

const DEFAULT_RUN_MODE: &str = "development";
const ENV_PREFIX: &str = "CATALOG";

/// 실행 환경에 따라 .env 파일을 로드한다.
pub fn load_dotenv() {
    let env_filename = env::var("RUN_MODE")
        .map(|env| format!(".env.{}", env))
        .unwrap_or_else(|_| ".env".into());

    dotenvy::from_filename(env_filename).ok();
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    url: String,
    pool_size: u32,
}

impl Database {
    pub fn new(url: &str, pool_size: u32) -> Self {
        Self { url: url.to_owned(), pool_size }
    }

    /// SQLite 데이터베이스 파일 경로, `:memory:`일 경우 인메모리 데이터베이스를 사용한다.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Import {
    input: PathBuf,
}

impl Import {
    /// 시드(seed) JSON 파일 경로
    pub fn input(&self) -> &Path {
        &self.input
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Export {
    dir: PathBuf,
    formats: Vec<ExportFormat>,
}

impl Export {
    /// 내보내기 파일이 생성될 디렉토리
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn formats(&self) -> &[ExportFormat] {
        &self.formats
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stats {
    min_books: i64,
}

impl Stats {
    /// 카탈로그가 갖춰야 할 최소 도서 수
    pub fn min_books(&self) -> i64 {
        self.min_books
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    database: Database,
    import: Import,
    export: Export,
    stats: Stats,
    logger: Option<logging::Config>,
}

impl AppConfig {
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn import(&self) -> &Import {
        &self.import
    }

    pub fn export(&self) -> &Export {
        &self.export
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn logger(&self) -> Option<&logging::Config> {
        self.logger.as_ref()
    }
}

/// 기본값, `config/{RUN_MODE}.json`, `CATALOG_` 접두사 환경 변수 순으로 설정을 덮어쓴다.
///
/// 환경 변수의 중첩 키는 `__`로 구분한다. (예: `CATALOG_DATABASE__URL`)
pub fn load_config() -> Result<AppConfig, config::ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| DEFAULT_RUN_MODE.into());
    let config = config::Config::builder()
        .set_default("database.url", "catalog.sqlite3")?
        .set_default("database.pool_size", 4i64)?
        .set_default("import.input", "sample_data.json")?
        .set_default("export.dir", ".")?
        .set_default("export.formats", vec!["json", "csv", "report"])?
        .set_default("stats.min_books", 20i64)?
        .add_source(config::File::with_name(&format!("config/{}.json", run_mode)).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("export.formats")
                .try_parsing(true)
        )
        .build()?;

    config.try_deserialize()
}

/// 커넥션을 얻을 때마다 외래키 제약과 잠금 대기 시간을 설정한다.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// 데이터베이스 연결 풀을 생성한다.
pub fn connect_to_database(db: &Database) -> Result<SqlitePool, r2d2::Error> {
    let manager = ConnectionManager::<SqliteConnection>::new(db.url());

    Pool::builder()
        .max_size(db.pool_size())
        .test_on_check_out(true)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
}
