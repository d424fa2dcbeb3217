use serde::Deserialize;
use thiserror::Error;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log level {0:?}, expected TRACE, DEBUG, INFO, WARN or ERROR")]
    UnknownLevel(String),

    #[error("unknown log rotation {0:?}, expected DAILY, HOURLY, MINUTELY or NEVER")]
    UnknownRotation(String),

    #[error("cannot create log file appender: {0}")]
    Appender(#[from] rolling::InitError),

    #[error("cannot install global subscriber: {0}")]
    Init(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    dir: String,
    name: String,

    /// 최대 로그 파일 개수로 로그 파일이 설정한 개수보다 커질 경우 기존의 로그파일들은 삭제 된다.
    /// 설정 되지 않을 시 로그 파일은 삭제 되지 않는다.
    keep: Option<usize>,

    /// 파일과 stderr에 출력할 로그의 레벨로 지정된 로그 레벨 이상만 로깅된다.
    /// 설정하지 않을시 기본값은 DEBUG로 설정 된다.
    ///
    /// 이 값은 [`tracing::Level`]로 변환 됨으로 자세한 사항은 해당 파일을 확인
    level: Option<String>,

    /// 로깅 파일이 분리 되는 기간으로 .log 파일 하나 당 설정된 기간 동안 로그가 기록 된다.
    /// 설정 되지 않을시 기본값은 DAILY로 설정된다.
    ///
    /// 이 값은 [`rolling::Rotation`]으로 변환 됨으로 자세한 사항은 해당 파일을 확인
    rotation: Option<String>,
}

/// 전역 로깅 설정을 적용한다.
///
/// 로거 설정이 있으면 stderr와 롤링 파일에 함께 기록하고, 없으면 INFO 레벨로 stderr에만 기록한다.
/// 파일 로깅시 반환되는 [`WorkerGuard`]는 프로그램이 끝날 때까지 유지해야 남은 로그가 기록된다.
pub fn set_global_logging_config(c: Option<&Config>) -> Result<Option<WorkerGuard>, LoggingError> {
    let timer = LocalTime::new(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"));

    let Some(c) = c else {
        tracing_subscriber::fmt()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_timer(timer)
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
        return Ok(None);
    };

    let level = match &c.level {
        Some(level) => parse_level(level)?,
        None => tracing::Level::DEBUG,
    };
    let rotation = match &c.rotation {
        Some(rotation) => parse_rotation(rotation)?,
        None => rolling::Rotation::DAILY,
    };

    let mut file_appender = rolling::RollingFileAppender::builder()
        .filename_prefix(c.name.clone())
        .filename_suffix("log")
        .rotation(rotation);
    if let Some(keep) = c.keep {
        file_appender = file_appender.max_log_files(keep);
    }
    let file_appender = file_appender.build(c.dir.clone())?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let writer = std::io::stderr.and(non_blocking);

    tracing_subscriber::fmt()
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_timer(timer)
        .with_max_level(level)
        .with_writer(writer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(Some(guard))
}

fn parse_rotation(s: &str) -> Result<rolling::Rotation, LoggingError> {
    match s {
        "DAILY" => Ok(rolling::Rotation::DAILY),
        "HOURLY" => Ok(rolling::Rotation::HOURLY),
        "MINUTELY" => Ok(rolling::Rotation::MINUTELY),
        "NEVER" => Ok(rolling::Rotation::NEVER),
        _ => Err(LoggingError::UnknownRotation(s.to_owned())),
    }
}

fn parse_level(l: &str) -> Result<tracing::Level, LoggingError> {
    match l {
        "TRACE" => Ok(tracing::Level::TRACE),
        "DEBUG" => Ok(tracing::Level::DEBUG),
        "INFO" => Ok(tracing::Level::INFO),
        "WARN" => Ok(tracing::Level::WARN),
        "ERROR" => Ok(tracing::Level::ERROR),
        _ => Err(LoggingError::UnknownLevel(l.to_owned())),
    }
}
