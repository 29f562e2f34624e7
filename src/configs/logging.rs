use serde::Deserialize;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoggingError {
    #[error("로그 레벨(level)은 \"TRACE\", \"DEBUG\", \"INFO\", \"WARN\", \"ERROR\"만 가능 합니다. (입력값: {0})")]
    InvalidLevel(String),

    #[error("로깅 파일 로테이션(rotation)은 \"DAILY\", \"HOURLY\", \"MINUTELY\", \"NEVER\"만 가능 합니다. (입력값: {0})")]
    InvalidRotation(String),

    #[error("failed to create log file appender: {0}")]
    AppenderError(String),

    #[error("failed to install global subscriber: {0}")]
    InitError(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// 로그 파일을 저장할 디렉토리로 설정하지 않으면 stdout에만 로그를 출력한다.
    pub dir: Option<String>,

    pub name: String,

    /// 최대 로그 파일 개수로 로그 파일이 설정한 개수보다 커질 경우 기존의 로그파일들은 삭제 된다.
    /// 설정 되지 않을 시 로그 파일은 삭제 되지 않는다.
    pub keep: Option<usize>,

    /// 파일과 stdout에 출력할 로그의 레벨로 지정된 로그 레벨 이상만 로깅된다.
    /// 설정하지 않을시 기본값은 DEBUG로 설정 된다.
    ///
    /// 이 값은 [`tracing::Level`]로 변환 됨으로 자세한 사항은 해당 파일을 확인
    pub level: Option<String>,

    /// 로깅 파일이 분리 되는 기간으로 .log 파일 하나 당 설정된 기간 동안 로그가 기록 된다.
    /// 설정 되지 않을시 기본값은 DAILY로 설정된다.
    ///
    /// 이 값은 [`rolling::Rotation`]으로 변환 됨으로 자세한 사항은 해당 파일을 확인
    pub rotation: Option<String>,
}

/// 전역 로거를 설정한다.
///
/// 파일 로그를 사용하는 경우 반환되는 [`WorkerGuard`]가 drop 되면 남은 로그가 기록되지 않음으로
/// 프로그램이 끝날 때까지 가지고 있어야 한다.
pub fn set_global_logging_config(c: &Config) -> Result<Option<WorkerGuard>, LoggingError> {
    let level = match &c.level {
        Some(level) => parse_level(level)?,
        None => tracing::Level::DEBUG,
    };
    let timer = LocalTime::new(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"));

    let Some(dir) = &c.dir else {
        tracing_subscriber::fmt()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true)
            .with_span_list(true)
            .with_timer(timer)
            .with_max_level(level)
            .with_writer(std::io::stdout)
            .try_init()
            .map_err(|e| LoggingError::InitError(e.to_string()))?;
        return Ok(None);
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

    let file_appender = file_appender.build(dir)
        .map_err(|e| LoggingError::AppenderError(e.to_string()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let writer = std::io::stdout.and(non_blocking);

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
        .map_err(|e| LoggingError::InitError(e.to_string()))?;

    Ok(Some(guard))
}

fn parse_rotation(s: &str) -> Result<rolling::Rotation, LoggingError> {
    match s.to_uppercase().as_str() {
        "DAILY" => Ok(rolling::Rotation::DAILY),
        "HOURLY" => Ok(rolling::Rotation::HOURLY),
        "MINUTELY" => Ok(rolling::Rotation::MINUTELY),
        "NEVER" => Ok(rolling::Rotation::NEVER),
        _ => Err(LoggingError::InvalidRotation(s.to_owned())),
    }
}

fn parse_level(l: &str) -> Result<tracing::Level, LoggingError> {
    match l.to_uppercase().as_str() {
        "TRACE" => Ok(tracing::Level::TRACE),
        "DEBUG" => Ok(tracing::Level::DEBUG),
        "INFO" => Ok(tracing::Level::INFO),
        "WARN" => Ok(tracing::Level::WARN),
        "ERROR" => Ok(tracing::Level::ERROR),
        _ => Err(LoggingError::InvalidLevel(l.to_owned())),
    }
}
