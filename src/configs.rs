use serde::Deserialize;
use std::env;
use std::time::Duration;

pub mod database;
pub mod logging;

const DEFAULT_RUN_MODE: &str = "development";

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    host: String,
    port: u16,

    /// 마지막 요청 이후 세션을 유지할 시간(초)
    session_ttl_secs: u64,
}

impl Server {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    server: Server,
    db: database::Config,
    logger: logging::Config,

    /// 테이블이 비어있을 경우 샘플 데이터를 넣을지 여부
    #[serde(default)]
    seed: bool,
}

impl AppConfig {
    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn db(&self) -> &database::Config {
        &self.db
    }

    pub fn logger(&self) -> &logging::Config {
        &self.logger
    }

    pub fn seed(&self) -> bool {
        self.seed
    }
}

/// 실행 환경에 따라 .env 파일을 로드한다.
pub fn load_dotenv() {
    let env_filename = env::var("RUN_MODE")
        .map(|env| format!(".env.{}", env))
        .unwrap_or_else(|_| ".env".into());

    dotenvy::from_filename(env_filename).ok();
}

pub fn run_mode() -> String {
    env::var("RUN_MODE").unwrap_or_else(|_| DEFAULT_RUN_MODE.into())
}

/// 설정 파일을 읽는다.
///
/// `path`가 없으면 `config/{RUN_MODE}.json`을 사용하며, `BOOKS__DB__URL`과 같이 `BOOKS__`로 시작하는
/// 환경 변수가 파일의 값을 덮어쓴다.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, config::ConfigError> {
    let file = match path {
        Some(path) => path.to_owned(),
        None => format!("config/{}.json", run_mode()),
    };

    let config = config::Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.session_ttl_secs", 1800)?
        .set_default("logger.name", "book-records")?
        .add_source(config::File::with_name(&file))
        .add_source(
            config::Environment::with_prefix("BOOKS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
        )
        .build()?;

    config.try_deserialize()
}
