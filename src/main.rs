use anyhow::Context;
use book_records::configs;
use book_records::configs::database::{connect_to_database, run_migrations};
use book_records::configs::logging::set_global_logging_config;
use book_records::item::repo::{DbPool, DieselBookRepository, DieselPublishingDateRepository};
use book_records::{seed, web};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Book and publishing date records", long_about = None)]
struct Cli {
    /// 설정 파일 경로, 지정하지 않으면 config/{RUN_MODE}.json 을 사용한다.
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// 웹 서버 실행
    #[default]
    Serve,

    /// 비어있는 데이터베이스에 샘플 데이터를 넣는다.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    configs::load_dotenv();
    let config = configs::load_config(cli.config.as_deref())
        .context("cannot load config")?;

    let _guard = set_global_logging_config(config.logger())
        .context("cannot initialize logger")?;

    let pool = connect_to_database(config.db())
        .context("cannot connect to database")?;
    run_migrations(&pool)?;

    match cli.command.unwrap_or_default() {
        Command::Serve => {
            if config.seed() {
                load_sample_data(&pool)?;
            }
            web::serve(config.server(), pool).await
                .context("server terminated with error")?;
        }
        Command::Seed => load_sample_data(&pool)?,
    }

    info!("shutdown complete");
    Ok(())
}

fn load_sample_data(pool: &DbPool) -> anyhow::Result<()> {
    let books = DieselBookRepository::new(pool.clone());
    let publishing_dates = DieselPublishingDateRepository::new(pool.clone());

    seed::load_sample_data(&books, &publishing_dates)
        .context("cannot load sample data")?;
    Ok(())
}
