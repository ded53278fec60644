//! Shared test helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use reviewdesk::analysis::Analyzer;
use reviewdesk::config::ReviewConfig;
use reviewdesk::dashboard::{self, AppState};
use reviewdesk::repository::{MemoryRepository, ReviewRepository};
use reviewdesk::review::{Analysis, CeloIntegration, CodeQuality, ProjectDescriptor};
use reviewdesk::ReviewError;

/// Returns the test database URL from the `TEST_DATABASE_URL` environment variable.
/// Panics if the variable is not set.
pub fn test_db_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for integration tests")
}

/// Returns true if the test database URL is configured.
pub fn has_test_db() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

static SCHEMA_INIT: OnceCell<()> = OnceCell::const_new();

/// Apply `supabase/migrations/*.sql` once per test binary.
pub async fn ensure_schema() {
    SCHEMA_INIT
        .get_or_init(|| async {
            let pool = sqlx::PgPool::connect(&test_db_url()).await.unwrap();
            run_migrations(&pool).await;
        })
        .await;
}

/// Connect to the test database with empty tables.
pub async fn setup_test_db() -> reviewdesk::db::Database {
    ensure_schema().await;
    let db = reviewdesk::db::Database::connect(&test_db_url())
        .await
        .expect("Failed to connect to test database");
    sqlx::raw_sql("TRUNCATE TABLE projects, reviews CASCADE")
        .execute(db.pool())
        .await
        .unwrap();
    db
}

async fn run_migrations(pool: &sqlx::PgPool) {
    let mut files: Vec<PathBuf> = std::fs::read_dir("supabase/migrations")
        .expect("supabase/migrations not found")
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    files.sort();
    for file in &files {
        let sql = std::fs::read_to_string(file).unwrap();
        sqlx::raw_sql(&sql).execute(pool).await.unwrap_or_else(|e| {
            panic!("Migration {} failed: {}", file.display(), e);
        });
    }
}

/// A descriptor as the analysis agent would emit it.
pub fn descriptor(name: &str, ai_score: f64) -> ProjectDescriptor {
    ProjectDescriptor {
        project_name: name.to_string(),
        project_description: format!("{} on Celo", name),
        project_github_url: format!("https://github.com/acme/{}", name.to_lowercase()),
        project_owner_github_url: "https://github.com/acme".to_string(),
        project_url: format!("https://{}.example", name.to_lowercase()),
        analysis: Analysis {
            code_quality: CodeQuality {
                overall_score: ai_score,
                extra: Default::default(),
            },
            celo_integration: CeloIntegration {
                integrated: true,
                evidence: vec!["uses ContractKit".to_string()],
                extra: Default::default(),
            },
            extra: Default::default(),
        },
    }
}

/// Analyzer returning a fixed result and remembering the artifacts it saw,
/// with their contents at analysis time.
pub struct FakeAnalyzer {
    result: Result<Vec<ProjectDescriptor>, String>,
    pub seen: Mutex<Vec<PathBuf>>,
    pub contents: Mutex<Vec<Vec<u8>>>,
}

impl FakeAnalyzer {
    pub fn returning(projects: Vec<ProjectDescriptor>) -> Arc<Self> {
        Arc::new(FakeAnalyzer {
            result: Ok(projects),
            seen: Mutex::new(Vec::new()),
            contents: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(FakeAnalyzer {
            result: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
            contents: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _title: &str,
        artifact: &Path,
    ) -> reviewdesk::Result<Vec<ProjectDescriptor>> {
        self.seen.lock().unwrap().push(artifact.to_path_buf());
        self.contents
            .lock()
            .unwrap()
            .push(std::fs::read(artifact).unwrap_or_default());
        self.result.clone().map_err(ReviewError::Analysis)
    }
}

/// Router over an in-memory store; uploads go to `upload_dir`.
pub fn build_memory_app(
    analyzer: Arc<dyn Analyzer>,
    upload_dir: &Path,
) -> (axum::Router, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    let config = ReviewConfig {
        upload_dir: upload_dir.to_path_buf(),
        ingest_concurrency: 1,
        ..ReviewConfig::default()
    };
    let state = AppState::new(&config, repo.clone() as Arc<dyn ReviewRepository>, analyzer);
    (dashboard::build_router(state), repo)
}

/// Router over the test database.
pub async fn build_db_app(analyzer: Arc<dyn Analyzer>, upload_dir: &Path) -> axum::Router {
    let db = setup_test_db().await;
    let config = ReviewConfig {
        upload_dir: upload_dir.to_path_buf(),
        ..ReviewConfig::default()
    };
    let state = AppState::new(&config, Arc::new(db), analyzer);
    dashboard::build_router(state)
}
