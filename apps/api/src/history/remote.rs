//! Remote-backed history source in PostgreSQL (`tailored_resumes` table).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::history::{HistoryError, HistoryFlag};
use crate::models::history::{HistoryEntry, TailoredResumeRow};

#[async_trait]
pub trait RemoteHistory: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<HistoryEntry>, HistoryError>;
    async fn insert(&self, entry: &HistoryEntry) -> Result<(), HistoryError>;
    /// Returns `false` when no row has this id.
    async fn set_flag(&self, id: Uuid, flag: HistoryFlag, value: bool)
        -> Result<bool, HistoryError>;
}

pub struct PgRemoteHistory {
    pool: PgPool,
}

impl PgRemoteHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteHistory for PgRemoteHistory {
    async fn fetch_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let rows = sqlx::query_as::<_, TailoredResumeRow>(
            "SELECT * FROM tailored_resumes ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    async fn insert(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        let tags: Vec<String> = entry.tags.iter().cloned().collect();
        sqlx::query(
            r#"
            INSERT INTO tailored_resumes
                (id, title, company, job_description, original_resume, tailored_resume,
                 match_score, tags, suggestions, is_favorite, is_downloaded, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(&entry.title)
        .bind(&entry.company)
        .bind(&entry.outcome.job_description)
        .bind(&entry.outcome.original_resume)
        .bind(&entry.outcome.tailored_resume)
        .bind(i16::from(entry.outcome.match_score))
        .bind(&tags)
        .bind(&entry.outcome.suggestions)
        .bind(entry.is_favorite)
        .bind(entry.is_downloaded)
        .bind(entry.outcome.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_flag(
        &self,
        id: Uuid,
        flag: HistoryFlag,
        value: bool,
    ) -> Result<bool, HistoryError> {
        let sql = match flag {
            HistoryFlag::Favorite => "UPDATE tailored_resumes SET is_favorite = $1 WHERE id = $2",
            HistoryFlag::Downloaded => {
                "UPDATE tailored_resumes SET is_downloaded = $1 WHERE id = $2"
            }
        };
        let result = sqlx::query(sql)
            .bind(value)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
