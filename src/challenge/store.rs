//! Security question storage keyed by principal identity.
//!
//! The orchestrator only reads from the store (first challenge of every
//! attempt); writes come from the enrollment endpoint. `PostgreSQL` is the
//! production backend, the in-memory store backs tests and local runs.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{Connection, PgPool, Row};
use std::{collections::HashMap, future::Future, pin::Pin};
use tokio::sync::RwLock;
use tracing::{info_span, Instrument};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A stored question and the answer expected for it.
#[derive(Clone, Debug)]
pub struct SecurityQuestion {
    pub question: String,
    pub answer: SecretString,
}

impl SecurityQuestion {
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: SecretString::from(answer.into()),
        }
    }
}

pub trait SecurityQuestionStore: Send + Sync {
    /// Look up the record for `user_id`; `Ok(None)` when nothing is stored.
    fn get<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, Option<SecurityQuestion>>;

    /// Insert or replace the record for `user_id`.
    fn put<'a>(&'a self, user_id: &'a str, record: SecurityQuestion) -> StoreFuture<'a, ()>;

    /// Check that the backend is reachable.
    fn ping(&self) -> StoreFuture<'_, ()>;
}

#[derive(Clone, Debug)]
pub struct PgSecurityQuestionStore {
    pool: PgPool,
}

impl PgSecurityQuestionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SecurityQuestionStore for PgSecurityQuestionStore {
    fn get<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, Option<SecurityQuestion>> {
        Box::pin(async move {
            let query = "SELECT question, answer FROM security_questions WHERE user_id = $1";
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "SELECT",
                db.statement = query
            );
            let row = sqlx::query(query)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .instrument(span)
                .await
                .context("failed to load security question")?;

            let Some(row) = row else {
                return Ok(None);
            };

            let question: String = row.try_get("question")?;
            let answer: String = row.try_get("answer")?;

            Ok(Some(SecurityQuestion {
                question,
                answer: SecretString::from(answer),
            }))
        })
    }

    fn put<'a>(&'a self, user_id: &'a str, record: SecurityQuestion) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let query = r"
                INSERT INTO security_questions (user_id, question, answer)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id) DO UPDATE
                SET question = EXCLUDED.question,
                    answer = EXCLUDED.answer,
                    updated_at = NOW()
            ";
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "INSERT",
                db.statement = query
            );
            sqlx::query(query)
                .bind(user_id)
                .bind(&record.question)
                .bind(record.answer.expose_secret())
                .execute(&self.pool)
                .instrument(span)
                .await
                .context("failed to store security question")?;

            Ok(())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let acquire_span = info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            );
            let mut conn = self
                .pool
                .acquire()
                .instrument(acquire_span)
                .await
                .context("failed to acquire database connection")?;

            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            conn.ping()
                .instrument(ping_span)
                .await
                .context("failed to ping database")?;

            Ok(())
        })
    }
}

#[derive(Debug, Default)]
pub struct MemorySecurityQuestionStore {
    records: RwLock<HashMap<String, SecurityQuestion>>,
}

impl MemorySecurityQuestionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record at construction time.
    #[must_use]
    pub fn with_record(mut self, user_id: &str, record: SecurityQuestion) -> Self {
        self.records
            .get_mut()
            .insert(user_id.to_string(), record);
        self
    }
}

impl SecurityQuestionStore for MemorySecurityQuestionStore {
    fn get<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, Option<SecurityQuestion>> {
        Box::pin(async move { Ok(self.records.read().await.get(user_id).cloned()) })
    }

    fn put<'a>(&'a self, user_id: &'a str, record: SecurityQuestion) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.records
                .write()
                .await
                .insert(user_id.to_string(), record);
            Ok(())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}
