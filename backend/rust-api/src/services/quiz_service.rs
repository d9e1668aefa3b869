use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::models::quiz::{Quiz, QuizDocument, QuizSummary};

/// Owner-scoped access to the "quizzes" collection. Every query filters on
/// `ownerId`; no call path can observe another user's records.
pub struct QuizService {
    mongo: Database,
}

impl QuizService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Stores a parsed quiz for `owner_id` and returns the new record id.
    pub async fn create(&self, quiz: Quiz, owner_id: &ObjectId) -> Result<String> {
        let collection = self.mongo.collection::<QuizDocument>("quizzes");

        let document = QuizDocument {
            id: None, // MongoDB will generate
            title: quiz.title,
            questions: quiz.questions,
            owner_id: *owner_id,
            created_at: Utc::now(),
        };

        let insert_result = collection
            .insert_one(&document)
            .await
            .context("Failed to insert quiz")?;

        let quiz_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted quiz ID"))?;

        tracing::info!(
            quiz_id = %quiz_id.to_hex(),
            owner_id = %owner_id.to_hex(),
            "Quiz stored"
        );

        Ok(quiz_id.to_hex())
    }

    /// Lists the owner's quizzes in upload order.
    pub async fn list_by_owner(&self, owner_id: &ObjectId) -> Result<Vec<QuizSummary>> {
        let collection = self.mongo.collection::<QuizDocument>("quizzes");

        let mut cursor = collection
            .find(doc! { "ownerId": owner_id })
            .sort(doc! { "createdAt": 1 })
            .await
            .context("Failed to query quizzes")?;

        let mut summaries = Vec::new();
        while let Some(quiz) = cursor
            .try_next()
            .await
            .context("Failed to read quiz from cursor")?
        {
            summaries.push(QuizSummary {
                id: quiz.id.map(|id| id.to_hex()).unwrap_or_default(),
                title: quiz.title,
                question_count: quiz.questions.len(),
                created_at: quiz.created_at,
            });
        }

        Ok(summaries)
    }

    /// Fetches one quiz. A record owned by someone else is reported the
    /// same way as a missing one.
    pub async fn get(&self, quiz_id: &str, owner_id: &ObjectId) -> Result<QuizDocument> {
        let object_id = ObjectId::parse_str(quiz_id).context("Invalid quiz ID format")?;

        let collection = self.mongo.collection::<QuizDocument>("quizzes");
        collection
            .find_one(doc! { "_id": object_id, "ownerId": owner_id })
            .await
            .context("Failed to query quiz")?
            .ok_or_else(|| anyhow!("Quiz not found"))
    }

    /// Deletes one of the owner's quizzes.
    pub async fn delete(&self, quiz_id: &str, owner_id: &ObjectId) -> Result<()> {
        let object_id = ObjectId::parse_str(quiz_id).context("Invalid quiz ID format")?;

        let collection = self.mongo.collection::<QuizDocument>("quizzes");
        let result = collection
            .delete_one(doc! { "_id": object_id, "ownerId": owner_id })
            .await
            .context("Failed to delete quiz")?;

        if result.deleted_count == 0 {
            return Err(anyhow!("Quiz not found"));
        }

        tracing::info!(quiz_id = %quiz_id, owner_id = %owner_id.to_hex(), "Quiz deleted");
        Ok(())
    }
}
