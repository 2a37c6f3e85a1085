// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSAT feedback sub-flow of the conversation orchestrator.
//!
//! Positive feedback records the signal immediately and offers three
//! optional 1-5 ratings (speed, quality, politeness); negative feedback
//! asks for a comment first. The feedback row is created once per ticket
//! and only enriched afterwards.

use std::sync::Arc;

use opsdesk_core::SupportError;
use opsdesk_core::action::CallbackAction;
use opsdesk_core::keyboard::Keyboard;
use opsdesk_core::types::{ChatId, Csat, RatingDimension};
use opsdesk_storage::Database;
use opsdesk_storage::queries::{feedback as feedback_q, tickets};
use tracing::{info, warn};

use crate::conversation::UserProfile;
use crate::keyboards;
use crate::routing::RoutingService;
use crate::session::SessionStore;
use crate::stage::Stage;
use crate::texts;

/// Collects CSAT signals and detailed ratings.
pub struct FeedbackFlow {
    db: Arc<Database>,
    sessions: Arc<SessionStore>,
    routing: Arc<RoutingService>,
}

impl FeedbackFlow {
    pub fn new(db: Arc<Database>, sessions: Arc<SessionStore>, routing: Arc<RoutingService>) -> Self {
        Self {
            db,
            sessions,
            routing,
        }
    }

    async fn send(
        &self,
        user: &UserProfile,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), SupportError> {
        self.routing
            .gateway()
            .send_text(ChatId(user.chat_id), text, keyboard)
            .await?;
        Ok(())
    }

    /// CSAT button presses.
    pub async fn on_callback(
        &self,
        user: &UserProfile,
        action: CallbackAction,
    ) -> Result<(), SupportError> {
        match action {
            CallbackAction::CsatPositive(ticket_id) => {
                self.record_signal(ticket_id, Csat::Positive, None).await?;
                self.sessions.update(user.user_id, |s| {
                    s.fields.feedback_ticket_id = Some(ticket_id);
                    s.fields.speed_rating = None;
                    s.fields.quality_rating = None;
                    s.fields.politeness_rating = None;
                    s.stage = Some(Stage::RatingSpeed);
                });
                self.send(user, texts::CSAT_THANKS_POSITIVE, None).await?;
                self.send(
                    user,
                    &format!("{}\n\n{}", texts::CSAT_ASK_DETAILED, texts::CSAT_ASK_SPEED),
                    Some(keyboards::csat_detail(ticket_id, RatingDimension::Speed)),
                )
                .await?;
                self.send(user, "Or skip:", Some(keyboards::csat_skip(ticket_id)))
                    .await
            }
            CallbackAction::CsatNegative(ticket_id) => {
                self.sessions.update(user.user_id, |s| {
                    s.fields.feedback_ticket_id = Some(ticket_id);
                    s.stage = Some(Stage::AwaitingFeedbackComment);
                });
                self.send(user, texts::CSAT_ASK_COMMENT, None).await
            }
            CallbackAction::CsatSkipDetailed(_) => {
                self.sessions.clear(user.user_id);
                self.send(
                    user,
                    texts::AFTER_TICKET_MENU,
                    Some(keyboards::after_ticket_menu()),
                )
                .await
            }
            CallbackAction::CsatRate {
                dimension,
                rating,
                ticket_id,
            } => self.on_rating(user, dimension, rating, ticket_id).await,
            _ => Ok(()),
        }
    }

    /// Free-text comment for negative feedback.
    pub async fn on_comment(&self, user: &UserProfile, text: &str) -> Result<(), SupportError> {
        let session = self.sessions.get(user.user_id).unwrap_or_default();
        let Some(ticket_id) = session.fields.feedback_ticket_id else {
            self.sessions.clear(user.user_id);
            return self.send(user, texts::GENERIC_ERROR, None).await;
        };
        let comment = text.trim();
        if comment.is_empty() {
            return self.send(user, texts::CSAT_ASK_COMMENT, None).await;
        }

        self.record_signal(ticket_id, Csat::Negative, Some(comment)).await?;
        self.sessions.clear(user.user_id);
        self.send(user, texts::CSAT_THANKS_NEGATIVE, None).await?;
        self.send(
            user,
            texts::AFTER_TICKET_MENU,
            Some(keyboards::after_ticket_menu()),
        )
        .await
    }

    /// One star rating. Order-insensitive: whatever dimension the press
    /// carries is stored, and the flow finishes once all three are in.
    async fn on_rating(
        &self,
        user: &UserProfile,
        dimension: RatingDimension,
        rating: u8,
        ticket_id: i64,
    ) -> Result<(), SupportError> {
        let session = self.sessions.get(user.user_id).unwrap_or_default();
        // Stale keyboards from an earlier (or another ticket's) CSAT run
        // must not corrupt the current one.
        if session.fields.feedback_ticket_id != Some(ticket_id) {
            return Ok(());
        }

        let session = self.sessions.update(user.user_id, |s| {
            let slot = match dimension {
                RatingDimension::Speed => &mut s.fields.speed_rating,
                RatingDimension::Quality => &mut s.fields.quality_rating,
                RatingDimension::Politeness => &mut s.fields.politeness_rating,
            };
            *slot = Some(rating as i64);
        });

        let fields = &session.fields;
        match (fields.speed_rating, fields.quality_rating, fields.politeness_rating) {
            (Some(speed), Some(quality), Some(politeness)) => {
                feedback_q::set_detailed_ratings(&self.db, ticket_id, speed, quality, politeness)
                    .await?;
                self.sessions.clear(user.user_id);
                info!(ticket_id, speed, quality, politeness, "detailed CSAT recorded");
                self.send(user, &texts::csat_summary(speed, quality, politeness), None)
                    .await?;
                self.send(
                    user,
                    texts::AFTER_TICKET_MENU,
                    Some(keyboards::after_ticket_menu()),
                )
                .await
            }
            (_, None, _) if fields.speed_rating.is_some() => {
                self.sessions
                    .update(user.user_id, |s| s.stage = Some(Stage::RatingQuality));
                self.send(
                    user,
                    texts::CSAT_ASK_QUALITY,
                    Some(keyboards::csat_detail(ticket_id, RatingDimension::Quality)),
                )
                .await
            }
            _ => {
                let (prompt, next) = if fields.speed_rating.is_none() {
                    (texts::CSAT_ASK_SPEED, RatingDimension::Speed)
                } else {
                    (texts::CSAT_ASK_POLITENESS, RatingDimension::Politeness)
                };
                self.sessions.update(user.user_id, |s| {
                    s.stage = Some(match next {
                        RatingDimension::Speed => Stage::RatingSpeed,
                        RatingDimension::Quality => Stage::RatingQuality,
                        RatingDimension::Politeness => Stage::RatingPoliteness,
                    });
                });
                self.send(
                    user,
                    prompt,
                    Some(keyboards::csat_detail(ticket_id, next)),
                )
                .await
            }
        }
    }

    /// Create the feedback row (once) and relay the signal into the
    /// ticket's thread.
    async fn record_signal(
        &self,
        ticket_id: i64,
        csat: Csat,
        comment: Option<&str>,
    ) -> Result<(), SupportError> {
        let feedback = feedback_q::create_if_absent(&self.db, ticket_id, csat, comment).await?;
        info!(ticket_id, csat = %feedback.csat, "CSAT recorded");

        if let Some(ticket) = tickets::get(&self.db, ticket_id).await? {
            let note = texts::feedback_note(
                ticket.number,
                feedback.csat == Csat::Positive,
                feedback.comment.as_deref(),
            );
            if let Err(e) = self.routing.post_thread_note(&ticket, &note).await {
                warn!(ticket_id, error = %e, "feedback relay failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RecordingGateway, seed_project};
    use opsdesk_core::types::{NewTicket, Priority};
    use opsdesk_storage::queries::tickets as tickets_q;
    use tempfile::tempdir;

    struct Env {
        db: Arc<Database>,
        gateway: Arc<RecordingGateway>,
        sessions: Arc<SessionStore>,
        flow: FeedbackFlow,
        ticket_id: i64,
        _dir: tempfile::TempDir,
    }

    async fn env() -> Env {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Arc::new(Database::open(path.to_str().unwrap(), true).await.unwrap());
        let (_client_id, project_id) = seed_project(&db).await;
        let gateway = Arc::new(RecordingGateway::new());
        let sessions = Arc::new(SessionStore::new());
        let routing = Arc::new(RoutingService::new(
            db.clone(),
            gateway.clone(),
            ChatId(-100),
        ));
        let ticket = tickets_q::create(
            &db,
            NewTicket {
                project_id,
                user_id: 42,
                category: "access".into(),
                description: "locked out".into(),
                priority: Priority::Normal,
                channel_id: -100,
            },
        )
        .await
        .unwrap();
        let flow = FeedbackFlow::new(db.clone(), sessions.clone(), routing);
        Env {
            db,
            gateway,
            sessions,
            flow,
            ticket_id: ticket.id,
            _dir: dir,
        }
    }

    fn client() -> UserProfile {
        UserProfile {
            user_id: 42,
            chat_id: 42,
            username: Some("alice".into()),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn positive_then_three_ratings_enrich_the_row() {
        let env = env().await;
        let user = client();
        let id = env.ticket_id;

        env.flow
            .on_callback(&user, CallbackAction::CsatPositive(id))
            .await
            .unwrap();

        for (dimension, rating) in [
            (RatingDimension::Speed, 5),
            (RatingDimension::Quality, 4),
            (RatingDimension::Politeness, 5),
        ] {
            env.flow
                .on_callback(
                    &user,
                    CallbackAction::CsatRate {
                        dimension,
                        rating,
                        ticket_id: id,
                    },
                )
                .await
                .unwrap();
        }

        let row = feedback_q::by_ticket(&env.db, id).await.unwrap().unwrap();
        assert_eq!(row.csat, Csat::Positive);
        assert_eq!(row.speed_rating, Some(5));
        assert_eq!(row.quality_rating, Some(4));
        assert_eq!(row.politeness_rating, Some(5));
        assert!(env.sessions.get(user.user_id).is_none());
    }

    #[tokio::test]
    async fn negative_comment_path_records_once() {
        let env = env().await;
        let user = client();
        let id = env.ticket_id;

        env.flow
            .on_callback(&user, CallbackAction::CsatNegative(id))
            .await
            .unwrap();
        assert_eq!(
            env.sessions.get(user.user_id).unwrap().stage,
            Some(Stage::AwaitingFeedbackComment)
        );

        env.flow.on_comment(&user, "took three days").await.unwrap();

        let row = feedback_q::by_ticket(&env.db, id).await.unwrap().unwrap();
        assert_eq!(row.csat, Csat::Negative);
        assert_eq!(row.comment.as_deref(), Some("took three days"));
        assert!(env.sessions.get(user.user_id).is_none());

        // A second signal does not duplicate or flip the row.
        env.flow
            .on_callback(&user, CallbackAction::CsatPositive(id))
            .await
            .unwrap();
        let row = feedback_q::by_ticket(&env.db, id).await.unwrap().unwrap();
        assert_eq!(row.csat, Csat::Negative);
    }

    #[tokio::test]
    async fn skip_detailed_clears_the_session() {
        let env = env().await;
        let user = client();
        let id = env.ticket_id;

        env.flow
            .on_callback(&user, CallbackAction::CsatPositive(id))
            .await
            .unwrap();
        env.flow
            .on_callback(&user, CallbackAction::CsatSkipDetailed(id))
            .await
            .unwrap();

        assert!(env.sessions.get(user.user_id).is_none());
        let row = feedback_q::by_ticket(&env.db, id).await.unwrap().unwrap();
        assert!(row.speed_rating.is_none());
    }

    #[tokio::test]
    async fn stale_rating_for_another_ticket_is_ignored() {
        let env = env().await;
        let user = client();
        let id = env.ticket_id;

        env.flow
            .on_callback(&user, CallbackAction::CsatPositive(id))
            .await
            .unwrap();
        env.flow
            .on_callback(
                &user,
                CallbackAction::CsatRate {
                    dimension: RatingDimension::Speed,
                    rating: 1,
                    ticket_id: id + 100,
                },
            )
            .await
            .unwrap();

        let session = env.sessions.get(user.user_id).unwrap();
        assert!(session.fields.speed_rating.is_none());
    }

    #[tokio::test]
    async fn feedback_lands_in_the_ticket_thread() {
        let env = env().await;
        let user = client();

        env.flow
            .on_callback(&user, CallbackAction::CsatPositive(env.ticket_id))
            .await
            .unwrap();

        assert!(
            env.gateway
                .thread_texts()
                .iter()
                .any(|t| t.contains("Feedback on ticket #1"))
        );
    }
}
