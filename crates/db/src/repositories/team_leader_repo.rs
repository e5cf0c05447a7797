//! Team-leader registration.
//!
//! A team leader is a `users` row with role `team_leader` linked to the
//! scanner record they participate as. Registration finds that scanner (by
//! email, then by name) or creates it, then creates the user, all in one
//! transaction.

use sqlx::PgPool;
use tiketon_core::roles::ROLE_TEAM_LEADER;

use crate::models::scanner::CreateScanner;
use crate::models::user::{CreateUser, RegisterTeamLeader, TeamLeaderRegistration};
use crate::repositories::{ScannerRepo, UserRepo};

/// Orchestrates team-leader registration.
pub struct TeamLeaderRepo;

impl TeamLeaderRepo {
    pub async fn register(
        pool: &PgPool,
        input: &RegisterTeamLeader,
    ) -> Result<TeamLeaderRegistration, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing = match ScannerRepo::find_by_email(&mut *tx, &input.email).await? {
            Some(scanner) => Some(scanner),
            None => ScannerRepo::find_by_name(&mut *tx, &input.first_name, &input.last_name).await?,
        };

        let (scanner_id, scanner_created) = match existing {
            Some(scanner) => (scanner.id, false),
            None => {
                let scanner = ScannerRepo::create(
                    &mut *tx,
                    &CreateScanner {
                        first_name: input.first_name.clone(),
                        last_name: input.last_name.clone(),
                        email: Some(input.email.clone()),
                        telegram_id: input.telegram_id.clone(),
                    },
                )
                .await?;
                (scanner.id, true)
            }
        };

        let user = UserRepo::create(
            &mut *tx,
            &CreateUser {
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                email: input.email.clone(),
                telegram_id: input.telegram_id.clone(),
                role: ROLE_TEAM_LEADER.to_string(),
                scanner_id: Some(scanner_id),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = user.id,
            scanner_id,
            scanner_created,
            "Team leader registered"
        );

        Ok(TeamLeaderRegistration {
            user,
            scanner_id,
            scanner_created,
        })
    }
}
