//! Demo data seeder.
//!
//! Creates one user per role, three patients and a handful of appointments so
//! every dashboard has something to show. All demo accounts use the password
//! `password`.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;

use super::models::{format_timestamp, AppointmentStatus, Role};
use crate::api::auth::hash_password;

pub const DEMO_PASSWORD: &str = "password";

/// What a seeding run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub patients: usize,
    pub appointments: usize,
    /// True when the database already had users and nothing was inserted
    pub skipped: bool,
}

/// (name, email, phone, birth date, medical history)
const DEMO_PATIENTS: [(&str, &str, &str, &str, &str); 3] = [
    (
        "John Patient",
        "patient1@medflow.com",
        "+1234567890",
        "1990-05-15T00:00:00.000Z",
        "No known allergies. Regular checkups.",
    ),
    (
        "Jane Doe",
        "jane.doe@example.com",
        "+1234567891",
        "1985-08-20T00:00:00.000Z",
        "Diabetes type 2. On medication.",
    ),
    (
        "Bob Smith",
        "bob.smith@example.com",
        "+1234567892",
        "1978-03-10T00:00:00.000Z",
        "Hypertension. Regular monitoring required.",
    ),
];

/// (email, name, role); the patient account is linked to the first demo patient
const DEMO_USERS: [(&str, &str, Role); 4] = [
    ("admin@medflow.com", "Admin User", Role::Admin),
    ("dr.smith@medflow.com", "Dr. Smith", Role::Doctor),
    ("reception@medflow.com", "Reception Desk", Role::Receptionist),
    ("patient1@medflow.com", "John Patient", Role::Patient),
];

/// Seed demo users, patients and appointments into an empty database
pub async fn seed_demo_data(pool: &SqlitePool, now: DateTime<Utc>) -> Result<SeedSummary> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count > 0 {
        info!("Database already has {} users, skipping demo seed", user_count);
        return Ok(SeedSummary {
            skipped: true,
            ..SeedSummary::default()
        });
    }

    info!("Seeding demo data...");

    let password_hash = hash_password(DEMO_PASSWORD)
        .map_err(|e| anyhow::anyhow!("Failed to hash demo password: {}", e))?;

    let mut tx = pool.begin().await?;

    let mut patient_ids = Vec::with_capacity(DEMO_PATIENTS.len());
    for (name, email, phone, birth_date, history) in DEMO_PATIENTS {
        let id = sqlx::query(
            "INSERT INTO patients (name, email, phone, birth_date, medical_history) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(birth_date)
        .bind(history)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to seed patient {}", email))?
        .last_insert_rowid();
        patient_ids.push(id);
    }

    let mut doctor_id = None;
    for (email, name, role) in DEMO_USERS {
        let linked_patient = (role == Role::Patient).then(|| patient_ids[0]);
        let id = sqlx::query(
            "INSERT INTO users (email, password_hash, name, role, patient_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(email)
        .bind(&password_hash)
        .bind(name)
        .bind(role.as_str())
        .bind(linked_patient)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to seed user {}", email))?
        .last_insert_rowid();
        if role == Role::Doctor {
            doctor_id = Some(id);
        }
    }
    let doctor_id = doctor_id.context("Demo doctor was not created")?;

    // Upcoming visits at 10:00 UTC today, tomorrow and next week, one per patient,
    // plus a completed visit for the demo patient so a payment is pending
    let ten_am = now
        .date_naive()
        .and_hms_opt(10, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);
    let appointments = [
        (ten_am, AppointmentStatus::Scheduled, patient_ids[0]),
        (ten_am + Duration::days(1), AppointmentStatus::Scheduled, patient_ids[1]),
        (ten_am + Duration::days(7), AppointmentStatus::Scheduled, patient_ids[2]),
        (now, AppointmentStatus::Completed, patient_ids[0]),
    ];
    for (date, status, patient_id) in appointments {
        sqlx::query(
            "INSERT INTO appointments (date, status, doctor_id, patient_id) VALUES (?, ?, ?, ?)",
        )
        .bind(format_timestamp(date))
        .bind(status.as_str())
        .bind(doctor_id)
        .bind(patient_id)
        .execute(&mut *tx)
        .await
        .context("Failed to seed appointment")?;
    }

    tx.commit().await?;

    let summary = SeedSummary {
        users: DEMO_USERS.len(),
        patients: DEMO_PATIENTS.len(),
        appointments: appointments.len(),
        skipped: false,
    };
    info!(
        users = summary.users,
        patients = summary.patients,
        appointments = summary.appointments,
        "Demo data seeded"
    );
    for (email, _, role) in DEMO_USERS {
        info!(email, role = %role, "Demo account");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    #[tokio::test]
    async fn test_seed_populates_empty_database() {
        let pool = init_memory().await.unwrap();
        let summary = seed_demo_data(&pool, Utc::now()).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                users: 4,
                patients: 3,
                appointments: 4,
                skipped: false
            }
        );

        let doctors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'DOCTOR'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(doctors, 1);

        let linked: Option<i64> =
            sqlx::query_scalar("SELECT patient_id FROM users WHERE email = 'patient1@medflow.com'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(linked.is_some());

        let completed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE status = 'completed'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(completed, 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_seed_logs_accounts_without_password() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("medflow=info")
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let pool = init_memory().await.unwrap();
        seed_demo_data(&pool, Utc::now()).await.unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("admin@medflow.com"));
        assert!(output.contains("RECEPTIONIST"));
        assert!(!output.contains(DEMO_PASSWORD));
    }

    #[tokio::test]
    async fn test_seed_skips_when_users_exist() {
        let pool = init_memory().await.unwrap();
        seed_demo_data(&pool, Utc::now()).await.unwrap();
        let second = seed_demo_data(&pool, Utc::now()).await.unwrap();
        assert!(second.skipped);

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 4);
    }
}
