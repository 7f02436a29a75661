pub mod test_helpers {
    use crate::config::{session::SessionConfig, EmbeddingBackend, Settings};
    use crate::services::{Adapter, Embedder, HashingEmbedder, MatchModel};
    use crate::{routes, AppState};
    use axum::Router;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::Path;
    use std::sync::Arc;
    use tower_sessions_sqlx_store::SqliteStore;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<i64, sqlx::Error> {
        use argon2::{
            password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
            Argon2,
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
            })?
            .to_string();

        let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Settings for an offline instance: hashing encoder, no token, local paths.
    pub fn test_settings(model_dir: &Path) -> Settings {
        Settings {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            model_dir: model_dir.to_path_buf(),
            embedding_model: "hashing".to_string(),
            embedding_backend: EmbeddingBackend::Hashing,
            model_cache_dir: model_dir.join(".cache"),
            hf_token: None,
            hf_model_name: "test-resume-matcher".to_string(),
            hf_endpoint: "http://127.0.0.1:9".to_string(),
            summarizer: None,
            max_upload_bytes: 2 * 1024 * 1024,
        }
    }

    /// A model over the hashing encoder with an untrained adapter.
    pub fn test_model() -> Arc<MatchModel> {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let adapter = Adapter::identity(embedder.model_name(), embedder.dimensions());
        Arc::new(MatchModel::new(embedder, adapter))
    }

    /// The full router backed by `pool`, with sessions stored in the same database.
    pub async fn test_app(pool: SqlitePool, settings: &Settings) -> Router {
        let app_state = AppState::new(pool.clone(), test_model(), settings);

        let session_store = SqliteStore::new(pool)
            .with_table_name("sessions_test")
            .expect("valid session table name for tests");
        session_store
            .migrate()
            .await
            .expect("session table migration to succeed");

        let session_layer = SessionConfig::from_env().create_layer(session_store);
        routes::build_router(app_state, session_layer, settings.max_upload_bytes)
    }

    /// A single-page PDF showing `lines` in Helvetica, one per text line.
    pub fn simple_pdf(lines: &[&str]) -> Vec<u8> {
        let mut content = String::from("BT\n/F1 12 Tf\n14 TL\n72 720 Td\n");
        for line in lines {
            let escaped = line
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            content.push_str(&format!("({}) Tj T*\n", escaped));
        }
        content.push_str("ET");

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
        ];

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }

        let xref_offset = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
        pdf.push_str("0000000000 65535 f \n");
        for offset in offsets {
            pdf.push_str(&format!("{:010} 00000 n \n", offset));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        ));

        pdf.into_bytes()
    }

    /// Encodes `parts` as a multipart/form-data body. File parts carry a filename.
    pub fn multipart_body(boundary: &str, parts: &[MultipartPart<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            match part {
                MultipartPart::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                MultipartPart::File {
                    name,
                    filename,
                    content_type,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: {}\r\n\r\n",
                            name, filename, content_type
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        body
    }

    pub enum MultipartPart<'a> {
        Text {
            name: &'a str,
            value: &'a str,
        },
        File {
            name: &'a str,
            filename: &'a str,
            content_type: &'a str,
            bytes: &'a [u8],
        },
    }
}
