use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database configuration: {0}")]
    ConnectionConfig(String),

    #[error("Failed to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to read from the database: {0}")]
    Read(#[source] sqlx::Error),

    #[error("Failed to write to the database: {0}")]
    Write(#[source] sqlx::Error),

    /// A unique constraint rejected the write; the payload names the clashing field.
    #[error("{0} is already taken")]
    Conflict(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}

impl DbError {
    /// Maps a failed write, turning unique-constraint violations into `Conflict`.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            let message = db_err.message();
            let field = if message.contains("username") {
                "username"
            } else if message.contains("email") {
                "email"
            } else {
                "value"
            };
            return DbError::Conflict(field.to_string());
        }
        DbError::Write(err)
    }
}
