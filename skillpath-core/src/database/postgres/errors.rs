use crate::error::TrackingError;

const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATEs worth a caller-level retry: serialization failures, deadlocks,
/// statement timeouts, shutdowns and connection exceptions.
fn is_transient_sqlstate(code: &str) -> bool {
    matches!(code, "40001" | "40P01" | "57014" | "57P01" | "57P02" | "57P03")
        || code.starts_with("08")
}

pub(crate) fn classify(context: &str, err: sqlx::Error) -> TrackingError {
    let transient = match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => {
            db.code().is_some_and(|code| is_transient_sqlstate(&code))
        }
        _ => false,
    };

    if transient {
        TrackingError::Transient(format!("{context}: {err}"))
    } else {
        TrackingError::Internal(format!("{context}: {err}"))
    }
}

pub(crate) fn store_error(
    context: &'static str,
) -> impl FnOnce(sqlx::Error) -> TrackingError {
    move |err| classify(context, err)
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    )
}
