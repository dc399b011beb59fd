use sqlx::mysql::MySqlDatabaseError;

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_duplicates() {
        assert!(!is_dup_key(&sqlx::Error::RowNotFound));
        assert!(!is_dup_key(&sqlx::Error::PoolTimedOut));
        assert!(!is_dup_key(&sqlx::Error::Protocol("bad packet".to_string())));
    }
}
