//! Database connection and initialization.

pub use coursetrack_core::db::DatabaseError;

coursetrack_core::define_database!(Database, "Engine database migrations complete");

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_works() {
        let db = Database::open_in_memory().await;
        assert!(db.is_ok());
    }
}
