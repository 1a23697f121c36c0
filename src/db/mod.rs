//! Database module
//!
//! Handles SQLite connection, migrations and where the database file lives.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

use std::path::PathBuf;

/// Environment variable overriding the database location
pub const DATABASE_PATH_ENV: &str = "PANTRY_DATABASE_PATH";

/// Database path from `PANTRY_DATABASE_PATH`, else `data/pantry.db` under the project root
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));
            project_root(exe_dir).join("data").join("pantry.db")
        })
}

/// Step out of target/release or target/debug
fn project_root(exe_dir: PathBuf) -> PathBuf {
    if exe_dir.ends_with("release") || exe_dir.ends_with("debug") {
        if let Some(root) = exe_dir.parent().and_then(|target| target.parent()) {
            return root.to_path_buf();
        }
    }
    exe_dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_leaves_target_dir() {
        assert_eq!(
            project_root(PathBuf::from("/work/pantry/target/release")),
            PathBuf::from("/work/pantry")
        );
        assert_eq!(
            project_root(PathBuf::from("/work/pantry/target/debug")),
            PathBuf::from("/work/pantry")
        );
        assert_eq!(project_root(PathBuf::from("/usr/local/bin")), PathBuf::from("/usr/local/bin"));
    }
}
