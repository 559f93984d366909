use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;

fn count(pool: &DbPool, table: &str) -> rusqlite::Result<i64> {
    pool.conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_kb = (file_size as f64) / 1024.0;

    println!("{CYAN}• File:{RESET} {YELLOW}{db_path}{RESET}");
    println!("{CYAN}• Size:{RESET} {file_kb:.1} KB");

    let groups = count(pool, "groups")?;
    let members = count(pool, "group_members")?;
    let changes = count(pool, "changes")?;
    println!("{CYAN}• Groups:{RESET} {GREEN}{groups}{RESET}");
    println!("{CYAN}• Memberships:{RESET} {GREEN}{members}{RESET}");
    println!("{CYAN}• Change feed entries:{RESET} {GREEN}{changes}{RESET}");

    if groups > 0 {
        println!(
            "{CYAN}• Average members/group:{RESET} {:.2}",
            members as f64 / groups as f64
        );
    }

    let last_change: Option<String> = pool
        .conn
        .query_row(
            "SELECT at FROM changes ORDER BY seq DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let last = last_change.unwrap_or_else(|| format!("{GREY}--{RESET}"));
    println!("{CYAN}• Last change:{RESET} {last}");

    println!();
    Ok(())
}
