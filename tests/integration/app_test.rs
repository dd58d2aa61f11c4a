//! Interactive menu flows driven through scripted input.

use super::common::seeded_sqlite;
use db_export::app::App;
use db_export::persistence::{presets, StateDb};
use db_export::prompt::Prompter;
use std::io::Cursor;
use tempfile::tempdir;

fn prompter(input: String) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
    colored::control::set_override(false);
    Prompter::new(Cursor::new(input.into_bytes()), Vec::new())
}

#[tokio::test]
async fn test_whole_table_export_from_menu() {
    let (db, _source) = seeded_sqlite().await;
    let state_dir = tempdir().unwrap();
    let state = StateDb::open(&state_dir.path().join("state.db")).await.unwrap();
    let out = tempdir().unwrap();

    // Tables are listed by name: empty_table, users.
    let input = format!("4\n2,1\n1\n{}\nq\n", out.path().display());
    let mut app = App::new(db.as_ref(), &state, prompter(input));
    app.run().await.unwrap();

    assert_eq!(
        std::fs::read_to_string(out.path().join("users.csv"))
            .unwrap()
            .lines()
            .count(),
        4
    );
    assert_eq!(
        std::fs::read_to_string(out.path().join("empty_table.csv")).unwrap(),
        "id,label\n"
    );

    let console = String::from_utf8(app.into_prompter().into_output()).unwrap();
    assert!(console.contains("Exported users (3 rows)"));
    assert!(console.contains("Exported empty_table (0 rows)"));
}

#[tokio::test]
async fn test_saved_custom_query_is_offered_as_preset() {
    let (db, _source) = seeded_sqlite().await;
    let state_dir = tempdir().unwrap();
    let state = StateDb::open(&state_dir.path().join("state.db")).await.unwrap();
    let out = tempdir().unwrap();
    let out_dir = out.path().display();

    let input = format!(
        "2\nactive\nSELECT name FROM users WHERE email IS NOT NULL ORDER BY id\ny\n3\n{out_dir}\n\
         1\n1\n1\n{out_dir}\nq\n"
    );
    let mut app = App::new(db.as_ref(), &state, prompter(input));
    app.run().await.unwrap();

    let stored = presets::retrieve_preset_queries(state.pool()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].table_name, "active");
    assert!(out.path().join("active.json").exists());
    assert_eq!(
        std::fs::read_to_string(out.path().join("active.csv")).unwrap(),
        "name\nAlice\n\"Carol \"\"CJ\"\" Jones\"\n"
    );
}

#[tokio::test]
async fn test_default_output_dir_is_used_on_empty_answer() {
    let (db, _source) = seeded_sqlite().await;
    let state_dir = tempdir().unwrap();
    let state = StateDb::open(&state_dir.path().join("state.db")).await.unwrap();
    let out = tempdir().unwrap();
    let default_dir = out.path().join("default");

    let input = "2\nusers\nSELECT id FROM users\nn\n1\n\nq\n".to_string();
    let mut app = App::new(db.as_ref(), &state, prompter(input))
        .with_default_output_dir(Some(default_dir.clone()));
    app.run().await.unwrap();

    assert!(default_dir.join("users.csv").exists());
}
